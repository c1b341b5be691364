use serde_json::Value;

use super::error::FilterError;
use crate::database::{Document, DocumentId};
use crate::schema::Locale;

/// Page size applied when a caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: i64 = 200;

/// A single predicate over a stored document body.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `doc[field] == value`
    Eq { field: String, value: Value },
    /// Case-insensitive substring match over the values of a localized bundle.
    /// When `locale` is set only that locale's string is considered.
    TextContains {
        field: String,
        needle: String,
        locale: Option<Locale>,
    },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Eq { field, .. } | Condition::TextContains { field, .. } => field,
        }
    }

    fn matches(&self, doc: &Document) -> bool {
        match self {
            Condition::Eq { field, value } => doc.get(field) == Some(value),
            Condition::TextContains { field, needle, locale } => {
                let needle = needle.to_lowercase();
                let contains = |s: &Value| {
                    s.as_str()
                        .map(|s| s.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                };
                match (doc.get(field), locale) {
                    (Some(Value::Object(bundle)), Some(locale)) => {
                        bundle.get(locale.code()).map(contains).unwrap_or(false)
                    }
                    (Some(Value::Object(bundle)), None) => bundle.values().any(contains),
                    (Some(plain @ Value::String(_)), _) => contains(plain),
                    _ => false,
                }
            }
        }
    }
}

/// Selection over one collection: an optional id set plus conjunctive conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub ids: Option<Vec<DocumentId>>,
    pub conditions: Vec<Condition>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: DocumentId) -> Self {
        Self {
            ids: Some(vec![id]),
            conditions: vec![],
        }
    }

    pub fn by_ids(ids: impl IntoIterator<Item = DocumentId>) -> Self {
        Self {
            ids: Some(ids.into_iter().collect()),
            conditions: vec![],
        }
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_none() && self.conditions.is_empty()
    }

    /// Field names end up inside generated SQL, so they are restricted to identifiers.
    pub fn validate(&self) -> Result<(), FilterError> {
        for condition in &self.conditions {
            validate_identifier(condition.field())
                .map_err(|_| FilterError::InvalidField(condition.field().to_string()))?;
        }
        Ok(())
    }

    pub fn matches(&self, id: &DocumentId, doc: &Document) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.contains(id) {
                return false;
            }
        }
        self.conditions.iter().all(|c| c.matches(doc))
    }
}

/// Limit/offset paging stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, FilterError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        let offset = offset.unwrap_or(0);
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        if offset < 0 {
            return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
        }
        Ok(Self { limit, offset })
    }

    pub fn first(limit: i64) -> Self {
        Self { limit, offset: 0 }
    }

    /// Applies the page to an already-ordered sequence.
    pub fn slice<T>(&self, items: impl Iterator<Item = T>) -> Vec<T> {
        items
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

pub(crate) fn validate_identifier(name: &str) -> Result<(), FilterError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !valid_start || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(FilterError::InvalidField(name.to_string()));
    }
    Ok(())
}
