//! Generic create/read/update/delete over any declared entity.
//!
//! Identifiers cross this boundary as 24-character hex strings and are turned
//! into [`DocumentId`]s here and nowhere else.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::database::{DocumentId, DocumentStore, InvalidDocumentId, StoreError, StoredDocument, UpdateResult};
use crate::filter::{Condition, Filter, FilterError, Page, DEFAULT_PAGE_LIMIT};
use crate::schema::{project_document, Entity, FieldKind, Locale, Validate};

#[derive(Debug, Error)]
pub enum CrudError {
    #[error(transparent)]
    InvalidId(#[from] InvalidDocumentId),

    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Page size bounds applied to every list read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default: i64,
    pub max: i64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default: DEFAULT_PAGE_LIMIT,
            max: 1000,
        }
    }
}

impl PageLimits {
    fn page(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Page, FilterError> {
        let limit = limit.map(|l| l.min(self.max)).unwrap_or(self.default);
        Page::new(Some(limit), offset)
    }
}

/// List request as it arrives from a query string. `conditions` holds every
/// key that is not one of the reserved paging/locale keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub id: Option<String>,
    pub conditions: Vec<(String, String)>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub lang: Option<String>,
}

pub struct EntityOperations<E> {
    store: Arc<dyn DocumentStore>,
    collection: &'static str,
    limits: PageLimits,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityOperations<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            collection: self.collection,
            limits: self.limits,
            _entity: PhantomData,
        }
    }
}

pub fn build_entity_operations<E: Entity>(store: Arc<dyn DocumentStore>, collection: &'static str) -> EntityOperations<E> {
    EntityOperations::new(store, collection)
}

impl<E: Entity> EntityOperations<E> {
    pub fn new(store: Arc<dyn DocumentStore>, collection: &'static str) -> Self {
        Self {
            store,
            collection,
            limits: PageLimits::default(),
            _entity: PhantomData,
        }
    }

    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    /// Inserts a validated document and returns its new id.
    pub async fn add(&self, new: E::New) -> Result<String, CrudError> {
        new.validate().map_err(CrudError::Validation)?;
        let body = E::prepare_new(new).map_err(CrudError::Validation)?;
        let id = self.store.insert_one(self.collection, body).await?;
        debug!("Inserted {} {}", E::SCHEMA.name, id);
        Ok(id.to_hex())
    }

    pub async fn get_many(&self, query: ListQuery) -> Result<Vec<Value>, CrudError> {
        let locale = resolve_locale(query.lang.as_deref());
        let filter = self.build_filter(&query, locale)?;
        let page = self.limits.page(query.limit, query.offset)?;

        let documents = self.store.find(self.collection, &filter, page).await?;
        Ok(documents.into_iter().map(|d| self.render(d, locale)).collect())
    }

    pub async fn get_one(&self, id: &str, lang: Option<&str>) -> Result<Value, CrudError> {
        let query = ListQuery {
            id: Some(id.to_string()),
            limit: Some(1),
            lang: lang.map(str::to_string),
            ..Default::default()
        };
        self.get_many(query).await?.into_iter().next().ok_or_else(|| CrudError::NotFound {
            entity: E::SCHEMA.name,
            id: id.to_string(),
        })
    }

    /// Merges the provided fields. A patch that selects nothing reports
    /// `matched == 0`; callers decide what that means.
    pub async fn update(&self, id: &str, patch: E::Patch) -> Result<UpdateResult, CrudError> {
        let id = DocumentId::parse_hex(id)?;
        patch.validate().map_err(CrudError::Validation)?;
        let set = E::prepare_patch(patch).map_err(CrudError::Validation)?;
        Ok(self.store.update_one(self.collection, id, set, &Filter::all()).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<u64, CrudError> {
        let id = DocumentId::parse_hex(id)?;
        Ok(self.store.delete_one(self.collection, id).await?)
    }

    fn build_filter(&self, query: &ListQuery, locale: Option<Locale>) -> Result<Filter, CrudError> {
        let mut filter = match &query.id {
            Some(id) => Filter::by_id(DocumentId::parse_hex(id)?),
            None => Filter::all(),
        };
        for (key, raw) in &query.conditions {
            filter = filter.with_condition(condition_for::<E>(key, raw, locale)?);
        }
        Ok(filter)
    }

    fn render(&self, document: StoredDocument, locale: Option<Locale>) -> Value {
        let StoredDocument { id, mut body } = document;
        for hidden in E::HIDDEN_FIELDS {
            body.remove(*hidden);
        }
        if let Some(locale) = locale {
            body = project_document(body, E::SCHEMA, locale);
        }
        body.insert("id".to_string(), Value::String(id.to_hex()));
        Value::Object(body)
    }
}

/// Unsupported locales keep the raw bundles.
fn resolve_locale(lang: Option<&str>) -> Option<Locale> {
    let code = lang?;
    let locale = Locale::parse(code);
    if locale.is_none() {
        debug!("Unsupported locale '{}', returning raw bundles", code);
    }
    locale
}

/// Turns one `field=value` query pair into a typed condition using the schema.
fn condition_for<E: Entity>(key: &str, raw: &str, locale: Option<Locale>) -> Result<Condition, CrudError> {
    let unknown = || CrudError::Validation(format!("Unknown filter field '{}' for {}", key, E::SCHEMA.name));
    if E::HIDDEN_FIELDS.contains(&key) {
        return Err(unknown());
    }
    let field = E::SCHEMA.field(key).ok_or_else(unknown)?;
    let invalid = |expected: &str| CrudError::Validation(format!("Filter '{}' expects {}, got '{}'", key, expected, raw));

    if field.localized {
        return Ok(Condition::TextContains {
            field: key.to_string(),
            needle: raw.to_string(),
            locale,
        });
    }

    let value = match field.kind {
        FieldKind::Text => Value::String(raw.to_string()),
        FieldKind::Enum(allowed) => {
            if !allowed.contains(&raw) {
                return Err(invalid(&format!("one of {}", allowed.join(", "))));
            }
            Value::String(raw.to_string())
        }
        FieldKind::Integer => raw.parse::<i64>().map(Value::from).map_err(|_| invalid("an integer"))?,
        FieldKind::Boolean => raw.parse::<bool>().map(Value::Bool).map_err(|_| invalid("true or false"))?,
        FieldKind::Id => Value::String(DocumentId::parse_hex(raw)?.to_hex()),
        FieldKind::Date => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid("a YYYY-MM-DD date"))?;
            Value::String(date.to_string())
        }
        FieldKind::IdList
        | FieldKind::TextList
        | FieldKind::LocalizedText
        | FieldKind::Object(_)
        | FieldKind::ObjectList(_) => {
            return Err(CrudError::Validation(format!("Field '{}' cannot be used as a filter", key)));
        }
    };
    Ok(Condition::Eq {
        field: key.to_string(),
        value,
    })
}
