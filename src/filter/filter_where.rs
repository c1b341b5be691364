use serde_json::Value;

use super::error::FilterError;
use super::types::{Condition, Filter};

/// Bind value produced while rendering a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Json(Value),
    Text(String),
    Ids(Vec<Vec<u8>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub clause: String,
    pub params: Vec<SqlParam>,
}

/// Renders a [`Filter`] into a PostgreSQL predicate over the `(id, doc)` columns
/// of a collection table.
pub struct FilterWhere {
    params: Vec<SqlParam>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            params: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(filter: &Filter, starting_param_index: usize) -> Result<SqlResult, FilterError> {
        filter.validate()?;
        let mut builder = Self::new(starting_param_index);
        let mut parts = vec![];

        if let Some(ids) = &filter.ids {
            if ids.is_empty() {
                parts.push("1=0".to_string());
            } else {
                let bytes = ids.iter().map(|id| id.as_bytes().to_vec()).collect();
                parts.push(format!("id = ANY({})", builder.param(SqlParam::Ids(bytes))));
            }
        }

        for condition in &filter.conditions {
            parts.push(builder.condition(condition));
        }

        let clause = if parts.is_empty() { "1=1".to_string() } else { parts.join(" AND ") };
        Ok(SqlResult { clause, params: builder.params })
    }

    fn condition(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Eq { field, value } => {
                format!("doc -> '{}' = {}::jsonb", field, self.param(SqlParam::Json(value.clone())))
            }
            Condition::TextContains { field, needle, locale: Some(locale) } => {
                let pattern = self.param(SqlParam::Text(like_pattern(needle)));
                format!("doc -> '{}' ->> '{}' ILIKE {}", field, locale.code(), pattern)
            }
            Condition::TextContains { field, needle, locale: None } => {
                let pattern = self.param(SqlParam::Text(like_pattern(needle)));
                format!(
                    "(CASE jsonb_typeof(doc -> '{field}') \
                     WHEN 'object' THEN EXISTS (SELECT 1 FROM jsonb_each_text(doc -> '{field}') AS t(k, v) WHERE t.v ILIKE {pattern}) \
                     ELSE doc ->> '{field}' ILIKE {pattern} END)"
                )
            }
        }
    }

    fn param(&mut self, value: SqlParam) -> String {
        self.params.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

/// `%needle%` with LIKE wildcards in the needle escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DocumentId;
    use crate::schema::Locale;
    use serde_json::json;

    #[test]
    fn empty_filter_selects_everything() {
        let sql = FilterWhere::generate(&Filter::all(), 0).unwrap();
        assert_eq!(sql.clause, "1=1");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn numbers_placeholders_after_starting_index() {
        let id = DocumentId::generate();
        let filter = Filter::by_id(id).eq("type", "food");
        let sql = FilterWhere::generate(&filter, 2).unwrap();
        assert_eq!(sql.clause, "id = ANY($3) AND doc -> 'type' = $4::jsonb");
        assert_eq!(sql.params[1], SqlParam::Json(json!("food")));
    }

    #[test]
    fn empty_id_set_matches_nothing() {
        let sql = FilterWhere::generate(&Filter::by_ids(vec![]), 0).unwrap();
        assert_eq!(sql.clause, "1=0");
    }

    #[test]
    fn localized_match_escapes_wildcards() {
        let filter = Filter::all().with_condition(Condition::TextContains {
            field: "name".into(),
            needle: "50%_off".into(),
            locale: Some(Locale::Vi),
        });
        let sql = FilterWhere::generate(&filter, 0).unwrap();
        assert_eq!(sql.clause, "doc -> 'name' ->> 'vi' ILIKE $1");
        assert_eq!(sql.params[0], SqlParam::Text("%50\\%\\_off%".into()));
    }

    #[test]
    fn rejects_unsafe_field_names() {
        let filter = Filter::all().eq("x' OR 1=1 --", 1);
        assert!(FilterWhere::generate(&filter, 0).is_err());
    }
}
