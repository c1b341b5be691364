//! Typed operation parameters parsed from path, query string and body.
//!
//! Every parse failure is a message returned verbatim with a 400.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::crud::ListQuery;

/// Raw request parts handed to [`OperationParams::parse`].
#[derive(Debug, Default)]
pub struct RawRequest {
    pub path: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RawRequest {
    fn path_param(&self, name: &str) -> Result<String, String> {
        self.path
            .get(name)
            .cloned()
            .ok_or_else(|| format!("Missing path parameter '{}'", name))
    }

    /// Reads the allowed query keys; anything else is rejected.
    fn query_params(&self, allowed: &[&str]) -> Result<HashMap<String, String>, String> {
        let mut params = HashMap::new();
        for (key, value) in &self.query {
            if !allowed.contains(&key.as_str()) {
                return Err(format!("Unknown query parameter '{}'", key));
            }
            if params.insert(key.clone(), value.clone()).is_some() {
                return Err(format!("Query parameter '{}' given more than once", key));
            }
        }
        Ok(params)
    }

    fn body<T: DeserializeOwned>(&self) -> Result<T, String> {
        match &self.body {
            Some(body) => serde_json::from_value(body.clone()).map_err(|e| e.to_string()),
            None => Err("Request body is required".to_string()),
        }
    }
}

pub trait OperationParams: Sized + Send + 'static {
    fn parse(raw: RawRequest) -> Result<Self, String>;
}

/// No input accepted.
pub struct NoParams;

impl OperationParams for NoParams {
    fn parse(raw: RawRequest) -> Result<Self, String> {
        raw.query_params(&[])?;
        Ok(NoParams)
    }
}

/// A JSON body of type `T`.
pub struct Body<T>(pub T);

impl<T: DeserializeOwned + Send + 'static> OperationParams for Body<T> {
    fn parse(raw: RawRequest) -> Result<Self, String> {
        raw.query_params(&[])?;
        raw.body().map(Body)
    }
}

/// `:id` path parameter plus optional `lang`.
pub struct IdParams {
    pub id: String,
    pub lang: Option<String>,
}

impl OperationParams for IdParams {
    fn parse(raw: RawRequest) -> Result<Self, String> {
        let mut query = raw.query_params(&["lang"])?;
        Ok(Self {
            id: raw.path_param("id")?,
            lang: query.remove("lang"),
        })
    }
}

/// `:id` path parameter plus a JSON body of type `T`.
pub struct IdBody<T> {
    pub id: String,
    pub body: T,
}

impl<T: DeserializeOwned + Send + 'static> OperationParams for IdBody<T> {
    fn parse(raw: RawRequest) -> Result<Self, String> {
        raw.query_params(&[])?;
        Ok(Self {
            id: raw.path_param("id")?,
            body: raw.body()?,
        })
    }
}

/// Only an optional `lang` query parameter.
pub struct LangParams {
    pub lang: Option<String>,
}

impl OperationParams for LangParams {
    fn parse(raw: RawRequest) -> Result<Self, String> {
        let mut query = raw.query_params(&["lang"])?;
        Ok(Self { lang: query.remove("lang") })
    }
}

/// `:publicId` path parameter plus optional `lang`.
pub struct PublicIdParams {
    pub public_id: String,
    pub lang: Option<String>,
}

impl OperationParams for PublicIdParams {
    fn parse(raw: RawRequest) -> Result<Self, String> {
        let mut query = raw.query_params(&["lang"])?;
        Ok(Self {
            public_id: raw.path_param("publicId")?,
            lang: query.remove("lang"),
        })
    }
}

/// List query: reserved `id`, `limit`, `offset`, `lang`; every other key is a
/// field condition resolved later against the entity schema.
pub struct ListParams(pub ListQuery);

impl OperationParams for ListParams {
    fn parse(raw: RawRequest) -> Result<Self, String> {
        let mut query = ListQuery::default();
        for (key, value) in raw.query {
            match key.as_str() {
                "id" => query.id = Some(value),
                "limit" => query.limit = Some(parse_count("limit", &value)?),
                "offset" => query.offset = Some(parse_count("offset", &value)?),
                "lang" => query.lang = Some(value),
                _ => query.conditions.push((key, value)),
            }
        }
        Ok(ListParams(query))
    }
}

fn parse_count(name: &str, value: &str) -> Result<i64, String> {
    match value.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(format!("'{}' must be a non-negative integer, got '{}'", name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(path: &[(&str, &str)], query: &[(&str, &str)], body: Option<Value>) -> RawRequest {
        RawRequest {
            path: path.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            query: query.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            body,
        }
    }

    #[test]
    fn list_params_split_reserved_keys() {
        let ListParams(query) =
            ListParams::parse(raw(&[], &[("limit", "5"), ("lang", "vi"), ("type", "food")], None)).unwrap();
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.lang.as_deref(), Some("vi"));
        assert_eq!(query.conditions, vec![("type".to_string(), "food".to_string())]);
    }

    #[test]
    fn negative_or_garbage_paging_is_rejected() {
        assert!(ListParams::parse(raw(&[], &[("limit", "-1")], None)).is_err());
        assert!(ListParams::parse(raw(&[], &[("offset", "two")], None)).is_err());
    }

    #[test]
    fn body_errors_are_verbatim() {
        #[derive(Debug, serde::Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Named {
            #[allow(dead_code)]
            name: String,
        }
        let err = Body::<Named>::parse(raw(&[], &[], Some(json!({ "nme": "x" })))).err().unwrap();
        assert!(err.contains("unknown field `nme`"));
        assert_eq!(Body::<Named>::parse(raw(&[], &[], None)).err().unwrap(), "Request body is required");
    }

    #[test]
    fn unexpected_query_keys_are_rejected() {
        let err = IdParams::parse(raw(&[("id", "abc")], &[("foo", "1")], None)).err().unwrap();
        assert_eq!(err, "Unknown query parameter 'foo'");
    }
}
