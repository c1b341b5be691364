//! Declarative entity schemas.
//!
//! Every business entity is declared once as a static [`EntitySchema`]. Each
//! field carries an explicit `localized` flag; the projector and the list
//! filters read that flag and never guess from the shape of a value.

pub mod project;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::database::Document;

pub use project::{project, project_document};

/// Locales every localized field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Vi,
}

impl Locale {
    pub const SUPPORTED: [Locale; 2] = [Locale::En, Locale::Vi];

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Vi => "vi",
        }
    }

    /// `None` for any code outside [`Locale::SUPPORTED`].
    pub fn parse(code: &str) -> Option<Self> {
        Self::SUPPORTED.into_iter().find(|l| l.code() == code.trim())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A string bundle with one value per supported locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalizedText {
    pub en: String,
    pub vi: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, vi: impl Into<String>) -> Self {
        Self { en: en.into(), vi: vi.into() }
    }

    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::En => &self.en,
            Locale::Vi => &self.vi,
        }
    }

    pub fn validate(&self, field: &str) -> Result<(), String> {
        for locale in Locale::SUPPORTED {
            if self.get(locale).trim().is_empty() {
                return Err(format!("{}.{} must not be empty", field, locale));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Id,
    IdList,
    Text,
    TextList,
    LocalizedText,
    Integer,
    Boolean,
    Date,
    Enum(&'static [&'static str]),
    Object(&'static EntitySchema),
    ObjectList(&'static EntitySchema),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub localized: bool,
}

impl FieldDef {
    pub const fn plain(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, localized: false }
    }

    pub const fn localized(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::LocalizedText,
            localized: true,
        }
    }
}

#[derive(Debug)]
pub struct EntitySchema {
    pub name: &'static str,
    pub collection: &'static str,
    pub fields: &'static [FieldDef],
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn localized_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.localized)
    }
}

/// Per-entity validation beyond what the serde shape already enforces.
pub trait Validate {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Binds a schema to its input types. `New` is the create payload (schema
/// minus the identifier), `Patch` the partial-update payload.
pub trait Entity: Send + Sync + 'static {
    const SCHEMA: &'static EntitySchema;

    /// Stored but never returned by reads.
    const HIDDEN_FIELDS: &'static [&'static str] = &[];

    type New: DeserializeOwned + Serialize + Validate + Send + 'static;
    type Patch: DeserializeOwned + Serialize + Validate + Send + 'static;

    fn prepare_new(new: Self::New) -> Result<Document, String> {
        to_document(&new)
    }

    fn prepare_patch(patch: Self::Patch) -> Result<Document, String> {
        to_document(&patch)
    }
}

/// Serializes a payload into a document body. Payloads are structs, so anything
/// but a JSON object is a programming error surfaced as a message.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, String> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected an object, got {}", other)),
        Err(e) => Err(e.to_string()),
    }
}
