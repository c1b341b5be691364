use serde::{Deserialize, Serialize};

use super::ensure_unique_ids;
use crate::database::DocumentId;
use crate::schema::{Entity, EntitySchema, FieldDef, FieldKind, LocalizedText, Validate};

pub const RECOMMENDATION_SCHEMA: EntitySchema = EntitySchema {
    name: "Recommendation",
    collection: "recommendations",
    fields: &[
        FieldDef::localized("name"),
        FieldDef::localized("content"),
        FieldDef::plain("allergensId", FieldKind::IdList),
    ],
};

/// Advice text attached to the allergens it applies to. `content` holds
/// pre-rendered rich text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Recommendation {
    pub name: LocalizedText,
    pub content: LocalizedText,
    pub allergens_id: Vec<DocumentId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecommendationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergens_id: Option<Vec<DocumentId>>,
}

impl Validate for Recommendation {
    fn validate(&self) -> Result<(), String> {
        self.name.validate("name")?;
        self.content.validate("content")?;
        ensure_unique_ids("allergensId", &self.allergens_id)
    }
}

impl Validate for RecommendationPatch {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            name.validate("name")?;
        }
        if let Some(content) = &self.content {
            content.validate("content")?;
        }
        if let Some(ids) = &self.allergens_id {
            ensure_unique_ids("allergensId", ids)?;
        }
        Ok(())
    }
}

impl Entity for Recommendation {
    const SCHEMA: &'static EntitySchema = &RECOMMENDATION_SCHEMA;
    type New = Recommendation;
    type Patch = RecommendationPatch;
}
