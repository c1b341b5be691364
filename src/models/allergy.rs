use serde::{Deserialize, Serialize};

use super::ensure_unique_ids;
use crate::database::DocumentId;
use crate::schema::{Entity, EntitySchema, FieldDef, FieldKind, LocalizedText, Validate};

pub const ALLERGY_SCHEMA: EntitySchema = EntitySchema {
    name: "Allergy",
    collection: "allergies",
    fields: &[
        FieldDef::localized("name"),
        FieldDef::plain("allergensId", FieldKind::IdList),
    ],
};

/// A named grouping of allergens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Allergy {
    pub name: LocalizedText,
    pub allergens_id: Vec<DocumentId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AllergyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergens_id: Option<Vec<DocumentId>>,
}

impl Validate for Allergy {
    fn validate(&self) -> Result<(), String> {
        self.name.validate("name")?;
        ensure_unique_ids("allergensId", &self.allergens_id)
    }
}

impl Validate for AllergyPatch {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            name.validate("name")?;
        }
        if let Some(ids) = &self.allergens_id {
            ensure_unique_ids("allergensId", ids)?;
        }
        Ok(())
    }
}

impl Entity for Allergy {
    const SCHEMA: &'static EntitySchema = &ALLERGY_SCHEMA;
    type New = Allergy;
    type Patch = AllergyPatch;
}
