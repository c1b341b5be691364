use serde::{Deserialize, Serialize};

use super::ensure_unique_ids;
use crate::database::DocumentId;
use crate::schema::{Entity, EntitySchema, FieldDef, FieldKind, LocalizedText, Validate};

pub const ALLERGEN_TYPES: &[&str] = &["food", "drug", "respiratory", "venom", "contact", "miscellaneous"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllergenType {
    Food,
    Drug,
    Respiratory,
    Venom,
    Contact,
    Miscellaneous,
}

pub const ALLERGEN_SCHEMA: EntitySchema = EntitySchema {
    name: "Allergen",
    collection: "allergens",
    fields: &[
        FieldDef::localized("name"),
        FieldDef::localized("description"),
        FieldDef::plain("type", FieldKind::Enum(ALLERGEN_TYPES)),
        FieldDef::plain("isWholeAllergen", FieldKind::Boolean),
        FieldDef::plain("symptomsId", FieldKind::IdList),
        FieldDef::plain("crossSensitivityId", FieldKind::IdList),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Allergen {
    pub name: LocalizedText,
    pub description: LocalizedText,
    #[serde(rename = "type")]
    pub allergen_type: AllergenType,
    pub is_whole_allergen: bool,
    pub symptoms_id: Vec<DocumentId>,
    pub cross_sensitivity_id: Vec<DocumentId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AllergenPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub allergen_type: Option<AllergenType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_whole_allergen: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms_id: Option<Vec<DocumentId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_sensitivity_id: Option<Vec<DocumentId>>,
}

impl Validate for Allergen {
    fn validate(&self) -> Result<(), String> {
        self.name.validate("name")?;
        self.description.validate("description")?;
        ensure_unique_ids("symptomsId", &self.symptoms_id)?;
        ensure_unique_ids("crossSensitivityId", &self.cross_sensitivity_id)
    }
}

impl Validate for AllergenPatch {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            name.validate("name")?;
        }
        if let Some(description) = &self.description {
            description.validate("description")?;
        }
        if let Some(ids) = &self.symptoms_id {
            ensure_unique_ids("symptomsId", ids)?;
        }
        if let Some(ids) = &self.cross_sensitivity_id {
            ensure_unique_ids("crossSensitivityId", ids)?;
        }
        Ok(())
    }
}

impl Entity for Allergen {
    const SCHEMA: &'static EntitySchema = &ALLERGEN_SCHEMA;
    type New = Allergen;
    type Patch = AllergenPatch;
}
