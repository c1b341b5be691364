use serde::{Deserialize, Serialize};

use super::Severity;
use crate::schema::{Entity, EntitySchema, FieldDef, FieldKind, LocalizedText, Validate};

pub const ORGANS: &[&str] = &["skin", "respiratory", "digestive", "cardiovascular", "nervous", "eyes", "other"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Organ {
    Skin,
    Respiratory,
    Digestive,
    Cardiovascular,
    Nervous,
    Eyes,
    Other,
}

pub const SYMPTOM_SCHEMA: EntitySchema = EntitySchema {
    name: "Symptom",
    collection: "symptoms",
    fields: &[
        FieldDef::localized("name"),
        FieldDef::localized("description"),
        FieldDef::plain("severity", FieldKind::Integer),
        FieldDef::plain("organ", FieldKind::Enum(ORGANS)),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Symptom {
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub severity: Severity,
    pub organ: Organ,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SymptomPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organ: Option<Organ>,
}

impl Validate for Symptom {
    fn validate(&self) -> Result<(), String> {
        self.name.validate("name")?;
        self.description.validate("description")
    }
}

impl Validate for SymptomPatch {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            name.validate("name")?;
        }
        if let Some(description) = &self.description {
            description.validate("description")?;
        }
        Ok(())
    }
}

impl Entity for Symptom {
    const SCHEMA: &'static EntitySchema = &SYMPTOM_SCHEMA;
    type New = Symptom;
    type Patch = SymptomPatch;
}
