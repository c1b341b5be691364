use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ensure_unique_ids;
use crate::database::DocumentId;
use crate::schema::{Entity, EntitySchema, FieldDef, FieldKind, Validate};

pub const GENDERS: &[&str] = &["male", "female", "other"];
pub const DISCOVERY_METHODS: &[&str] = &["skin-prick-test", "blood-test", "oral-challenge", "reaction", "other"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryMethod {
    SkinPrickTest,
    BloodTest,
    OralChallenge,
    Reaction,
    Other,
}

pub const PAP_ALLERGEN_SCHEMA: EntitySchema = EntitySchema {
    name: "PapAllergen",
    collection: "paps",
    fields: &[
        FieldDef::plain("allergenId", FieldKind::Id),
        FieldDef::plain("discoveryDate", FieldKind::Date),
        FieldDef::plain("discoveryMethod", FieldKind::Enum(DISCOVERY_METHODS)),
        FieldDef::plain("symptomsId", FieldKind::IdList),
    ],
};

pub const PAP_SCHEMA: EntitySchema = EntitySchema {
    name: "Pap",
    collection: "paps",
    fields: &[
        FieldDef::plain("userId", FieldKind::Id),
        FieldDef::plain("publicId", FieldKind::Text),
        FieldDef::plain("doB", FieldKind::Date),
        FieldDef::plain("gender", FieldKind::Enum(GENDERS)),
        FieldDef::plain("allowPublic", FieldKind::Boolean),
        FieldDef::plain("underlyingMedCon", FieldKind::TextList),
        FieldDef::plain("allergens", FieldKind::ObjectList(&PAP_ALLERGEN_SCHEMA)),
        FieldDef::plain("revision", FieldKind::Integer),
    ],
};

/// One allergen entry inside a profile. `symptomsId` lists the symptoms this
/// user has actually shown for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PapAllergen {
    pub allergen_id: DocumentId,
    #[serde(default)]
    pub discovery_date: Option<NaiveDate>,
    #[serde(default)]
    pub discovery_method: Option<DiscoveryMethod>,
    #[serde(default)]
    pub symptoms_id: Vec<DocumentId>,
}

/// Personal allergy profile, one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Pap {
    pub user_id: DocumentId,
    pub public_id: String,
    #[serde(default)]
    pub do_b: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub allow_public: bool,
    #[serde(default)]
    pub underlying_med_con: Vec<String>,
    #[serde(default)]
    pub allergens: Vec<PapAllergen>,
    #[serde(default)]
    pub revision: u64,
}

impl Pap {
    /// Blank profile for a newly registered user.
    pub fn blank(user_id: DocumentId) -> Self {
        Self {
            user_id,
            public_id: new_public_id(),
            do_b: None,
            gender: None,
            allow_public: false,
            underlying_med_con: Vec::new(),
            allergens: Vec::new(),
            revision: 0,
        }
    }
}

/// Unguessable share token, independent of the user id.
pub fn new_public_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Owner-editable part of a profile. `expectedRevision` is a precondition,
/// not a stored field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PapPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_b: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_med_con: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergens: Option<Vec<PapAllergen>>,
    #[serde(default, skip_serializing)]
    pub expected_revision: Option<u64>,
}

fn validate_allergens(allergens: &[PapAllergen]) -> Result<(), String> {
    let ids: Vec<DocumentId> = allergens.iter().map(|a| a.allergen_id).collect();
    ensure_unique_ids("allergens.allergenId", &ids)?;
    for entry in allergens {
        ensure_unique_ids("allergens.symptomsId", &entry.symptoms_id)?;
    }
    Ok(())
}

fn validate_conditions(conditions: &[String]) -> Result<(), String> {
    if conditions.iter().any(|c| c.trim().is_empty()) {
        return Err("underlyingMedCon entries must not be empty".to_string());
    }
    Ok(())
}

fn validate_birth_date(do_b: Option<NaiveDate>) -> Result<(), String> {
    match do_b {
        Some(date) if date > chrono::Utc::now().date_naive() => Err("doB must not be in the future".to_string()),
        _ => Ok(()),
    }
}

impl Validate for Pap {
    fn validate(&self) -> Result<(), String> {
        validate_birth_date(self.do_b)?;
        validate_conditions(&self.underlying_med_con)?;
        validate_allergens(&self.allergens)
    }
}

impl Validate for PapPatch {
    fn validate(&self) -> Result<(), String> {
        validate_birth_date(self.do_b)?;
        if let Some(conditions) = &self.underlying_med_con {
            validate_conditions(conditions)?;
        }
        if let Some(allergens) = &self.allergens {
            validate_allergens(allergens)?;
        }
        Ok(())
    }
}

impl Entity for Pap {
    const SCHEMA: &'static EntitySchema = &PAP_SCHEMA;
    type New = Pap;
    type Patch = PapPatch;
}
