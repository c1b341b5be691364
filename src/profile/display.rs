//! Derived, never persisted, profile shapes and their projection schemas.

use chrono::NaiveDate;
use serde::Serialize;

use crate::database::DocumentId;
use crate::models::{AllergenType, DiscoveryMethod, Gender, Severity, Symptom};
use crate::models::allergen::ALLERGEN_TYPES;
use crate::models::pap::{DISCOVERY_METHODS, GENDERS};
use crate::models::symptom::ORGANS;
use crate::schema::{EntitySchema, FieldDef, FieldKind, LocalizedText};

pub const RESOLVED_SYMPTOM_SCHEMA: EntitySchema = EntitySchema {
    name: "ResolvedSymptom",
    collection: "symptoms",
    fields: &[
        FieldDef::plain("id", FieldKind::Id),
        FieldDef::localized("name"),
        FieldDef::localized("description"),
        FieldDef::plain("severity", FieldKind::Integer),
        FieldDef::plain("organ", FieldKind::Enum(ORGANS)),
    ],
};

pub const DISPLAY_PAP_ALLERGEN_SCHEMA: EntitySchema = EntitySchema {
    name: "DisplayPapAllergen",
    collection: "paps",
    fields: &[
        FieldDef::plain("allergenId", FieldKind::Id),
        FieldDef::localized("name"),
        FieldDef::plain("type", FieldKind::Enum(ALLERGEN_TYPES)),
        FieldDef::plain("discoveryDate", FieldKind::Date),
        FieldDef::plain("discoveryMethod", FieldKind::Enum(DISCOVERY_METHODS)),
        FieldDef::plain("severity", FieldKind::Integer),
        FieldDef::plain("symptoms", FieldKind::ObjectList(&RESOLVED_SYMPTOM_SCHEMA)),
    ],
};

pub const DISPLAY_PAP_SCHEMA: EntitySchema = EntitySchema {
    name: "DisplayPap",
    collection: "paps",
    fields: &[
        FieldDef::plain("id", FieldKind::Id),
        FieldDef::plain("userId", FieldKind::Id),
        FieldDef::plain("publicId", FieldKind::Text),
        FieldDef::plain("doB", FieldKind::Date),
        FieldDef::plain("gender", FieldKind::Enum(GENDERS)),
        FieldDef::plain("allowPublic", FieldKind::Boolean),
        FieldDef::plain("underlyingMedCon", FieldKind::TextList),
        FieldDef::plain("allergens", FieldKind::ObjectList(&DISPLAY_PAP_ALLERGEN_SCHEMA)),
        FieldDef::plain("revision", FieldKind::Integer),
    ],
};

pub const PUBLIC_PAP_ALLERGEN_SCHEMA: EntitySchema = EntitySchema {
    name: "PublicPapAllergen",
    collection: "paps",
    fields: &[
        FieldDef::plain("allergenId", FieldKind::Id),
        FieldDef::localized("name"),
        FieldDef::plain("type", FieldKind::Enum(ALLERGEN_TYPES)),
        FieldDef::plain("severity", FieldKind::Integer),
        FieldDef::plain("symptoms", FieldKind::ObjectList(&RESOLVED_SYMPTOM_SCHEMA)),
    ],
};

pub const PUBLIC_PAP_SCHEMA: EntitySchema = EntitySchema {
    name: "PublicPap",
    collection: "paps",
    fields: &[
        FieldDef::plain("publicId", FieldKind::Text),
        FieldDef::plain("allergens", FieldKind::ObjectList(&PUBLIC_PAP_ALLERGEN_SCHEMA)),
    ],
};

pub const DISPLAY_SCHEMAS: &[&EntitySchema] = &[
    &RESOLVED_SYMPTOM_SCHEMA,
    &DISPLAY_PAP_ALLERGEN_SCHEMA,
    &DISPLAY_PAP_SCHEMA,
    &PUBLIC_PAP_ALLERGEN_SCHEMA,
    &PUBLIC_PAP_SCHEMA,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSymptom {
    pub id: DocumentId,
    #[serde(flatten)]
    pub symptom: Symptom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPapAllergen {
    pub allergen_id: DocumentId,
    pub name: LocalizedText,
    #[serde(rename = "type")]
    pub allergen_type: AllergenType,
    pub discovery_date: Option<NaiveDate>,
    pub discovery_method: Option<DiscoveryMethod>,
    /// Highest severity among `symptoms`, mild when there are none.
    pub severity: Severity,
    pub symptoms: Vec<ResolvedSymptom>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPap {
    pub id: DocumentId,
    pub user_id: DocumentId,
    pub public_id: String,
    pub do_b: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub allow_public: bool,
    pub underlying_med_con: Vec<String>,
    pub allergens: Vec<DisplayPapAllergen>,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPapAllergen {
    pub allergen_id: DocumentId,
    pub name: LocalizedText,
    #[serde(rename = "type")]
    pub allergen_type: AllergenType,
    pub severity: Severity,
    pub symptoms: Vec<ResolvedSymptom>,
}

impl From<DisplayPapAllergen> for PublicPapAllergen {
    fn from(allergen: DisplayPapAllergen) -> Self {
        Self {
            allergen_id: allergen.allergen_id,
            name: allergen.name,
            allergen_type: allergen.allergen_type,
            severity: allergen.severity,
            symptoms: allergen.symptoms,
        }
    }
}

/// Redacted profile: no personal or discovery metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPap {
    pub public_id: String,
    pub allergens: Vec<PublicPapAllergen>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Organ;
    use crate::schema::{project, to_document};
    use serde_json::json;

    #[test]
    fn public_profile_projects_nested_symptoms() {
        let symptom_id = DocumentId::generate();
        let public = PublicPap {
            public_id: "abc".into(),
            allergens: vec![PublicPapAllergen {
                allergen_id: DocumentId::generate(),
                name: LocalizedText::new("Peanut", "Đậu phộng"),
                allergen_type: AllergenType::Food,
                severity: Severity::MODERATE,
                symptoms: vec![ResolvedSymptom {
                    id: symptom_id,
                    symptom: Symptom {
                        name: LocalizedText::new("Hives", "Nổi mề đay"),
                        description: LocalizedText::new("Welts.", "Sẩn."),
                        severity: Severity::MODERATE,
                        organ: Organ::Skin,
                    },
                }],
            }],
        };

        let value = serde_json::to_value(&public).unwrap();
        let projected = project(value, &PUBLIC_PAP_SCHEMA, "vi");
        assert_eq!(projected["allergens"][0]["name"], json!("Đậu phộng"));
        assert_eq!(projected["allergens"][0]["symptoms"][0]["name"], json!("Nổi mề đay"));
        assert_eq!(projected["allergens"][0]["symptoms"][0]["id"], json!(symptom_id.to_hex()));
        assert_eq!(projected["allergens"][0]["severity"], json!(2));
    }

    #[test]
    fn public_shape_has_no_personal_fields() {
        let public = PublicPap { public_id: "abc".into(), allergens: vec![] };
        let doc = to_document(&public).unwrap();
        let mut keys: Vec<_> = doc.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["allergens".to_string(), "publicId".to_string()]);
    }
}
