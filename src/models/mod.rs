pub mod action_plan;
pub mod allergen;
pub mod allergy;
pub mod pap;
pub mod recommendation;
pub mod severity;
pub mod symptom;
pub mod user;

pub use action_plan::{ActionPlan, ActionPlanPatch};
pub use allergen::{Allergen, AllergenPatch, AllergenType};
pub use allergy::{Allergy, AllergyPatch};
pub use pap::{DiscoveryMethod, Gender, Pap, PapAllergen, PapPatch};
pub use recommendation::{Recommendation, RecommendationPatch};
pub use severity::Severity;
pub use symptom::{Organ, Symptom, SymptomPatch};
pub use user::{NewUser, Role, User, UserChanges, UserPatch};

use crate::schema::{Entity, EntitySchema};

/// Every persisted entity, in the order their collections are migrated.
pub const REGISTRY: &[&EntitySchema] = &[
    User::SCHEMA,
    Symptom::SCHEMA,
    Allergen::SCHEMA,
    Allergy::SCHEMA,
    Pap::SCHEMA,
    Recommendation::SCHEMA,
    ActionPlan::SCHEMA,
];

/// Finds a persisted entity or derived display shape by name.
pub fn lookup(name: &str) -> Option<&'static EntitySchema> {
    REGISTRY
        .iter()
        .chain(crate::profile::display::DISPLAY_SCHEMAS)
        .copied()
        .find(|s| s.name.eq_ignore_ascii_case(name))
}

/// `(collection, field)` pairs whose text values must be unique, ignoring case.
pub const UNIQUE_TEXT_FIELDS: &[(&str, &str)] = &[("users", "email"), ("paps", "userId"), ("paps", "publicId")];

pub fn collections() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|s| s.collection)
}

/// Rejects repeated ids inside one reference list.
pub(crate) fn ensure_unique_ids(field: &str, ids: &[crate::database::DocumentId]) -> Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(format!("{} contains duplicate id {}", field, id));
        }
    }
    Ok(())
}
