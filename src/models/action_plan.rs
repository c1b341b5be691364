use serde::{Deserialize, Serialize};

use super::{ensure_unique_ids, Severity};
use crate::database::DocumentId;
use crate::schema::{Entity, EntitySchema, FieldDef, FieldKind, LocalizedText, Validate};

pub const ACTION_PLAN_SCHEMA: EntitySchema = EntitySchema {
    name: "ActionPlan",
    collection: "action_plans",
    fields: &[
        FieldDef::localized("name"),
        FieldDef::localized("description"),
        FieldDef::plain("severity", FieldKind::Integer),
        FieldDef::plain("allergensId", FieldKind::IdList),
    ],
};

/// What to do when a reaction of the given severity occurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActionPlan {
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub severity: Severity,
    pub allergens_id: Vec<DocumentId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActionPlanPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergens_id: Option<Vec<DocumentId>>,
}

impl Validate for ActionPlan {
    fn validate(&self) -> Result<(), String> {
        self.name.validate("name")?;
        self.description.validate("description")?;
        ensure_unique_ids("allergensId", &self.allergens_id)
    }
}

impl Validate for ActionPlanPatch {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            name.validate("name")?;
        }
        if let Some(description) = &self.description {
            description.validate("description")?;
        }
        if let Some(ids) = &self.allergens_id {
            ensure_unique_ids("allergensId", ids)?;
        }
        Ok(())
    }
}

impl Entity for ActionPlan {
    const SCHEMA: &'static EntitySchema = &ACTION_PLAN_SCHEMA;
    type New = ActionPlan;
    type Patch = ActionPlanPatch;
}
