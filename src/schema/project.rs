use serde_json::Value;
use tracing::{debug, warn};

use super::{EntitySchema, FieldKind, Locale};
use crate::database::Document;

/// Projects `value` for `requested_locale`: every localized field becomes the
/// single string for that locale, nested objects declared in the schema are
/// projected recursively, every other key passes through. The key set never
/// changes. An unsupported locale returns the value untouched, bundles included.
pub fn project(value: Value, schema: &EntitySchema, requested_locale: &str) -> Value {
    let Some(locale) = Locale::parse(requested_locale) else {
        debug!(
            "Unsupported locale '{}' for {}, returning localized bundles",
            requested_locale, schema.name
        );
        return value;
    };
    project_value(value, schema, locale)
}

pub fn project_document(document: Document, schema: &EntitySchema, locale: Locale) -> Document {
    document
        .into_iter()
        .map(|(key, value)| {
            let projected = match schema.field(&key) {
                Some(field) if field.localized => project_bundle(value, schema, &key, locale),
                Some(field) => match field.kind {
                    FieldKind::Object(nested) => project_value(value, nested, locale),
                    FieldKind::ObjectList(nested) => match value {
                        Value::Array(items) => Value::Array(
                            items.into_iter().map(|item| project_value(item, nested, locale)).collect(),
                        ),
                        other => other,
                    },
                    _ => value,
                },
                None => value,
            };
            (key, projected)
        })
        .collect()
}

fn project_value(value: Value, schema: &EntitySchema, locale: Locale) -> Value {
    match value {
        Value::Object(document) => Value::Object(project_document(document, schema, locale)),
        other => other,
    }
}

fn project_bundle(value: Value, schema: &EntitySchema, field: &str, locale: Locale) -> Value {
    match value {
        Value::Object(bundle) => match bundle.get(locale.code()) {
            Some(Value::String(text)) => Value::String(text.clone()),
            _ => {
                warn!("{}.{} has no '{}' value, leaving bundle untouched", schema.name, field, locale);
                Value::Object(bundle)
            }
        },
        // already a single-locale string
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;
    use serde_json::json;

    const SYMPTOM: EntitySchema = EntitySchema {
        name: "TestSymptom",
        collection: "symptoms",
        fields: &[
            FieldDef::localized("name"),
            FieldDef::plain("severity", FieldKind::Integer),
        ],
    };

    const ALLERGEN: EntitySchema = EntitySchema {
        name: "TestAllergen",
        collection: "allergens",
        fields: &[
            FieldDef::localized("name"),
            FieldDef::localized("description"),
            FieldDef::plain("type", FieldKind::Text),
            FieldDef::plain("symptoms", FieldKind::ObjectList(&SYMPTOM)),
        ],
    };

    fn peanut() -> Value {
        json!({
            "id": "0123456789abcdef01234567",
            "type": "food",
            "name": { "en": "Peanut", "vi": "Đậu phộng" },
            "description": { "en": "A legume.", "vi": "Một loại đậu." },
            "symptoms": [
                { "name": { "en": "Hives", "vi": "Nổi mề đay" }, "severity": 2 }
            ]
        })
    }

    #[test]
    fn replaces_localized_fields_and_recurses() {
        let projected = project(peanut(), &ALLERGEN, "en");
        assert_eq!(projected["name"], json!("Peanut"));
        assert_eq!(projected["description"], json!("A legume."));
        assert_eq!(projected["type"], json!("food"));
        assert_eq!(projected["symptoms"][0]["name"], json!("Hives"));
        assert_eq!(projected["symptoms"][0]["severity"], json!(2));
    }

    #[test]
    fn preserves_key_set() {
        let input = peanut();
        let projected = project(input.clone(), &ALLERGEN, "vi");
        let keys = |v: &Value| v.as_object().unwrap().keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&input), keys(&projected));
    }

    #[test]
    fn projection_is_idempotent() {
        let once = project(peanut(), &ALLERGEN, "vi");
        let twice = project(once.clone(), &ALLERGEN, "vi");
        assert_eq!(once, twice);
    }

    #[test]
    fn locales_project_to_distinct_values() {
        assert_ne!(project(peanut(), &ALLERGEN, "en"), project(peanut(), &ALLERGEN, "vi"));
    }

    #[test]
    fn unsupported_locale_passes_bundles_through() {
        assert_eq!(project(peanut(), &ALLERGEN, "fr"), peanut());
    }

    #[test]
    fn incomplete_bundle_is_left_whole() {
        let broken = json!({ "name": { "en": "Peanut" }, "type": "food" });
        let projected = project(broken.clone(), &ALLERGEN, "vi");
        assert_eq!(projected, broken);
    }
}
