//! Input contract for data packs.
//!
//! A data pack is a JSON array of objects. Each object is itself the stored
//! payload (there is no nested `data` wrapper); its `@id`, `@type`, `name`
//! and optional `description` are projected into indexed columns.
//!
//! Validation walks the whole array before anything is written and stops at
//! the first violation.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::models::NewEntry;

/// Check a data pack and project every entry.
pub fn verify_input_data(data: &Value) -> Result<Vec<NewEntry>, ValidationError> {
    let items = data
        .as_array()
        .ok_or_else(|| ValidationError::new("Data must be an array"))?;

    items.iter().map(project_entry).collect()
}

fn project_entry(item: &Value) -> Result<NewEntry, ValidationError> {
    let obj = item
        .as_object()
        .ok_or_else(|| ValidationError::new("Each entry in the data must be an object"))?;

    for (key, article) in [("@id", "an"), ("@type", "an"), ("name", "a")] {
        if !obj.contains_key(key) {
            return Err(ValidationError::new(format!(
                "Each entry in the data must have {} {} property",
                article, key
            )));
        }
    }

    let description = match obj.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(ValidationError::new(
                "The description property of each entry must be a string",
            ))
        }
    };

    Ok(NewEntry {
        at_id: required_string(obj, "@id")?,
        at_type: required_string(obj, "@type")?,
        name: required_string(obj, "name")?,
        description,
        data: obj.clone(),
    })
}

fn required_string(obj: &Map<String, Value>, key: &str) -> Result<String, ValidationError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(ValidationError::new(format!(
            "The {} property of each entry must be a string",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(data: Value) -> String {
        verify_input_data(&data).unwrap_err().message().to_string()
    }

    #[test]
    fn test_valid_pack_projects_columns() {
        let data = json!([
            {"@id": "1", "@type": "Product", "name": "describo", "description": "an awesome tool!", "extra": [1, 2]},
            {"@id": "2", "@type": "Person", "name": "alice"}
        ]);
        let entries = verify_input_data(&data).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].at_id, "1");
        assert_eq!(entries[0].description.as_deref(), Some("an awesome tool!"));
        assert_eq!(entries[0].data["extra"], json!([1, 2]));
        assert_eq!(entries[1].description, None);
        assert_eq!(Value::Object(entries[1].data.clone()), data[1]);
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(verify_input_data(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_not_an_array() {
        assert_eq!(message(json!({"@id": "1"})), "Data must be an array");
        assert_eq!(message(json!("nope")), "Data must be an array");
    }

    #[test]
    fn test_element_not_an_object() {
        assert_eq!(
            message(json!([{"@id": "1", "@type": "T", "name": "n"}, 42])),
            "Each entry in the data must be an object"
        );
    }

    #[test]
    fn test_missing_required_properties() {
        assert_eq!(
            message(json!([{"@type": "T", "name": "n"}])),
            "Each entry in the data must have an @id property"
        );
        assert_eq!(
            message(json!([{"@id": "1", "name": "n"}])),
            "Each entry in the data must have an @type property"
        );
        assert_eq!(
            message(json!([{"@id": "1", "@type": "T"}])),
            "Each entry in the data must have a name property"
        );
    }

    #[test]
    fn test_first_violation_wins() {
        // The second entry lacks @id, the first lacks name: name is reported.
        assert_eq!(
            message(json!([{"@id": "1", "@type": "T"}, {"@type": "T", "name": "n"}])),
            "Each entry in the data must have a name property"
        );
    }

    #[test]
    fn test_non_string_properties_rejected() {
        assert_eq!(
            message(json!([{"@id": 1, "@type": "T", "name": "n"}])),
            "The @id property of each entry must be a string"
        );
        assert_eq!(
            message(json!([{"@id": "1", "@type": ["A", "B"], "name": "n"}])),
            "The @type property of each entry must be a string"
        );
        assert_eq!(
            message(json!([{"@id": "1", "@type": "T", "name": "n", "description": {}}])),
            "The description property of each entry must be a string"
        );
    }

    #[test]
    fn test_null_description_is_absent() {
        let entries =
            verify_input_data(&json!([{"@id": "1", "@type": "T", "name": "n", "description": null}]))
                .unwrap();
        assert_eq!(entries[0].description, None);
    }
}
