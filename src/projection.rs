//! Projection of model instances into plain maps.

use crate::model::Model;
use crate::value::ValueMap;

/// Projects `model` into an ordered map keyed by the fields' JSON keys.
///
/// Fields are visited in declaration order. Unset (`None`) fields are left
/// out; empty arrays and maps are kept, since empty and absent differ on the
/// wire.
///
/// The projection is shallow: a nested model stays a
/// [`Value::Model`](crate::Value::Model). Use [`Value::to_json`](crate::Value::to_json)
/// on the result for a fully serialized form.
pub fn object_to_hash(model: &dyn Model) -> ValueMap {
    let fields = model.fields();
    let mut hash = ValueMap::with_capacity(fields.len());
    for field in fields {
        if let Some(value) = model.field_value(field.name) {
            if !value.is_null() {
                hash.insert(field.json_key, value);
            }
        }
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{Category, Pet};
    use crate::value::Value;

    #[test]
    fn test_ignores_nils_and_includes_empty_arrays() {
        let pet = Pet {
            id: Some(1),
            name: Some(String::new()),
            status: None,
            photo_urls: None,
            tags: Some(vec![]),
            ..Pet::default()
        };

        let expected: ValueMap = vec![
            ("id", Value::Integer(1)),
            ("name", Value::from("")),
            ("tags", Value::Array(vec![])),
        ]
        .into_iter()
        .collect();

        assert_eq!(object_to_hash(&pet), expected);
    }

    #[test]
    fn test_uses_declaration_order_and_json_keys() {
        let pet = Pet {
            status: Some("sold".to_string()),
            photo_urls: Some(vec!["a.png".to_string()]),
            id: Some(9),
            ..Pet::default()
        };

        let hash = object_to_hash(&pet);
        assert_eq!(hash.keys().collect::<Vec<_>>(), vec!["id", "photoUrls", "status"]);
    }

    // Nested models are not projected; the caller gets the model itself.
    #[test]
    fn test_projection_is_shallow() {
        let category = Category {
            id: Some(2),
            name: Some("dogs".to_string()),
        };
        let pet = Pet {
            category: Some(category.clone()),
            ..Pet::default()
        };

        let hash = object_to_hash(&pet);
        let nested = hash.get("category").unwrap();
        assert_eq!(nested.as_model::<Category>(), Some(&category));
        assert_eq!(
            Value::Map(hash).to_json().unwrap(),
            serde_json::json!({"category": {"id": 2, "name": "dogs"}})
        );
    }
}
