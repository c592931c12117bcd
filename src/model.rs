//! The model registry: how generated model types plug into the runtime.
//!
//! A generated model implements [`ModelDefinition`]: a static field table plus a
//! typed getter and setter. Registering it with a [`ModelRegistry`] parses the
//! field descriptors once, so the deserializer never re-parses type strings.

use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::descriptor::TypeDescriptor;
use crate::value::Value;
use crate::{Error, Result};

/// A declared model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// The field name on the Rust type.
    pub name: &'static str,
    /// The key used for this field in JSON payloads.
    pub json_key: &'static str,
    /// The field's type in descriptor grammar, e.g. `Array<Tag>`.
    pub type_descriptor: &'static str,
}

impl FieldSpec {
    /// Declares a field: Rust name, JSON key and descriptor string.
    pub const fn new(
        name: &'static str,
        json_key: &'static str,
        type_descriptor: &'static str,
    ) -> Self {
        Self {
            name,
            json_key,
            type_descriptor,
        }
    }
}

/// Implemented by generated model types.
///
/// # Examples
///
/// ```
/// use apiclient::{FieldSpec, FromValue, ModelDefinition, ModelRegistry, Result, Value};
/// use serde::Serialize;
///
/// #[derive(Debug, Clone, Default, Serialize)]
/// struct Tag {
///     id: Option<i64>,
///     name: Option<String>,
/// }
///
/// impl ModelDefinition for Tag {
///     const NAME: &'static str = "Tag";
///     const FIELDS: &'static [FieldSpec] = &[
///         FieldSpec::new("id", "id", "Integer"),
///         FieldSpec::new("name", "name", "String"),
///     ];
///
///     fn get(&self, field: &str) -> Option<Value> {
///         match field {
///             "id" => self.id.map(Value::from),
///             "name" => self.name.clone().map(Value::from),
///             _ => None,
///         }
///     }
///
///     fn set(&mut self, field: &str, value: Value) -> Result<()> {
///         match field {
///             "id" => self.id = FromValue::from_value(value)?,
///             "name" => self.name = FromValue::from_value(value)?,
///             _ => {}
///         }
///         Ok(())
///     }
/// }
///
/// # fn main() -> Result<()> {
/// let registry = ModelRegistry::new().with::<Tag>()?;
/// assert!(registry.get("Tag").is_some());
/// # Ok(())
/// # }
/// ```
pub trait ModelDefinition:
    fmt::Debug + Clone + Default + Serialize + Send + Sync + 'static
{
    /// The type name used in descriptors.
    const NAME: &'static str;

    /// The declared fields, in declaration order.
    const FIELDS: &'static [FieldSpec];

    /// Returns the current value of `field`, or `None` when it is unset.
    fn get(&self, field: &str) -> Option<Value>;

    /// Assigns an already converted value to `field`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`](crate::Error::TypeMismatch) when the value
    /// does not fit the field's Rust type.
    fn set(&mut self, field: &str, value: Value) -> Result<()>;
}

/// Object-safe view of a model instance.
///
/// Implemented for every [`ModelDefinition`]; the runtime only deals in
/// `Box<dyn Model>`.
pub trait Model: fmt::Debug + Send + Sync + 'static {
    /// The registered type name.
    fn type_name(&self) -> &'static str;

    /// The declared fields, in declaration order.
    fn fields(&self) -> &'static [FieldSpec];

    /// See [`ModelDefinition::get`].
    fn field_value(&self, name: &str) -> Option<Value>;

    /// # Errors
    ///
    /// See [`ModelDefinition::set`].
    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    /// Full (deep) JSON serialization of the instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if the model's `Serialize`
    /// implementation fails.
    fn to_json(&self) -> Result<serde_json::Value>;

    fn clone_model(&self) -> Box<dyn Model>;

    /// Upcast for downcasting to the concrete model type.
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<M: ModelDefinition> Model for M {
    fn type_name(&self) -> &'static str {
        M::NAME
    }

    fn fields(&self) -> &'static [FieldSpec] {
        M::FIELDS
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        self.get(name)
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.set(name, value)
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| {
            Error::SerializationFailed(format!("Failed to serialize {}: {}", M::NAME, e))
        })
    }

    fn clone_model(&self) -> Box<dyn Model> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Clone for Box<dyn Model> {
    fn clone(&self) -> Self {
        self.clone_model()
    }
}

/// A registered field with its parsed descriptor.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: &'static str,
    pub json_key: &'static str,
    pub descriptor: TypeDescriptor,
}

/// Everything the deserializer needs to build one model type.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    name: &'static str,
    constructor: fn() -> Box<dyn Model>,
    fields: Vec<FieldSchema>,
}

impl ModelSchema {
    /// The registered type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns a fresh default instance.
    pub fn instantiate(&self) -> Box<dyn Model> {
        (self.constructor)()
    }

    /// Parsed fields, in declaration order.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }
}

fn construct<M: ModelDefinition>() -> Box<dyn Model> {
    Box::new(M::default())
}

/// Lookup table from model type name to [`ModelSchema`].
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<&'static str, ModelSchema>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `M`, parsing its field descriptors.
    ///
    /// Registering the same name twice replaces the earlier entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTypeDescriptor`](crate::Error::InvalidTypeDescriptor)
    /// if a field descriptor does not parse.
    pub fn register<M: ModelDefinition>(&mut self) -> Result<&mut Self> {
        let fields = M::FIELDS
            .iter()
            .map(|field| {
                Ok(FieldSchema {
                    name: field.name,
                    json_key: field.json_key,
                    descriptor: field.type_descriptor.parse()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(model = M::NAME, fields = fields.len(), "Registered model");

        self.models.insert(
            M::NAME,
            ModelSchema {
                name: M::NAME,
                constructor: construct::<M>,
                fields,
            },
        );
        Ok(self)
    }

    /// Builder-style variant of [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn with<M: ModelDefinition>(mut self) -> Result<Self> {
        self.register::<M>()?;
        Ok(self)
    }

    /// Looks up a model by its descriptor name.
    pub fn get(&self, name: &str) -> Option<&ModelSchema> {
        self.models.get(name)
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! A cut-down petstore model set for unit tests.

    use super::*;
    use crate::value::FromValue;

    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct Category {
        pub id: Option<i64>,
        pub name: Option<String>,
    }

    impl FromValue for Category {
        fn from_value(value: Value) -> Result<Self> {
            value.into_model()
        }
    }

    impl ModelDefinition for Category {
        const NAME: &'static str = "Category";
        const FIELDS: &'static [FieldSpec] = &[
            FieldSpec::new("id", "id", "Integer"),
            FieldSpec::new("name", "name", "String"),
        ];

        fn get(&self, field: &str) -> Option<Value> {
            match field {
                "id" => self.id.map(Value::from),
                "name" => self.name.clone().map(Value::from),
                _ => None,
            }
        }

        fn set(&mut self, field: &str, value: Value) -> Result<()> {
            match field {
                "id" => self.id = FromValue::from_value(value)?,
                "name" => self.name = FromValue::from_value(value)?,
                _ => {}
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct Pet {
        pub id: Option<i64>,
        pub category: Option<Category>,
        pub name: Option<String>,
        #[serde(rename = "photoUrls")]
        pub photo_urls: Option<Vec<String>>,
        pub tags: Option<Vec<String>>,
        pub status: Option<String>,
    }

    impl FromValue for Pet {
        fn from_value(value: Value) -> Result<Self> {
            value.into_model()
        }
    }

    impl ModelDefinition for Pet {
        const NAME: &'static str = "Pet";
        const FIELDS: &'static [FieldSpec] = &[
            FieldSpec::new("id", "id", "Integer"),
            FieldSpec::new("category", "category", "Category"),
            FieldSpec::new("name", "name", "String"),
            FieldSpec::new("photo_urls", "photoUrls", "Array<String>"),
            FieldSpec::new("tags", "tags", "Array<String>"),
            FieldSpec::new("status", "status", "String"),
        ];

        fn get(&self, field: &str) -> Option<Value> {
            match field {
                "id" => self.id.map(Value::from),
                "category" => self.category.clone().map(Value::model),
                "name" => self.name.clone().map(Value::from),
                "photo_urls" => self.photo_urls.clone().map(Value::from),
                "tags" => self.tags.clone().map(Value::from),
                "status" => self.status.clone().map(Value::from),
                _ => None,
            }
        }

        fn set(&mut self, field: &str, value: Value) -> Result<()> {
            match field {
                "id" => self.id = FromValue::from_value(value)?,
                "category" => self.category = FromValue::from_value(value)?,
                "name" => self.name = FromValue::from_value(value)?,
                "photo_urls" => self.photo_urls = FromValue::from_value(value)?,
                "tags" => self.tags = FromValue::from_value(value)?,
                "status" => self.status = FromValue::from_value(value)?,
                _ => {}
            }
            Ok(())
        }
    }

    pub fn registry() -> ModelRegistry {
        ModelRegistry::new()
            .with::<Category>()
            .and_then(|r| r.with::<Pet>())
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{Category, Pet};
    use super::*;
    use crate::descriptor::Primitive;

    #[test]
    fn test_register_parses_descriptors() {
        let registry = fixtures::registry();
        assert_eq!(registry.len(), 2);

        let schema = registry.get("Pet").unwrap();
        assert_eq!(schema.name(), "Pet");
        let photo_urls = &schema.fields()[3];
        assert_eq!(photo_urls.name, "photo_urls");
        assert_eq!(photo_urls.json_key, "photoUrls");
        assert_eq!(
            photo_urls.descriptor,
            TypeDescriptor::array_of(Primitive::String.into())
        );
        assert_eq!(schema.fields()[1].descriptor, TypeDescriptor::model("Category"));
    }

    #[test]
    fn test_instantiate_gives_default() {
        let registry = fixtures::registry();
        let pet = registry.get("Pet").unwrap().instantiate();
        assert_eq!(pet.type_name(), "Pet");
        assert_eq!(pet.as_any().downcast_ref::<Pet>(), Some(&Pet::default()));
    }

    #[test]
    fn test_invalid_field_descriptor_is_rejected() {
        #[derive(Debug, Clone, Default, Serialize)]
        struct Broken;

        impl ModelDefinition for Broken {
            const NAME: &'static str = "Broken";
            const FIELDS: &'static [FieldSpec] = &[FieldSpec::new("x", "x", "Array<")];

            fn get(&self, _field: &str) -> Option<Value> {
                None
            }

            fn set(&mut self, _field: &str, _value: Value) -> Result<()> {
                Ok(())
            }
        }

        let mut registry = ModelRegistry::new();
        assert!(matches!(
            registry.register::<Broken>(),
            Err(crate::Error::InvalidTypeDescriptor(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_boxed_model_clone_and_downcast() {
        let category = Category {
            id: Some(3),
            name: Some("dogs".to_string()),
        };
        let boxed: Box<dyn Model> = Box::new(category.clone());
        let cloned = boxed.clone();
        assert_eq!(cloned.to_json().unwrap(), serde_json::json!({"id": 3, "name": "dogs"}));
        assert_eq!(Value::Model(cloned).into_model::<Category>().unwrap(), category);
    }

    #[test]
    fn test_serialization_failure_is_reported() {
        /// Keys that are not strings cannot become a JSON object.
        #[derive(Debug, Clone, Default, Serialize)]
        struct Histogram {
            buckets: std::collections::BTreeMap<(i32, i32), i64>,
        }

        impl ModelDefinition for Histogram {
            const NAME: &'static str = "Histogram";
            const FIELDS: &'static [FieldSpec] = &[];

            fn get(&self, _field: &str) -> Option<Value> {
                None
            }

            fn set(&mut self, _field: &str, _value: Value) -> Result<()> {
                Ok(())
            }
        }

        let mut histogram = Histogram::default();
        histogram.buckets.insert((0, 10), 3);

        assert!(matches!(
            histogram.to_json(),
            Err(crate::Error::SerializationFailed(msg)) if msg.contains("Histogram")
        ));
        assert!(matches!(
            Value::model(histogram.clone()).to_json(),
            Err(crate::Error::SerializationFailed(_))
        ));
        assert_ne!(Value::model(histogram.clone()), Value::model(histogram));
    }
}
