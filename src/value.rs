//! Dynamic values produced by the deserializer.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use indexmap::IndexMap;
use std::collections::HashMap;

use crate::model::Model;
use crate::{Error, Result};

/// A deserialized value.
///
/// The variant follows the [`TypeDescriptor`](crate::TypeDescriptor) the data
/// was converted with: primitives become scalars, `Array<T>` an [`Value::Array`],
/// `Hash<String, T>` a [`Value::Map`] and model names a [`Value::Model`].
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    /// The raw response body of a `File` response.
    File(Bytes),
    /// Untyped JSON (`Object` descriptor).
    Json(serde_json::Value),
    Array(Vec<Value>),
    Map(ValueMap),
    Model(Box<dyn Model>),
}

impl Value {
    /// Wraps a model instance.
    pub fn model<M: Model>(model: M) -> Self {
        Value::Model(Box::new(model))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bytes of a `File` value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::File(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the map of a `Hash` value.
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns a reference to the wrapped model if it is an `M`.
    pub fn as_model<M: Model>(&self) -> Option<&M> {
        match self {
            Value::Model(model) => model.as_any().downcast_ref::<M>(),
            _ => None,
        }
    }

    /// Takes the wrapped model out as an `M`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the value is not a model of type `M`.
    pub fn into_model<M: Model>(self) -> Result<M> {
        match self {
            Value::Model(model) => {
                let found = model.type_name();
                model
                    .into_any()
                    .downcast::<M>()
                    .map(|m| *m)
                    .map_err(|_| Error::type_mismatch(std::any::type_name::<M>(), found))
            }
            other => Err(Error::type_mismatch(
                std::any::type_name::<M>(),
                other.kind(),
            )),
        }
    }

    /// Converts to JSON, serializing nested models in full.
    ///
    /// `File` bytes are base64-encoded; non-finite floats become `null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if a nested model fails to
    /// serialize.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        use serde_json::Value as Json;
        Ok(match self {
            Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Integer(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::File(bytes) => Json::String(STANDARD.encode(bytes)),
            Value::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => Json::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Json(json) => json.clone(),
            Value::Array(items) => Json::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Map(map) => map.to_json()?,
            Value::Model(model) => model.to_json()?,
        })
    }

    /// Short name of the variant, used in error messages.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::File(_) => "file",
            Value::Json(_) => "json",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Model(model) => model.type_name(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::File(a), Value::File(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // Models that fail to serialize are never equal.
            (Value::Model(a), Value::Model(b)) => {
                a.type_name() == b.type_name()
                    && matches!((a.to_json(), b.to_json()), (Ok(x), Ok(y)) if x == y)
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::Json(json)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<Bytes> for Value {
    fn from(bytes: Bytes) -> Self {
        Value::File(bytes)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

/// Typed extraction from a [`Value`], used by model setters.
pub trait FromValue: Sized {
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] when the value has another shape.
    fn from_value(value: Value) -> Result<Self>;
}

macro_rules! scalar_from_value {
    ($ty:ty, $expected:literal, $($pat:pat => $out:expr),+) => {
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    $($pat => Ok($out),)+
                    other => Err(Error::type_mismatch($expected, other.kind())),
                }
            }
        }
    };
}

scalar_from_value!(bool, "Boolean", Value::Boolean(b) => b);
scalar_from_value!(i64, "Integer", Value::Integer(i) => i);
scalar_from_value!(f64, "Float", Value::Float(f) => f, Value::Integer(i) => i as f64);
scalar_from_value!(String, "String", Value::String(s) => s);
scalar_from_value!(Bytes, "File", Value::File(bytes) => bytes);
scalar_from_value!(NaiveDate, "Date", Value::Date(d) => d);
scalar_from_value!(DateTime<FixedOffset>, "DateTime", Value::DateTime(dt) => dt);
scalar_from_value!(serde_json::Value, "Object", Value::Json(json) => json);

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self> {
        let i = i64::from_value(value)?;
        i32::try_from(i).map_err(|_| Error::type_mismatch("Integer (32-bit)", i.to_string()))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(Error::type_mismatch("Array", other.kind())),
        }
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            other => Err(Error::type_mismatch("Hash", other.kind())),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

/// A string-keyed map that keeps insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: IndexMap<String, Value>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts a value, replacing (in place) any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Returns the value stored for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts to a JSON object with the same key order.
    ///
    /// # Errors
    ///
    /// See [`Value::to_json`].
    pub fn to_json(&self) -> Result<serde_json::Value> {
        self.entries
            .iter()
            .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
            .collect::<Result<serde_json::Map<_, _>>>()
            .map(serde_json::Value::Object)
    }
}

impl IntoIterator for ValueMap {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = ValueMap::with_capacity(iter.size_hint().0);
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
