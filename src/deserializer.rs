//! Response deserialization driven by [`TypeDescriptor`]s.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::Value as Json;

use crate::descriptor::{Primitive, TypeDescriptor};
use crate::model::ModelRegistry;
use crate::negotiation::is_json_mime;
use crate::transport::HttpResponse;
use crate::value::{Value, ValueMap};
use crate::{Error, Result};

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

// Floats in this half-open range truncate to an i64 without saturating.
const I64_RANGE: std::ops::Range<f64> = (i64::MIN as f64)..(i64::MAX as f64);

/// Converts response bodies into [`Value`]s.
///
/// Holds only a borrowed registry, so building one per call is free.
#[derive(Debug, Clone, Copy)]
pub struct Deserializer<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> Deserializer<'a> {
    /// Creates a deserializer that builds models from `registry`.
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    /// Deserializes a response body as `descriptor`.
    ///
    /// `File` returns the body bytes untouched and an empty body is `Value::Null`.
    /// Otherwise a JSON content type means the body is parsed as JSON; any other
    /// content type makes the body an opaque string.
    ///
    /// # Errors
    ///
    /// - [`Error::ParseError`] if the body is declared JSON but malformed
    /// - [`Error::TypeMismatch`] if the data does not have the declared shape
    /// - [`Error::UnknownModel`] if a model name is not registered
    pub fn deserialize(&self, response: &HttpResponse, descriptor: &TypeDescriptor) -> Result<Value> {
        if descriptor.is_file() {
            return Ok(Value::File(response.body.clone()));
        }
        if response.body.is_empty() {
            return Ok(Value::Null);
        }

        let content_type = response.content_type();
        let data = if is_json_mime(content_type) {
            serde_json::from_slice(&response.body).map_err(|e| {
                let raw_response = response.text().into_owned();
                tracing::error!(
                    error = %e,
                    raw_response = %raw_response,
                    "Failed to parse JSON response"
                );
                Error::ParseError {
                    raw_response,
                    serde_error: e.to_string(),
                }
            })?
        } else {
            Json::String(response.text().into_owned())
        };

        tracing::debug!(
            return_type = %descriptor,
            content_type = content_type.unwrap_or_default(),
            "Deserializing response"
        );

        self.convert(data, descriptor)
    }

    /// Converts already decoded JSON into `descriptor`'s shape.
    ///
    /// JSON `null` is `Value::Null` under every descriptor.
    ///
    /// # Errors
    ///
    /// See [`deserialize`](Self::deserialize).
    pub fn convert(&self, data: Json, descriptor: &TypeDescriptor) -> Result<Value> {
        if data.is_null() {
            return Ok(Value::Null);
        }

        match descriptor {
            TypeDescriptor::Primitive(primitive) => convert_primitive(data, *primitive),
            TypeDescriptor::ArrayOf(inner) => match data {
                Json::Array(items) => items
                    .into_iter()
                    .map(|item| self.convert(item, inner))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array),
                other => Err(Error::type_mismatch(descriptor, json_kind(&other))),
            },
            TypeDescriptor::MapOf(inner) => match data {
                Json::Object(entries) => entries
                    .into_iter()
                    .map(|(key, item)| Ok((key, self.convert(item, inner)?)))
                    .collect::<Result<ValueMap>>()
                    .map(Value::Map),
                other => Err(Error::type_mismatch(descriptor, json_kind(&other))),
            },
            TypeDescriptor::Named(name) => self.build_model(name, data),
        }
    }

    fn build_model(&self, name: &str, data: Json) -> Result<Value> {
        let schema = self
            .registry
            .get(name)
            .ok_or_else(|| Error::UnknownModel(name.to_string()))?;

        let Json::Object(mut attributes) = data else {
            return Err(Error::type_mismatch(name, json_kind(&data)));
        };

        let mut instance = schema.instantiate();
        for field in schema.fields() {
            let Some(raw) = attributes.remove(field.json_key) else {
                continue;
            };
            if raw.is_null() {
                continue;
            }
            let value = self.convert(raw, &field.descriptor)?;
            instance.set_field(field.name, value)?;
        }

        Ok(Value::Model(instance))
    }
}

fn convert_primitive(data: Json, primitive: Primitive) -> Result<Value> {
    let mismatch = |data: &Json| {
        Error::type_mismatch(TypeDescriptor::Primitive(primitive), json_kind(data))
    };

    match primitive {
        Primitive::String => Ok(Value::String(into_text(data))),
        Primitive::File => Ok(Value::File(Bytes::from(into_text(data)))),
        Primitive::Object => Ok(Value::Json(data)),
        Primitive::Integer => match &data {
            Json::Number(n) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| I64_RANGE.contains(f))
                        .map(|f| f.trunc() as i64)
                })
                .map(Value::Integer)
                .ok_or_else(|| mismatch(&data)),
            Json::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| mismatch(&data)),
            _ => Err(mismatch(&data)),
        },
        Primitive::Float => match &data {
            Json::Number(n) => n.as_f64().map(Value::Float).ok_or_else(|| mismatch(&data)),
            Json::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| mismatch(&data)),
            _ => Err(mismatch(&data)),
        },
        Primitive::Boolean => Ok(Value::Boolean(match &data {
            Json::Bool(b) => *b,
            Json::String(s) => is_truthy(s),
            Json::Number(n) => is_truthy(&n.to_string()),
            _ => false,
        })),
        Primitive::Date => match &data {
            Json::String(s) => parse_date(s).map(Value::Date).ok_or_else(|| mismatch(&data)),
            _ => Err(mismatch(&data)),
        },
        Primitive::DateTime => match &data {
            Json::String(s) => parse_datetime(s)
                .map(Value::DateTime)
                .ok_or_else(|| mismatch(&data)),
            _ => Err(mismatch(&data)),
        },
    }
}

fn into_text(data: Json) -> String {
    match data {
        Json::String(s) => s,
        other => other.to_string(),
    }
}

fn is_truthy(s: &str) -> bool {
    let s = s.trim();
    ["true", "t", "yes", "y", "1"]
        .iter()
        .any(|truthy| s.eq_ignore_ascii_case(truthy))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.date_naive()))
}

fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

fn json_kind(data: &Json) -> &'static str {
    match data {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{self, Category, Pet};
    use http::{HeaderMap, HeaderValue, StatusCode};
    use serde_json::json;

    fn response(content_type: &str, body: &str) -> HttpResponse {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_str(content_type).unwrap());
        HttpResponse::new(StatusCode::OK, headers, body.to_string())
    }

    fn descriptor(s: &str) -> TypeDescriptor {
        s.parse().unwrap()
    }

    #[test]
    fn test_hash_of_strings() {
        let registry = ModelRegistry::new();
        let data = Deserializer::new(&registry)
            .deserialize(
                &response("application/json", r#"{"message": "Hello"}"#),
                &descriptor("Hash<String, String>"),
            )
            .unwrap();

        let expected: ValueMap = vec![("message", Value::from("Hello"))].into_iter().collect();
        assert_eq!(data, Value::Map(expected));
    }

    #[test]
    fn test_hash_of_models() {
        let registry = fixtures::registry();
        let data = Deserializer::new(&registry)
            .deserialize(
                &response("application/json", r#"{"pet": {"id": 1}}"#),
                &descriptor("Hash<String, Pet>"),
            )
            .unwrap();

        let map = data.as_map().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["pet"]);
        let pet = map.get("pet").unwrap().as_model::<Pet>().unwrap();
        assert_eq!(pet.id, Some(1));
        assert_eq!(pet.name, None);
    }

    #[test]
    fn test_model_fields_use_wire_keys_and_ignore_unknown() {
        let registry = fixtures::registry();
        let body = json!({
            "id": 7,
            "category": {"id": 2, "name": "dogs"},
            "photoUrls": ["a.png", "b.png"],
            "status": null,
            "unknown": true,
        });

        let pet: Pet = Deserializer::new(&registry)
            .convert(body, &descriptor("Pet"))
            .unwrap()
            .into_model()
            .unwrap();

        assert_eq!(
            pet,
            Pet {
                id: Some(7),
                category: Some(Category {
                    id: Some(2),
                    name: Some("dogs".to_string()),
                }),
                photo_urls: Some(vec!["a.png".to_string(), "b.png".to_string()]),
                ..Pet::default()
            }
        );
    }

    #[test]
    fn test_array_preserves_order() {
        let registry = ModelRegistry::new();
        let data = Deserializer::new(&registry)
            .convert(json!(["3", 1, 2.9]), &descriptor("Array<Integer>"))
            .unwrap();
        assert_eq!(
            data,
            Value::Array(vec![Value::Integer(3), Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let registry = ModelRegistry::new();
        let data = Deserializer::new(&registry)
            .deserialize(
                &response("application/json", r#"{"z": 1, "a": 2, "m": 3}"#),
                &descriptor("Hash<String, Integer>"),
            )
            .unwrap();
        assert_eq!(data.as_map().unwrap().keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_shape_mismatch() {
        let registry = fixtures::registry();
        let deserializer = Deserializer::new(&registry);

        for (body, desc) in [
            (json!([1, 2]), "Hash<String, Integer>"),
            (json!({"a": 1}), "Array<Integer>"),
            (json!("doggie"), "Pet"),
            (json!("abc"), "Integer"),
            (json!("31/01/2020"), "Date"),
        ] {
            match deserializer.convert(body, &descriptor(desc)) {
                Err(Error::TypeMismatch { expected, .. }) => assert_eq!(expected, desc),
                other => panic!("Expected TypeMismatch for {}, got {:?}", desc, other),
            }
        }
    }

    #[test]
    fn test_malformed_json() {
        let registry = ModelRegistry::new();
        let result = Deserializer::new(&registry)
            .deserialize(&response("application/json", "{not json"), &descriptor("Object"));

        match result {
            Err(Error::ParseError { raw_response, .. }) => assert_eq!(raw_response, "{not json"),
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_model() {
        let registry = ModelRegistry::new();
        let result = Deserializer::new(&registry).convert(json!({}), &descriptor("Order"));
        assert!(matches!(result, Err(Error::UnknownModel(name)) if name == "Order"));
    }

    #[test]
    fn test_non_json_body_is_opaque_string() {
        let registry = ModelRegistry::new();
        let deserializer = Deserializer::new(&registry);

        let text = deserializer
            .deserialize(&response("text/plain", "{\"a\": 1}"), &descriptor("String"))
            .unwrap();
        assert_eq!(text, Value::from("{\"a\": 1}"));

        let number = deserializer
            .deserialize(&response("text/plain", "42"), &descriptor("Integer"))
            .unwrap();
        assert_eq!(number, Value::Integer(42));
    }

    #[test]
    fn test_file_returns_raw_body() {
        let registry = ModelRegistry::new();
        let data = Deserializer::new(&registry)
            .deserialize(&response("application/json", "{not json"), &descriptor("File"))
            .unwrap();
        assert_eq!(data, Value::File(Bytes::from_static(b"{not json")));
    }

    #[test]
    fn test_file_keeps_non_utf8_bytes() {
        let registry = ModelRegistry::new();
        let raw: &'static [u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0xFF, 0xFE];
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("image/png"));
        let response = HttpResponse::new(StatusCode::OK, headers, raw);

        let data = Deserializer::new(&registry)
            .deserialize(&response, &descriptor("File"))
            .unwrap();
        assert_eq!(data.as_bytes(), Some(raw));
    }

    #[test]
    fn test_integer_out_of_range_is_rejected() {
        let registry = ModelRegistry::new();
        let deserializer = Deserializer::new(&registry);
        let integer = descriptor("Integer");

        for body in ["18446744073709551615", "1e20", "-1e19", "9223372036854775808"] {
            let data: Json = serde_json::from_str(body).unwrap();
            match deserializer.convert(data, &integer) {
                Err(Error::TypeMismatch { expected, found }) => {
                    assert_eq!(expected, "Integer");
                    assert_eq!(found, "number");
                }
                other => panic!("Expected TypeMismatch for {}, got {:?}", body, other),
            }
        }

        assert_eq!(
            deserializer.convert(json!(i64::MAX), &integer).unwrap(),
            Value::Integer(i64::MAX)
        );
        assert_eq!(
            deserializer.convert(json!(-2.5e3), &integer).unwrap(),
            Value::Integer(-2500)
        );
    }

    #[test]
    fn test_empty_body_and_null() {
        let registry = fixtures::registry();
        let deserializer = Deserializer::new(&registry);

        let empty = deserializer
            .deserialize(&response("application/json", ""), &descriptor("Pet"))
            .unwrap();
        assert!(empty.is_null());

        let null = deserializer
            .deserialize(&response("application/json", "null"), &descriptor("Pet"))
            .unwrap();
        assert!(null.is_null());
    }

    #[test]
    fn test_boolean_coercion() {
        let registry = ModelRegistry::new();
        let deserializer = Deserializer::new(&registry);
        let boolean = descriptor("Boolean");

        for truthy in [json!(true), json!("TRUE"), json!("t"), json!("Yes"), json!("y"), json!(1)] {
            assert_eq!(deserializer.convert(truthy, &boolean).unwrap(), Value::Boolean(true));
        }
        for falsy in [json!(false), json!("no"), json!(0), json!("maybe"), json!([])] {
            assert_eq!(deserializer.convert(falsy, &boolean).unwrap(), Value::Boolean(false));
        }
    }

    #[test]
    fn test_dates() {
        let registry = ModelRegistry::new();
        let deserializer = Deserializer::new(&registry);

        let date = deserializer
            .convert(json!("2020-01-31"), &descriptor("Date"))
            .unwrap();
        assert_eq!(date, Value::Date(NaiveDate::from_ymd_opt(2020, 1, 31).unwrap()));

        let dt = deserializer
            .convert(json!("2020-01-31T10:20:30+02:00"), &descriptor("DateTime"))
            .unwrap();
        assert_eq!(
            dt,
            Value::DateTime(DateTime::parse_from_rfc3339("2020-01-31T08:20:30Z").unwrap())
        );

        let naive = deserializer
            .convert(json!("2020-01-31T10:20:30.500"), &descriptor("DateTime"))
            .unwrap();
        assert_eq!(
            naive,
            Value::DateTime(DateTime::parse_from_rfc3339("2020-01-31T10:20:30.5Z").unwrap())
        );
    }
}
