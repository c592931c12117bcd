//! Type descriptors: the declared shape of a response or model field.
//!
//! Descriptors are written in the grammar API definitions use
//! (`Array<Pet>`, `Hash<String, Integer>`, ...) and parsed once into a
//! [`TypeDescriptor`] tree that the deserializer walks.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Scalar types with a built-in conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
    Date,
    /// Raw response body, returned without any parsing.
    File,
    /// Untyped JSON, passed through as decoded.
    Object,
}

impl Primitive {
    fn from_name(name: &str) -> Option<Self> {
        let primitive = match name {
            "String" => Primitive::String,
            "Integer" => Primitive::Integer,
            "Float" => Primitive::Float,
            "Boolean" | "BOOLEAN" => Primitive::Boolean,
            "DateTime" => Primitive::DateTime,
            "Date" => Primitive::Date,
            "File" => Primitive::File,
            "Object" => Primitive::Object,
            _ => return None,
        };
        Some(primitive)
    }

    fn name(self) -> &'static str {
        match self {
            Primitive::String => "String",
            Primitive::Integer => "Integer",
            Primitive::Float => "Float",
            Primitive::Boolean => "Boolean",
            Primitive::DateTime => "DateTime",
            Primitive::Date => "Date",
            Primitive::File => "File",
            Primitive::Object => "Object",
        }
    }
}

/// A parsed type descriptor.
///
/// # Examples
///
/// ```
/// use apiclient::TypeDescriptor;
///
/// let descriptor: TypeDescriptor = "Hash<String, Array<Pet>>".parse().unwrap();
/// assert_eq!(
///     descriptor,
///     TypeDescriptor::map_of(TypeDescriptor::array_of(TypeDescriptor::model("Pet")))
/// );
/// assert_eq!(descriptor.to_string(), "Hash<String, Array<Pet>>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Primitive(Primitive),
    /// `Array<T>`
    ArrayOf(Box<TypeDescriptor>),
    /// `Hash<String, T>`; keys are always strings.
    MapOf(Box<TypeDescriptor>),
    /// A model registered in the [`ModelRegistry`](crate::ModelRegistry).
    Named(String),
}

impl TypeDescriptor {
    /// `Array<inner>`.
    pub fn array_of(inner: TypeDescriptor) -> Self {
        TypeDescriptor::ArrayOf(Box::new(inner))
    }

    /// `Hash<String, inner>`.
    pub fn map_of(inner: TypeDescriptor) -> Self {
        TypeDescriptor::MapOf(Box::new(inner))
    }

    /// A registered model, by name.
    pub fn model(name: impl Into<String>) -> Self {
        TypeDescriptor::Named(name.into())
    }

    pub fn is_file(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive(Primitive::File))
    }
}

impl From<Primitive> for TypeDescriptor {
    fn from(primitive: Primitive) -> Self {
        TypeDescriptor::Primitive(primitive)
    }
}

impl FromStr for TypeDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s.trim()).ok_or_else(|| Error::InvalidTypeDescriptor(s.to_string()))
    }
}

fn parse(s: &str) -> Option<TypeDescriptor> {
    if let Some(inner) = generic_args(s, "Array") {
        return parse(inner.trim()).map(TypeDescriptor::array_of);
    }

    if let Some(inner) = generic_args(s, "Hash") {
        let (key, value) = split_top_level_comma(inner)?;
        if key.trim() != "String" {
            return None;
        }
        return parse(value.trim()).map(TypeDescriptor::map_of);
    }

    if let Some(primitive) = Primitive::from_name(s) {
        return Some(TypeDescriptor::Primitive(primitive));
    }

    is_model_name(s).then(|| TypeDescriptor::model(s))
}

/// Returns what sits between `Name<` and the final `>`.
fn generic_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('<')?
        .strip_suffix('>')
}

fn split_top_level_comma(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (idx, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => return Some((&s[..idx], &s[idx + 1..])),
            _ => {}
        }
    }
    None
}

fn is_model_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(p) => f.write_str(p.name()),
            TypeDescriptor::ArrayOf(inner) => write!(f, "Array<{}>", inner),
            TypeDescriptor::MapOf(inner) => write!(f, "Hash<String, {}>", inner),
            TypeDescriptor::Named(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(s: &str) -> TypeDescriptor {
        s.parse().unwrap()
    }

    #[test]
    fn test_primitives() {
        assert_eq!(parse_ok("String"), Primitive::String.into());
        assert_eq!(parse_ok("Integer"), Primitive::Integer.into());
        assert_eq!(parse_ok("BOOLEAN"), Primitive::Boolean.into());
        assert_eq!(parse_ok(" DateTime "), Primitive::DateTime.into());
        assert!(parse_ok("File").is_file());
    }

    #[test]
    fn test_containers() {
        assert_eq!(
            parse_ok("Array<String>"),
            TypeDescriptor::array_of(Primitive::String.into())
        );
        assert_eq!(
            parse_ok("Hash<String,Pet>"),
            TypeDescriptor::map_of(TypeDescriptor::model("Pet"))
        );
        assert_eq!(
            parse_ok("Hash<String, Array<Pet>>"),
            TypeDescriptor::map_of(TypeDescriptor::array_of(TypeDescriptor::model("Pet")))
        );
        assert_eq!(
            parse_ok("Array<Hash<String, Integer>>"),
            TypeDescriptor::array_of(TypeDescriptor::map_of(Primitive::Integer.into()))
        );
    }

    #[test]
    fn test_display_matches_grammar() {
        for s in ["Pet", "Array<Tag>", "Hash<String, Array<Integer>>"] {
            assert_eq!(parse_ok(s).to_string(), s);
        }
    }

    #[test]
    fn test_invalid_descriptors() {
        for s in ["", "Array<", "Array<>", "Hash<Integer, Pet>", "Hash<String>", "Pet Store", "1Pet"] {
            match s.parse::<TypeDescriptor>() {
                Err(Error::InvalidTypeDescriptor(raw)) => assert_eq!(raw, s),
                other => panic!("Expected InvalidTypeDescriptor for {:?}, got {:?}", s, other),
            }
        }
    }
}
