//! Encoding of array-valued parameters.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// How an array parameter is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionFormat {
    /// Comma separated: `aa,bb,cc`.
    Csv,
    /// Space separated: `aa bb cc`.
    Ssv,
    /// Tab separated.
    Tsv,
    /// Pipe separated: `aa|bb|cc`.
    Pipes,
    /// One query parameter per value (`id=aa&id=bb&id=cc`).
    Multi,
}

impl CollectionFormat {
    fn separator(self) -> Option<&'static str> {
        match self {
            CollectionFormat::Csv => Some(","),
            CollectionFormat::Ssv => Some(" "),
            CollectionFormat::Tsv => Some("\t"),
            CollectionFormat::Pipes => Some("|"),
            CollectionFormat::Multi => None,
        }
    }
}

impl FromStr for CollectionFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(CollectionFormat::Csv),
            "ssv" => Ok(CollectionFormat::Ssv),
            "tsv" => Ok(CollectionFormat::Tsv),
            "pipes" => Ok(CollectionFormat::Pipes),
            "multi" => Ok(CollectionFormat::Multi),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for CollectionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectionFormat::Csv => "csv",
            CollectionFormat::Ssv => "ssv",
            CollectionFormat::Tsv => "tsv",
            CollectionFormat::Pipes => "pipes",
            CollectionFormat::Multi => "multi",
        };
        f.write_str(name)
    }
}

/// A query parameter value: either a single string or a list that the
/// transport emits as repeated parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multi(values)
    }
}

/// Formats `values` according to `format`.
///
/// `Multi` returns the values unchanged; the caller emits one parameter per value.
///
/// # Examples
///
/// ```
/// use apiclient::{build_collection_param, CollectionFormat, ParamValue};
///
/// let values = ["aa", "bb", "cc"];
/// assert_eq!(
///     build_collection_param(&values, CollectionFormat::Pipes),
///     ParamValue::Single("aa|bb|cc".to_string())
/// );
/// ```
pub fn build_collection_param<S: AsRef<str>>(values: &[S], format: CollectionFormat) -> ParamValue {
    match format.separator() {
        Some(sep) => ParamValue::Single(
            values
                .iter()
                .map(|v| v.as_ref())
                .collect::<Vec<&str>>()
                .join(sep),
        ),
        None => ParamValue::Multi(values.iter().map(|v| v.as_ref().to_string()).collect()),
    }
}

/// Like [`build_collection_param`], with the format given by name as it
/// appears in an API definition.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for a name other than `csv`, `ssv`,
/// `tsv`, `pipes` or `multi`.
pub fn build_collection_param_named<S: AsRef<str>>(values: &[S], format: &str) -> Result<ParamValue> {
    let format: CollectionFormat = format.parse()?;
    Ok(build_collection_param(values, format))
}
