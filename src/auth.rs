//! Authentication: injecting credentials into outgoing parameters.
//!
//! Each endpoint declares the names of the auth schemes it accepts. Those names
//! are looked up in an [`AuthRegistry`] and resolved against the
//! [`Configuration`]'s credentials at call time. Unknown names and schemes with
//! no configured credential are skipped silently, so endpoints can list every
//! scheme they support.

use http::{header::AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use std::collections::{BTreeMap, HashMap};

use crate::collection::ParamValue;
use crate::configuration::Configuration;
use crate::{Error, Result};

/// How a scheme's credential is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// API key in the named request header.
    HeaderKey { param_name: String },
    /// API key in the named query parameter.
    QueryKey { param_name: String },
    /// HTTP basic auth from the configured username and password.
    Basic,
    /// OAuth2 bearer token from the configured access token.
    OAuth2,
}

impl AuthScheme {
    /// An API key sent in the header `param_name`.
    pub fn header_key(param_name: impl Into<String>) -> Self {
        AuthScheme::HeaderKey {
            param_name: param_name.into(),
        }
    }

    /// An API key sent in the query parameter `param_name`.
    pub fn query_key(param_name: impl Into<String>) -> Self {
        AuthScheme::QueryKey {
            param_name: param_name.into(),
        }
    }
}

/// Static table of scheme name to [`AuthScheme`].
#[derive(Debug, Clone, Default)]
pub struct AuthRegistry {
    schemes: HashMap<String, AuthScheme>,
}

impl AuthRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The schemes declared by the petstore API: `api_key` (header `api_key`)
    /// and `petstore_auth` (OAuth2).
    pub fn petstore() -> Self {
        Self::new()
            .with("api_key", AuthScheme::header_key("api_key"))
            .with("petstore_auth", AuthScheme::OAuth2)
    }

    /// Adds or replaces the scheme registered under `name`.
    pub fn with(mut self, name: impl Into<String>, scheme: AuthScheme) -> Self {
        self.schemes.insert(name.into(), scheme);
        self
    }

    /// Looks up a scheme by name.
    pub fn get(&self, name: &str) -> Option<&AuthScheme> {
        self.schemes.get(name)
    }
}

/// Adds credentials for `auth_names` to the header and query parameters.
///
/// Nothing is written unless every scheme resolves, so on error both maps are
/// left as they were.
///
/// # Errors
///
/// Returns [`Error::ConfigurationError`] if a credential is not a valid header
/// value (or a header-key scheme names an invalid header).
///
/// # Examples
///
/// ```
/// use apiclient::{update_params_for_auth, AuthRegistry, Configuration};
/// use http::HeaderMap;
/// use std::collections::BTreeMap;
///
/// # fn main() -> Result<(), apiclient::Error> {
/// let config = Configuration::builder()
///     .api_key("api_key", "special-key")
///     .api_key_prefix("api_key", "PREFIX")
///     .build();
///
/// let mut headers = HeaderMap::new();
/// let mut query = BTreeMap::new();
/// update_params_for_auth(
///     &config,
///     &AuthRegistry::petstore(),
///     &mut headers,
///     &mut query,
///     &["api_key", "unknown"],
/// )?;
///
/// assert_eq!(headers.get("api_key").unwrap(), "PREFIX special-key");
/// assert!(query.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn update_params_for_auth<S: AsRef<str>>(
    config: &Configuration,
    registry: &AuthRegistry,
    header_params: &mut HeaderMap,
    query_params: &mut BTreeMap<String, ParamValue>,
    auth_names: &[S],
) -> Result<()> {
    let mut headers: Vec<(HeaderName, HeaderValue)> = Vec::new();
    let mut query: Vec<(String, ParamValue)> = Vec::new();

    for name in auth_names {
        let name = name.as_ref();
        let Some(scheme) = registry.get(name) else {
            tracing::debug!(auth = name, "Skipping unknown auth scheme");
            continue;
        };

        match scheme {
            AuthScheme::HeaderKey { param_name } => {
                if let Some(value) = config.api_key_with_prefix(name) {
                    headers.push((header_name(param_name)?, header_value(&value)?));
                }
            }
            AuthScheme::QueryKey { param_name } => {
                if let Some(value) = config.api_key_with_prefix(name) {
                    query.push((param_name.clone(), ParamValue::Single(value)));
                }
            }
            AuthScheme::Basic => {
                headers.push((AUTHORIZATION, header_value(&config.basic_auth_token())?));
            }
            AuthScheme::OAuth2 => {
                if let Some(token) = config.access_token() {
                    headers.push((AUTHORIZATION, header_value(&format!("Bearer {}", token))?));
                }
            }
        }
    }

    for (name, value) in headers {
        header_params.insert(name, value);
    }
    query_params.extend(query);
    Ok(())
}

fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::try_from(name)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::try_from(value)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
    value.set_sensitive(true);
    Ok(value)
}
