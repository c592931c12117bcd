//! Client configuration: where requests go and which credentials they carry.
//!
//! A [`Configuration`] is built once and handed to the [`ApiClient`](crate::ApiClient),
//! which owns it for its whole lifetime. Host and base path setters never fail;
//! they coerce their input into the normalized form described on each method.

use base64::{engine::general_purpose::STANDARD, Engine};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::time::Duration;

use crate::{Error, Result};

const DEFAULT_SCHEME: &str = "http";
const DEFAULT_HOST: &str = "petstore.swagger.io";
const DEFAULT_BASE_PATH: &str = "/v2";

/// Settings shared by every request a client makes.
#[derive(Debug, Clone)]
pub struct Configuration {
    scheme: String,
    host: String,
    base_path: String,
    api_key: HashMap<String, String>,
    api_key_prefix: HashMap<String, String>,
    username: Option<String>,
    password: Option<String>,
    access_token: Option<String>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl Configuration {
    /// Creates a new `ConfigurationBuilder` seeded with the defaults.
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    /// Sets the host, stripping a leading `http://` or `https://` and
    /// everything from the first `/` onward.
    ///
    /// # Examples
    ///
    /// ```
    /// use apiclient::Configuration;
    ///
    /// let mut config = Configuration::default();
    /// config.set_host("https://wookiee.com/v4");
    /// assert_eq!(config.host(), "wookiee.com");
    /// ```
    pub fn set_host(&mut self, raw: impl AsRef<str>) {
        self.host = normalize_host(raw.as_ref());
    }

    /// Sets the base path. `None` clears it to `""`; anything else gets a
    /// leading `/` if it lacks one.
    pub fn set_base_path(&mut self, raw: Option<&str>) {
        self.base_path = normalize_base_path(raw);
    }

    /// The URL scheme, `http` unless configured otherwise.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The normalized host, without scheme or path.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The normalized base path: empty or starting with `/`.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Headers sent with every request, before request-specific headers.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Per-request timeout, if one is set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// OAuth2 access token, sent as a bearer token.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Returns `scheme://host/base_path` with duplicate slashes collapsed and
    /// no trailing slash.
    ///
    /// # Examples
    ///
    /// ```
    /// use apiclient::Configuration;
    ///
    /// let config = Configuration::default();
    /// assert_eq!(config.base_url(), "http://petstore.swagger.io/v2");
    /// ```
    pub fn base_url(&self) -> String {
        let joined = collapse_slashes(&format!("{}/{}", self.host, self.base_path));
        format!("{}://{}", self.scheme, joined.trim_end_matches('/'))
    }

    /// Returns the credential configured for an auth scheme, with its prefix
    /// (`"{prefix} {key}"`) when one is set.
    ///
    /// Returns `None` when no key is configured for the scheme.
    pub fn api_key_with_prefix(&self, name: &str) -> Option<String> {
        let key = self.api_key.get(name)?;
        match self.api_key_prefix.get(name) {
            Some(prefix) => Some(format!("{} {}", prefix, key)),
            None => Some(key.clone()),
        }
    }

    /// Returns the `Authorization` header value for HTTP basic auth.
    ///
    /// A missing username or password is encoded as an empty string.
    pub fn basic_auth_token(&self) -> String {
        let credentials = format!(
            "{}:{}",
            self.username.as_deref().unwrap_or_default(),
            self.password.as_deref().unwrap_or_default()
        );
        format!("Basic {}", STANDARD.encode(credentials))
    }
}

impl Default for Configuration {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            http::header::USER_AGENT,
            HeaderValue::from_static(concat!("apiclient/", env!("CARGO_PKG_VERSION"))),
        );

        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: DEFAULT_HOST.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            api_key: HashMap::new(),
            api_key_prefix: HashMap::new(),
            username: None,
            password: None,
            access_token: None,
            default_headers,
            timeout: None,
        }
    }
}

/// Builder for a [`Configuration`].
///
/// # Examples
///
/// ```
/// use apiclient::Configuration;
///
/// # fn example() -> Result<(), apiclient::Error> {
/// let config = Configuration::builder()
///     .host("https://api.example.com")
///     .base_path(Some("v1"))
///     .api_key("api_key", "special-key")
///     .api_key_prefix("api_key", "Token")
///     .default_header("X-Trace", "on")?
///     .build();
///
/// assert_eq!(config.base_url(), "http://api.example.com/v1");
/// assert_eq!(
///     config.api_key_with_prefix("api_key").as_deref(),
///     Some("Token special-key")
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    config: Configuration,
}

impl ConfigurationBuilder {
    /// Creates a new `ConfigurationBuilder` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the URL scheme (`http` or `https`).
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.scheme = scheme.into();
        self
    }

    /// Sets the host. See [`Configuration::set_host`].
    pub fn host(mut self, host: impl AsRef<str>) -> Self {
        self.config.set_host(host);
        self
    }

    /// Sets the base path. See [`Configuration::set_base_path`].
    pub fn base_path(mut self, base_path: Option<&str>) -> Self {
        self.config.set_base_path(base_path);
        self
    }

    /// Sets the credential for an API-key auth scheme.
    pub fn api_key(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.config.api_key.insert(name.into(), key.into());
        self
    }

    /// Sets the header-value prefix (e.g. `Bearer`) for an API-key auth scheme.
    pub fn api_key_prefix(mut self, name: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.config.api_key_prefix.insert(name.into(), prefix.into());
        self
    }

    /// Sets the HTTP basic auth username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    /// Sets the HTTP basic auth password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Sets the OAuth2 access token sent as `Authorization: Bearer ...`.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = Some(token.into());
        self
    }

    /// Adds a header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.config.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the request timeout handed to the transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> Configuration {
        self.config
    }
}

fn normalize_host(raw: &str) -> String {
    let without_scheme = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw);
    match without_scheme.find('/') {
        Some(idx) => without_scheme[..idx].to_string(),
        None => without_scheme.to_string(),
    }
}

fn normalize_base_path(raw: Option<&str>) -> String {
    match raw {
        None => String::new(),
        Some(path) if path.starts_with('/') => path.to_string(),
        Some(path) => format!("/{}", path),
    }
}

pub(crate) fn collapse_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}
