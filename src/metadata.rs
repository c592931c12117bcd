//! Request metadata filled in by generated endpoint methods.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::collection::ParamValue;
use crate::descriptor::TypeDescriptor;
use crate::Error;

/// Everything an endpoint method knows about one call.
///
/// This type contains all the information needed to make a single API call:
/// method and path, parameters, body, declared auth schemes and the declared
/// return type.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// The endpoint path relative to the base path, e.g. `/pet/{petId}`.
    pub path: String,

    /// Values for `{name}` placeholders in `path`.
    pub path_params: BTreeMap<String, String>,

    /// Headers for this request.
    pub headers: HeaderMap,

    /// Query parameters for this request.
    pub query_params: BTreeMap<String, ParamValue>,

    /// Form fields, sent when the content type is a form type.
    pub form_params: Vec<(String, String)>,

    /// JSON body.
    pub body: Option<serde_json::Value>,

    /// Auth scheme names the endpoint accepts.
    pub auth_names: Vec<String>,

    /// Declared response type; `None` for endpoints that return nothing.
    pub return_type: Option<TypeDescriptor>,
}

impl RequestMetadata {
    /// Creates a new `RequestMetadata` with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            path_params: BTreeMap::new(),
            headers: HeaderMap::new(),
            query_params: BTreeMap::new(),
            form_params: Vec::new(),
            body: None,
            auth_names: Vec::new(),
            return_type: None,
        }
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, Error> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets the `Accept` header, if `accept` is `Some`.
    ///
    /// Pairs with [`select_header_accept`](crate::select_header_accept).
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid header value.
    pub fn with_accept(self, accept: Option<String>) -> Result<Self, Error> {
        match accept {
            Some(accept) => self.with_header(http::header::ACCEPT.as_str(), accept),
            None => Ok(self),
        }
    }

    /// Sets the `Content-Type` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid header value.
    pub fn with_content_type(self, content_type: impl AsRef<str>) -> Result<Self, Error> {
        self.with_header(http::header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the value of a `{name}` path placeholder.
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.path_params.insert(name.into(), value.to_string());
        self
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Adds multiple query parameters to the request.
    pub fn with_query_params(
        mut self,
        params: impl IntoIterator<Item = (String, ParamValue)>,
    ) -> Self {
        self.query_params.extend(params);
        self
    }

    /// Adds a form field.
    pub fn with_form_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_params.push((key.into(), value.into()));
        self
    }

    /// Sets the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if `body` cannot be serialized.
    pub fn with_body<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, Error> {
        let json =
            serde_json::to_value(body).map_err(|e| Error::SerializationFailed(e.to_string()))?;
        self.body = Some(json);
        Ok(self)
    }

    /// Declares the auth schemes the endpoint accepts.
    pub fn with_auth_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.auth_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Declares the response type.
    pub fn with_return_type(mut self, return_type: TypeDescriptor) -> Self {
        self.return_type = Some(return_type);
        self
    }

    /// Returns `path` with placeholders replaced by their percent-encoded values.
    ///
    /// Placeholders without a value are left as they are.
    pub fn resolved_path(&self) -> String {
        let mut path = self.path.clone();
        for (name, value) in &self.path_params {
            path = path.replace(&format!("{{{}}}", name), &urlencoding::encode(value));
        }
        path
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new(Method::GET, "")
    }
}
