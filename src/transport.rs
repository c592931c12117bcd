//! The HTTP transport seam.
//!
//! The facade hands a fully assembled [`TransportRequest`] to a [`Transport`]
//! and gets an [`HttpResponse`] back. [`ReqwestTransport`] is the default;
//! tests and embedders can supply their own implementation.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use crate::collection::ParamValue;
use crate::{Error, Result};

/// A request body as the transport should encode it.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` fields.
    Form(Vec<(String, String)>),
    /// `multipart/form-data` text fields.
    Multipart(Vec<(String, String)>),
}

/// A fully assembled request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    /// Base URL plus endpoint path, without the query string.
    pub url: Url,
    pub headers: HeaderMap,
    pub query: BTreeMap<String, ParamValue>,
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    /// Returns the URL with the query parameters appended.
    ///
    /// `ParamValue::Multi` values become one `key=value` pair per element.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if self.query.is_empty() {
            return url;
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                match value {
                    ParamValue::Single(v) => {
                        pairs.append_pair(key, v);
                    }
                    ParamValue::Multi(values) => {
                        for v in values {
                            pairs.append_pair(key, v);
                        }
                    }
                }
            }
        }
        url
    }
}

/// A response as returned by the transport: status, headers and the raw body.
///
/// The body is kept as received, with no charset decoding.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    /// Creates a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns the `Content-Type` header, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }

    /// The body as UTF-8 text; invalid sequences become U+FFFD.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Executes assembled requests.
///
/// Implementations own all I/O concerns: connection reuse, TLS, timeouts.
/// Failures are reported as-is; the facade does not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns a transport-level error ([`Error::Network`], [`Error::Timeout`])
    /// when no response was received.
    async fn execute(&self, request: TransportRequest) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self { client })
    }

    /// Wraps an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<HttpResponse> {
        let url = request.full_url();

        tracing::debug!(
            method = %request.method,
            url = %url,
            "Executing HTTP request"
        );

        let mut headers = request.headers;
        if matches!(request.body, Some(RequestBody::Multipart(_))) {
            // reqwest sets the content type with the generated boundary.
            headers.remove(http::header::CONTENT_TYPE);
        }

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(headers);

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match &request.body {
            Some(RequestBody::Json(json)) => builder.json(json),
            Some(RequestBody::Form(fields)) => builder.form(fields),
            Some(RequestBody::Multipart(fields)) => {
                let form = fields
                    .iter()
                    .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                        form.text(name.clone(), value.clone())
                    });
                builder.multipart(form)
            }
            None => builder,
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Network(e)
    }
}
