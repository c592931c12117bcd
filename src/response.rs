//! Response wrapper that keeps the deserialized data next to the raw response.

use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// A successful API response.
///
/// `data` holds the value deserialized with the endpoint's declared return type;
/// the remaining fields describe the HTTP exchange.
///
/// # Examples
///
/// ```
/// use apiclient::{Response, Value};
/// use http::{HeaderMap, StatusCode};
/// use std::time::Duration;
///
/// let response = Response::new(
///     Value::Integer(42),
///     "42".to_string(),
///     StatusCode::OK,
///     HeaderMap::new(),
///     Duration::from_millis(100),
/// );
///
/// assert_eq!(response.data.as_i64(), Some(42));
/// assert_eq!(response.raw_body, "42");
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The deserialized response data.
    pub data: T,

    /// The response body as text. `File` data keeps the exact bytes.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from handing the request to the transport until the response arrived.
    pub latency: Duration,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
        }
    }

    /// Maps the response data to a different type using the provided function.
    ///
    /// Endpoint methods use this to turn the dynamic [`Value`](crate::Value)
    /// into their typed return value while keeping the metadata.
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
        }
    }

    /// Like [`map`](Self::map) for fallible conversions.
    ///
    /// # Errors
    ///
    /// Returns whatever error `f` returns.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Response<U>, E>
    where
        F: FnOnce(T) -> Result<U, E>,
    {
        Ok(Response {
            data: f(self.data)?,
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
        })
    }

    /// Returns a reference to a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
