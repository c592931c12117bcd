//! Error types for the client runtime.
//!
//! Every failure surfaces synchronously to the generated endpoint method that
//! made the call. Nothing in this crate retries or swallows an error; the only
//! silent cases (unknown auth scheme names, missing credentials) are policy and
//! never reach this type.

use http::{HeaderMap, StatusCode};

/// The main error type for the client runtime.
///
/// # Examples
///
/// ```no_run
/// use apiclient::{ApiClient, Error, RequestMetadata, TypeDescriptor};
/// use http::Method;
///
/// # async fn example() -> Result<(), Error> {
/// let client = ApiClient::builder().build()?;
/// let metadata = RequestMetadata::new(Method::GET, "/pet/1")
///     .with_return_type("Pet".parse::<TypeDescriptor>()?);
///
/// match client.call_api(metadata).await {
///     Ok(response) => println!("Pet: {:?}", response.data),
///     Err(Error::ParseError { raw_response, serde_error }) => {
///         eprintln!("Malformed JSON ({serde_error}): {raw_response}");
///     }
///     Err(Error::HttpError { status, raw_response, .. }) => {
///         eprintln!("HTTP error {}: {}", status, raw_response);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error reported by the transport.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The transport gave up waiting for the server.
    #[error("Request timed out")]
    Timeout,

    /// The response body was declared as JSON but could not be parsed.
    ///
    /// # Fields
    ///
    /// * `raw_response` - The raw response body as a string
    /// * `serde_error` - The error message from serde
    #[error("Failed to parse JSON response: {serde_error}")]
    ParseError {
        /// The raw response body that failed to parse
        raw_response: String,
        /// The serde error message
        serde_error: String,
    },

    /// The decoded data does not have the shape its type descriptor declares.
    ///
    /// Raised for a `Hash<...>` descriptor applied to an array (or the other
    /// way round), a model applied to a scalar, or an unparsable number or date.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The descriptor the data was converted to
        expected: String,
        /// A short description of what was actually found
        found: String,
    },

    /// A model type name was not present in the model registry.
    #[error("Unknown model type: {0}")]
    UnknownModel(String),

    /// A type descriptor string does not follow the descriptor grammar.
    #[error("Invalid type descriptor: {0}")]
    InvalidTypeDescriptor(String),

    /// An unknown collection format name was requested.
    #[error("Unsupported collection format: {0}")]
    UnsupportedFormat(String),

    /// The server returned a non-2xx HTTP status code.
    ///
    /// # Fields
    ///
    /// * `status` - The HTTP status code
    /// * `raw_response` - The raw response body
    /// * `headers` - The response headers
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
    },

    /// Invalid configuration was provided.
    ///
    /// This indicates a problem with how the client or request was configured,
    /// such as an invalid header name or value.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Failed to serialize the request body.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// An invalid URL was produced from the configuration and request path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    pub(crate) fn type_mismatch(expected: impl ToString, found: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.into(),
        }
    }

    /// Returns the HTTP status code if this error has one.
    ///
    /// Returns `Some(status)` for `HttpError`, `None` for other error types.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    ///
    /// Returns `Some(&str)` for errors that include response bodies,
    /// `None` for other error types.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::ParseError { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for the client runtime.
///
/// This is a convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
