//! The API client facade used by generated endpoint methods.
//!
//! [`ApiClient`] composes the runtime: it resolves the request URL from the
//! [`Configuration`], injects credentials, hands the request to the
//! [`Transport`] and deserializes the response with the endpoint's declared
//! return type. Use [`ApiClientBuilder`] to configure and create clients.

use http::{header::CONTENT_TYPE, HeaderMap};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

use crate::auth::{self, AuthRegistry};
use crate::collection::ParamValue;
use crate::configuration::{collapse_slashes, Configuration};
use crate::descriptor::TypeDescriptor;
use crate::deserializer::Deserializer;
use crate::metadata::RequestMetadata;
use crate::model::{ModelDefinition, ModelRegistry};
use crate::transport::{HttpResponse, ReqwestTransport, RequestBody, Transport, TransportRequest};
use crate::{Error, Response, Result, Value};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Request-execution facade for generated endpoint methods.
///
/// The client is cheap to clone and designed to be shared. Its configuration
/// is fixed at build time, so concurrent calls never observe a half-applied
/// change; build a new client to use different settings.
///
/// # Examples
///
/// ```no_run
/// use apiclient::{ApiClient, Configuration, RequestMetadata, TypeDescriptor};
/// use http::Method;
///
/// # async fn example() -> Result<(), apiclient::Error> {
/// let client = ApiClient::builder()
///     .configuration(
///         Configuration::builder()
///             .host("https://petstore.swagger.io")
///             .api_key("api_key", "special-key")
///             .build(),
///     )
///     .build()?;
///
/// let metadata = RequestMetadata::new(Method::GET, "/store/inventory")
///     .with_auth_names(["api_key"])
///     .with_return_type("Hash<String, Integer>".parse::<TypeDescriptor>()?);
///
/// let inventory = client.call_api(metadata).await?;
/// println!("Inventory: {:?}", inventory.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: Configuration,
    auth: AuthRegistry,
    models: ModelRegistry,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    /// Creates a new `ApiClientBuilder` for configuring a client.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Returns the configuration this client was built with.
    pub fn configuration(&self) -> &Configuration {
        &self.inner.config
    }

    /// Returns the registry used to build response models.
    pub fn models(&self) -> &ModelRegistry {
        &self.inner.models
    }

    /// Executes one API call.
    ///
    /// Builds the request (see [`build_request`](Self::build_request)), sends it
    /// through the transport, and deserializes a 2xx response with the declared
    /// return type. Without a return type the data is `Value::Null`.
    ///
    /// # Errors
    ///
    /// - Any error from [`build_request`](Self::build_request)
    /// - Transport errors, unchanged
    /// - [`Error::HttpError`] for a non-2xx status
    /// - Deserialization errors (see [`Deserializer::deserialize`])
    pub async fn call_api(&self, metadata: RequestMetadata) -> Result<Response<Value>> {
        let method = metadata.method.clone();
        let path = metadata.path.clone();
        let return_type = metadata.return_type.clone();

        let request = self.build_request(metadata)?;
        let start_time = Instant::now();

        let response = self.inner.transport.execute(request).await.map_err(|e| {
            tracing::warn!(
                error = %e,
                method = %method,
                path = %path,
                "Request failed"
            );
            e
        })?;

        let latency = start_time.elapsed();
        let status = response.status;

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "Received HTTP response"
        );

        if !status.is_success() {
            let raw_response = response.text().into_owned();
            if status.is_client_error() {
                tracing::error!(
                    status = status.as_u16(),
                    response = %raw_response,
                    "Client error (4xx)"
                );
            } else if status.is_server_error() {
                tracing::warn!(
                    status = status.as_u16(),
                    response = %raw_response,
                    "Server error (5xx)"
                );
            }

            return Err(Error::HttpError {
                status,
                raw_response,
                headers: response.headers,
            });
        }

        let data = match &return_type {
            Some(descriptor) => self.deserialize(&response, descriptor)?,
            None => Value::Null,
        };

        Ok(Response::new(
            data,
            response.text().into_owned(),
            status,
            response.headers,
            latency,
        ))
    }

    /// Assembles the transport request for `metadata`.
    ///
    /// Headers are the configured defaults overlaid with the request's own;
    /// credentials for the declared auth schemes are then added. A form content
    /// type sends the form parameters, anything else the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL does not parse, or
    /// [`Error::ConfigurationError`] if a credential is not a valid header value.
    pub fn build_request(&self, metadata: RequestMetadata) -> Result<TransportRequest> {
        let url = self.build_request_url(&metadata.resolved_path())?;

        let mut headers = self.inner.config.default_headers().clone();
        for (name, value) in &metadata.headers {
            headers.insert(name.clone(), value.clone());
        }

        let mut query = metadata.query_params;
        self.update_params_for_auth(&mut headers, &mut query, &metadata.auth_names)?;

        let body = match form_kind(&headers) {
            Some(FormKind::UrlEncoded) => Some(RequestBody::Form(metadata.form_params)),
            Some(FormKind::Multipart) => Some(RequestBody::Multipart(metadata.form_params)),
            None => metadata.body.map(RequestBody::Json),
        };

        Ok(TransportRequest {
            method: metadata.method,
            url,
            headers,
            query,
            body,
            timeout: self.inner.config.timeout(),
        })
    }

    /// Joins the configured base URL and an endpoint path, collapsing
    /// duplicate slashes in the path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the result is not a valid URL.
    pub fn build_request_url(&self, path: &str) -> Result<Url> {
        let path = collapse_slashes(&format!("/{}", path));
        Ok(Url::parse(&format!("{}{}", self.inner.config.base_url(), path))?)
    }

    /// Adds credentials for `auth_names` using this client's configuration and
    /// auth registry. See [`auth::update_params_for_auth`].
    ///
    /// # Errors
    ///
    /// See [`auth::update_params_for_auth`].
    pub fn update_params_for_auth<S: AsRef<str>>(
        &self,
        header_params: &mut HeaderMap,
        query_params: &mut BTreeMap<String, ParamValue>,
        auth_names: &[S],
    ) -> Result<()> {
        auth::update_params_for_auth(
            &self.inner.config,
            &self.inner.auth,
            header_params,
            query_params,
            auth_names,
        )
    }

    /// Deserializes a response with this client's model registry.
    ///
    /// # Errors
    ///
    /// See [`Deserializer::deserialize`].
    pub fn deserialize(&self, response: &HttpResponse, descriptor: &TypeDescriptor) -> Result<Value> {
        Deserializer::new(&self.inner.models).deserialize(response, descriptor)
    }
}

enum FormKind {
    UrlEncoded,
    Multipart,
}

fn form_kind(headers: &HeaderMap) -> Option<FormKind> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let media_type = content_type.split(';').next().unwrap_or_default().trim();
    if media_type.eq_ignore_ascii_case(FORM_URLENCODED) {
        Some(FormKind::UrlEncoded)
    } else if media_type.eq_ignore_ascii_case(MULTIPART_FORM_DATA) {
        Some(FormKind::Multipart)
    } else {
        None
    }
}

/// Builder for configuring and creating an [`ApiClient`].
///
/// # Examples
///
/// ```no_run
/// use apiclient::{ApiClientBuilder, AuthRegistry, AuthScheme, Configuration};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), apiclient::Error> {
/// let client = ApiClientBuilder::new()
///     .configuration(
///         Configuration::builder()
///             .host("api.example.com")
///             .base_path(Some("v1"))
///             .timeout(Duration::from_secs(30))
///             .build(),
///     )
///     .auth_registry(AuthRegistry::new().with("key", AuthScheme::query_key("api_key")))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ApiClientBuilder {
    config: Configuration,
    auth: AuthRegistry,
    models: ModelRegistry,
    transport: Option<Arc<dyn Transport>>,
}

impl ApiClientBuilder {
    /// Creates a builder with the default configuration, the petstore auth
    /// schemes and an empty model registry.
    pub fn new() -> Self {
        Self {
            config: Configuration::default(),
            auth: AuthRegistry::petstore(),
            models: ModelRegistry::new(),
            transport: None,
        }
    }

    /// Sets the configuration (host, base path, credentials, headers, timeout).
    pub fn configuration(mut self, config: Configuration) -> Self {
        self.config = config;
        self
    }

    /// Replaces the auth scheme table.
    pub fn auth_registry(mut self, registry: AuthRegistry) -> Self {
        self.auth = registry;
        self
    }

    /// Replaces the model registry.
    pub fn model_registry(mut self, registry: ModelRegistry) -> Self {
        self.models = registry;
        self
    }

    /// Registers a model type with the client's registry.
    ///
    /// # Errors
    ///
    /// See [`ModelRegistry::register`].
    pub fn register_model<M: ModelDefinition>(mut self) -> Result<Self> {
        self.models.register::<M>()?;
        Ok(self)
    }

    /// Replaces the default `reqwest` transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Builds the configured `ApiClient`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the configuration does not produce a
    /// valid base URL, or [`Error::ConfigurationError`] if the default
    /// transport cannot be created.
    pub fn build(self) -> Result<ApiClient> {
        Url::parse(&self.config.base_url())?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                config: self.config,
                auth: self.auth,
                models: self.models,
                transport,
            }),
        })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
