//! # apiclient - runtime for generated REST API clients
//!
//! Generated endpoint methods are thin: they describe a call with a
//! [`RequestMetadata`] and hand it to an [`ApiClient`]. This crate does the rest:
//! it resolves the URL from the [`Configuration`], injects credentials for the
//! declared auth schemes, negotiates content types, sends the request through a
//! [`Transport`] and deserializes the response into the declared
//! [`TypeDescriptor`], building registered models along the way.
//!
//! ## Quick Start
//!
//! ```no_run
//! use apiclient::{
//!     select_header_accept, ApiClient, Configuration, RequestMetadata, TypeDescriptor,
//! };
//! use http::Method;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), apiclient::Error> {
//!     let client = ApiClient::builder()
//!         .configuration(
//!             Configuration::builder()
//!                 .host("https://petstore.swagger.io")
//!                 .base_path(Some("v2"))
//!                 .api_key("api_key", "special-key")
//!                 .build(),
//!         )
//!         .build()?;
//!
//!     let metadata = RequestMetadata::new(Method::GET, "/store/inventory")
//!         .with_accept(select_header_accept(Some(&["application/json"])))?
//!         .with_auth_names(["api_key"])
//!         .with_return_type("Hash<String, Integer>".parse::<TypeDescriptor>()?);
//!
//!     let response = client.call_api(metadata).await?;
//!     for (status, count) in response.data.as_map().into_iter().flat_map(|m| m.iter()) {
//!         println!("{}: {:?}", status, count.as_i64());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Models
//!
//! Generated models implement [`ModelDefinition`] (a static field table plus a
//! typed getter and setter) and are registered with the client. The
//! deserializer builds them from JSON objects field by field: unknown keys are
//! ignored and missing keys keep the model's default. [`object_to_hash`] goes
//! the other way, projecting an instance into an ordered map without its unset
//! fields.
//!
//! ## Logging
//!
//! Requests and responses are logged with `tracing`; install a subscriber to
//! see them.

pub mod auth;
mod client;
pub mod collection;
mod configuration;
pub mod descriptor;
mod deserializer;
mod error;
pub mod metadata;
pub mod model;
mod negotiation;
mod projection;
mod response;
pub mod transport;
mod value;

pub use auth::{update_params_for_auth, AuthRegistry, AuthScheme};
pub use client::{ApiClient, ApiClientBuilder};
pub use collection::{build_collection_param, build_collection_param_named, CollectionFormat, ParamValue};
pub use configuration::{Configuration, ConfigurationBuilder};
pub use descriptor::{Primitive, TypeDescriptor};
pub use deserializer::Deserializer;
pub use error::{Error, Result};
pub use metadata::RequestMetadata;
pub use model::{FieldSpec, Model, ModelDefinition, ModelRegistry};
pub use negotiation::{is_json_mime, select_header_accept, select_header_content_type};
pub use projection::object_to_hash;
pub use response::Response;
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportRequest};
pub use value::{FromValue, Value, ValueMap};
