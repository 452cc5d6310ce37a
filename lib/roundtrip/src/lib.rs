//! Base layer for typed JSON HTTP API clients.
//!
//! Build a logical call with [`ApiRequest`], run it through an [`ApiClient`]
//! and get either the decoded value or a typed [`Error`]. Every round-trip
//! goes through the client's interceptors, reads the body once, decodes it
//! into the caller's type and a secondary status envelope, and classifies
//! the outcome.
//!
//! # Example
//!
//! ```ignore
//! use roundtrip::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! let mut client = ApiClient::new(HyperClient::new(), "https://api.example.com")?;
//! client.add_response_interceptor(ContentTypeCheck::json());
//!
//! let reply = client
//!     .call::<_, User>(ApiRequest::get("/users/{id}").path_param("id", 42))
//!     .await?;
//! ```
//!
//! Errors raised after the body was read carry the buffered response:
//!
//! ```ignore
//! match client.call::<_, User>(ApiRequest::get("/users/0")).await {
//!     Err(Error::ErrorResponse { message, response }) => {
//!         eprintln!("{} says: {message}", response.status());
//!     }
//!     other => { /* ... */ }
//! }
//! ```

mod api_client;
mod api_request;
mod client;
mod config;
mod dump;
pub mod interceptor;
pub mod middleware;
pub mod prelude;

pub use api_client::{ApiClient, ApiClientBuilder, Reply};
pub use api_request::ApiRequest;
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{
    ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT, TransportConfig, TransportConfigBuilder,
};
pub use dump::DUMP_TARGET;

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use roundtrip_core::{
    BoxError, Classifier, Endpoint, Error, ErrorResponse, HttpClient, Method, NonSuccessPolicy,
    PathParams, RawResponse, Request, RequestBuilder, Response, Result, StatusCode, StatusEnvelope,
    from_json, to_json,
};
pub use url;
