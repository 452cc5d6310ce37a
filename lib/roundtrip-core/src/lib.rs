//! Core types for the roundtrip HTTP API client base layer.
//!
//! This crate provides the building blocks used by `roundtrip`:
//! - [`Method`] - HTTP method enum
//! - [`Request`] and [`RequestBuilder`] - materialized requests
//! - [`RawResponse`] and [`Response`] - streaming and buffered responses
//! - [`Error`] and [`Result`] - the round-trip error taxonomy
//! - [`HttpClient`] - transport trait
//! - [`Endpoint`] - base URL and relative path resolution
//! - [`PathTemplate`] and [`PathParams`] - `{name}` path substitution
//! - [`StatusEnvelope`] and [`ErrorResponse`] - secondary decode targets
//! - [`Classifier`] - the ordered response classification rules
//! - [`StatusCode`] - HTTP status codes (re-exported from `http` crate)

mod body;
pub mod classify;
mod client;
mod endpoint;
mod envelope;
mod error;
mod method;
mod path_template;
pub mod prelude;
mod request;
mod response;

pub use body::{APPLICATION_JSON, decode_envelope, decode_target, from_json, to_json};
pub use classify::{Classifier, Exchange, NonSuccessPolicy, Rejection, Verdict};
pub use client::HttpClient;
pub use endpoint::{Endpoint, join_paths};
pub use envelope::{ErrorResponse, StatusEnvelope};
pub use error::{BoxError, Error, Result};
pub use method::Method;
pub use path_template::{PathParams, PathTemplate};
pub use request::{Request, RequestBuilder};
pub use response::{RawResponse, Response, ResponseBody};

// Re-export http crate types for status codes
pub use http::StatusCode;
