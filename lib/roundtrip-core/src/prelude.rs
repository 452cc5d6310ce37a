//! Prelude module for convenient imports.
//!
//! ```ignore
//! use roundtrip_core::prelude::*;
//! ```

pub use crate::{
    Endpoint, Error, HttpClient, Method, PathParams, RawResponse, Request, RequestBuilder,
    Response, Result, StatusEnvelope, from_json, to_json,
};
