//! Prelude module for convenient imports.
//!
//! ```ignore
//! use roundtrip::prelude::*;
//! ```

pub use crate::interceptor::{ContentTypeCheck, RequestInterceptor, ResponseInterceptor};
pub use crate::{
    ApiClient, ApiRequest, Endpoint, Error, HttpClient, HyperClient, PathParams, Reply, Result,
};
pub use serde::{Deserialize, Serialize};
