//! The transport boundary.
//!
//! The execution engine never opens sockets itself: it submits a
//! materialized [`Request`] to an [`HttpClient`] and gets a [`RawResponse`]
//! back. Implement this trait to plug in another HTTP stack or a test double.

use std::future::Future;

use bytes::Bytes;

use crate::{RawResponse, Request, Result};

/// Core HTTP transport trait.
///
/// # Example
///
/// ```ignore
/// use roundtrip_core::{HttpClient, RawResponse, Request, Result};
///
/// #[derive(Clone)]
/// struct Canned;
///
/// impl HttpClient for Canned {
///     async fn execute(&self, _request: Request) -> Result<RawResponse> {
///         Ok(RawResponse::from_bytes(200, Default::default(), r#"{"ok":true}"#))
///     }
/// }
/// ```
pub trait HttpClient: Send + Sync {
    /// Submit a request and return the response with its body unread.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails before a response arrives:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<RawResponse>> + Send;
}
