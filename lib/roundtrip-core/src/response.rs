//! HTTP response handling.
//!
//! The transport hands back a [`RawResponse`] whose body is still a stream.
//! The stream is consumed exactly once by [`RawResponse::collect`], which
//! yields a buffered [`Response`]. Dropping a `RawResponse` closes its body.
//!
//! # Example
//!
//! ```ignore
//! let response = raw.collect().await?;
//! let user: User = response.json()?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::{StreamExt, future, stream};

use crate::request::find_header;

/// A streaming body: chunks of bytes arriving over time.
pub type ResponseBody = Pin<Box<dyn Stream<Item = crate::Result<Bytes>> + Send>>;

fn content_length_of(headers: &HashMap<String, String>) -> Option<u64> {
    find_header(headers, "Content-Length").and_then(|value| value.trim().parse().ok())
}

// ============================================================================
// Raw Response
// ============================================================================

/// Transport-level response: status, headers and an unread body stream.
pub struct RawResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: ResponseBody,
}

impl RawResponse {
    /// Creates a new raw response.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Creates a raw response whose body is a single in-memory chunk.
    #[must_use]
    pub fn from_bytes(status: u16, headers: HashMap<String, String>, body: impl Into<Bytes>) -> Self {
        let chunk = body.into();
        Self::new(status, headers, Box::pin(stream::once(future::ready(Ok(chunk)))))
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Declared `Content-Length`, if the header is present and numeric.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        content_length_of(&self.headers)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status and headers as a buffered response with an empty body.
    ///
    /// The body stream is left untouched.
    #[must_use]
    pub fn head(&self) -> Response<Bytes> {
        Response::new(self.status, self.headers.clone(), Bytes::new())
    }

    /// Consume into the streaming body.
    #[must_use]
    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// Read the whole body into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if reading any chunk fails.
    pub async fn collect(self) -> crate::Result<Response<Bytes>> {
        let mut body = self.body;
        let mut collected = Vec::new();

        while let Some(chunk) = body.next().await {
            collected.extend_from_slice(&chunk?);
        }

        Ok(Response::new(
            self.status,
            self.headers,
            Bytes::from(collected),
        ))
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Buffered Response
// ============================================================================

/// HTTP response with status, headers, and body.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    status: u16,
    headers: HashMap<String, String>,
    body: B,
}

impl<B> Response<B> {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: B) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Declared `Content-Length`, if the header is present and numeric.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        content_length_of(&self.headers)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> B {
        self.body
    }

    /// Consume into (status, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (u16, HashMap<String, String>, B) {
        (self.status, self.headers, self.body)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }
}

impl Response<Bytes> {
    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        crate::from_json(&self.body)
    }

    /// Get the response body as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}
