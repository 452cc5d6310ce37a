//! Request and response interceptors.
//!
//! Interceptors are hooks the [`ApiClient`](crate::ApiClient) runs around
//! every round-trip. Request interceptors may edit the outgoing request
//! before it is sent; response interceptors inspect the response before its
//! body is read. Either kind aborts the round-trip by returning an error,
//! which surfaces as [`Error::Interceptor`].
//!
//! Interceptors run in registration order and the first failure wins:
//! later interceptors are not invoked.
//!
//! # Example
//!
//! ```ignore
//! use roundtrip::interceptor::{ContentTypeCheck, request_fn};
//!
//! client.add_request_interceptor(request_fn(|_ctx, request, _target| {
//!     request.set_header("X-Request-Id", "42");
//!     Ok(())
//! }));
//! client.add_response_interceptor(ContentTypeCheck::json());
//! ```

mod bearer_auth;
mod content_type;
mod default_header;

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use roundtrip_core::{BoxError, Endpoint, Error, RawResponse, Request, Result};
use tracing::debug;

use crate::ClientConfig;

pub use bearer_auth::BearerAuth;
pub use content_type::{ContentTypeCheck, ContentTypeMismatch};
pub use default_header::DefaultHeader;

/// What the caller wants the response body decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The body is returned undecoded.
    Raw,
    /// The body is decoded into the named type.
    Typed(&'static str),
}

impl Target {
    /// Target for decoding into `T`.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self::Typed(std::any::type_name::<T>())
    }

    /// Name of the decode target type, if any.
    #[must_use]
    pub const fn type_name(&self) -> Option<&'static str> {
        match self {
            Self::Raw => None,
            Self::Typed(name) => Some(name),
        }
    }
}

/// Read-only view of the client, handed to interceptors.
#[derive(Debug, Clone, Copy)]
pub struct ClientContext<'a> {
    endpoint: &'a Endpoint,
    config: &'a ClientConfig,
}

impl<'a> ClientContext<'a> {
    pub(crate) const fn new(endpoint: &'a Endpoint, config: &'a ClientConfig) -> Self {
        Self { endpoint, config }
    }

    /// Base endpoint of the client.
    #[must_use]
    pub const fn endpoint(&self) -> &'a Endpoint {
        self.endpoint
    }

    /// Client configuration.
    #[must_use]
    pub const fn config(&self) -> &'a ClientConfig {
        self.config
    }
}

/// Hook run on every outgoing request, before it reaches the transport.
pub trait RequestInterceptor: Send + Sync + 'static {
    /// Inspect or modify `request`. Returning an error aborts the round-trip.
    fn intercept(
        &self,
        ctx: &ClientContext<'_>,
        request: &mut Request<Bytes>,
        target: Target,
    ) -> std::result::Result<(), BoxError>;
}

/// Hook run on every response, before its body is read.
pub trait ResponseInterceptor: Send + Sync + 'static {
    /// Inspect `response`. Returning an error aborts the round-trip.
    fn intercept(
        &self,
        ctx: &ClientContext<'_>,
        request: &Request<Bytes>,
        response: &RawResponse,
    ) -> std::result::Result<(), BoxError>;
}

/// A [`RequestInterceptor`] built from a closure. See [`request_fn`].
#[derive(Clone, Copy)]
pub struct RequestFn<F>(F);

impl<F> fmt::Debug for RequestFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestFn")
    }
}

/// Turn a closure into a [`RequestInterceptor`].
pub fn request_fn<F>(f: F) -> RequestFn<F>
where
    F: Fn(&ClientContext<'_>, &mut Request<Bytes>, Target) -> std::result::Result<(), BoxError>
        + Send
        + Sync
        + 'static,
{
    RequestFn(f)
}

impl<F> RequestInterceptor for RequestFn<F>
where
    F: Fn(&ClientContext<'_>, &mut Request<Bytes>, Target) -> std::result::Result<(), BoxError>
        + Send
        + Sync
        + 'static,
{
    fn intercept(
        &self,
        ctx: &ClientContext<'_>,
        request: &mut Request<Bytes>,
        target: Target,
    ) -> std::result::Result<(), BoxError> {
        (self.0)(ctx, request, target)
    }
}

/// A [`ResponseInterceptor`] built from a closure. See [`response_fn`].
#[derive(Clone, Copy)]
pub struct ResponseFn<F>(F);

impl<F> fmt::Debug for ResponseFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseFn")
    }
}

/// Turn a closure into a [`ResponseInterceptor`].
pub fn response_fn<F>(f: F) -> ResponseFn<F>
where
    F: Fn(&ClientContext<'_>, &Request<Bytes>, &RawResponse) -> std::result::Result<(), BoxError>
        + Send
        + Sync
        + 'static,
{
    ResponseFn(f)
}

impl<F> ResponseInterceptor for ResponseFn<F>
where
    F: Fn(&ClientContext<'_>, &Request<Bytes>, &RawResponse) -> std::result::Result<(), BoxError>
        + Send
        + Sync
        + 'static,
{
    fn intercept(
        &self,
        ctx: &ClientContext<'_>,
        request: &Request<Bytes>,
        response: &RawResponse,
    ) -> std::result::Result<(), BoxError> {
        (self.0)(ctx, request, response)
    }
}

/// Ordered lists of request and response interceptors.
///
/// The registry is cheap to clone: interceptors are reference counted and
/// shared between clones.
#[derive(Clone, Default)]
pub struct Interceptors {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptors")
            .field("request_count", &self.request.len())
            .field("response_count", &self.response.len())
            .finish()
    }
}

impl Interceptors {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request interceptor.
    pub fn add_request_interceptor(&mut self, interceptor: impl RequestInterceptor) {
        self.request.push(Arc::new(interceptor));
    }

    /// Append a response interceptor.
    pub fn add_response_interceptor(&mut self, interceptor: impl ResponseInterceptor) {
        self.response.push(Arc::new(interceptor));
    }

    /// Number of request interceptors.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request.len()
    }

    /// Number of response interceptors.
    #[must_use]
    pub fn response_count(&self) -> usize {
        self.response.len()
    }

    /// Run the request interceptors in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Interceptor`] wrapping the first interceptor error.
    pub fn handle_request(
        &self,
        ctx: &ClientContext<'_>,
        request: &mut Request<Bytes>,
        target: Target,
    ) -> Result<()> {
        for (index, interceptor) in self.request.iter().enumerate() {
            if let Err(err) = interceptor.intercept(ctx, request, target) {
                debug!(index, error = %err, "request interceptor aborted");
                return Err(Error::interceptor(err));
            }
        }
        Ok(())
    }

    /// Run the response interceptors in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Interceptor`] wrapping the first interceptor error,
    /// with the response head attached.
    pub fn handle_response(
        &self,
        ctx: &ClientContext<'_>,
        request: &Request<Bytes>,
        response: &RawResponse,
    ) -> Result<()> {
        for (index, interceptor) in self.response.iter().enumerate() {
            if let Err(err) = interceptor.intercept(ctx, request, response) {
                debug!(index, status = response.status(), error = %err, "response interceptor aborted");
                return Err(Error::interceptor(err).with_response(response.head()));
            }
        }
        Ok(())
    }
}
