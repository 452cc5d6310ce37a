//! The execution engine.
//!
//! [`ApiClient`] binds a transport to an [`Endpoint`], a [`ClientConfig`]
//! and the interceptor chains, and runs each round-trip through the same
//! pipeline:
//!
//! 1. request interceptors, in registration order;
//! 2. the transport;
//! 3. response interceptors, before the body is read;
//! 4. a single read of the body;
//! 5. decode of the target and, independently, of the status envelope;
//! 6. classification.
//!
//! Any step may fail the round-trip. The response body is dropped, and
//! thereby closed, on every path.

use std::sync::Arc;

use bytes::Bytes;
use roundtrip_core::{
    Classifier, Endpoint, Exchange, HttpClient, NonSuccessPolicy, Request, Response, Result,
    Verdict, decode_envelope, decode_target,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::dump::{self, DUMP_TARGET};
use crate::interceptor::{
    ClientContext, Interceptors, RequestInterceptor, ResponseInterceptor, Target,
};
use crate::{ApiRequest, ClientConfig, ClientConfigBuilder};

/// Outcome of a successful round-trip.
#[derive(Debug, Clone)]
pub struct Reply<T> {
    response: Response<Bytes>,
    value: Option<T>,
}

impl<T> Reply<T> {
    /// The buffered response.
    #[must_use]
    pub const fn response(&self) -> &Response<Bytes> {
        &self.response
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.response.status()
    }

    /// The decoded value.
    ///
    /// `None` when the body was empty, whitespace only, or declared with
    /// `Content-Length: 0`.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Consume into the decoded value.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Consume into the buffered response and the decoded value.
    #[must_use]
    pub fn into_parts(self) -> (Response<Bytes>, Option<T>) {
        (self.response, self.value)
    }
}

/// Typed JSON API client over any [`HttpClient`].
///
/// Clones share the transport (when it is shared) and the interceptor
/// chains. Registering an interceptor on a clone detaches that clone's
/// chains from the others.
///
/// # Example
///
/// ```ignore
/// use roundtrip::{ApiClient, ApiRequest, HyperClient};
///
/// #[derive(Debug, serde::Deserialize)]
/// struct User {
///     id: u64,
///     login: String,
/// }
///
/// let mut client = ApiClient::new(HyperClient::new(), "https://api.example.com/v1")?;
/// client.set_user_agent("acme-sdk/1.0");
///
/// let reply = client
///     .call::<_, User>(ApiRequest::get("/users/{id}").path_param("id", 42))
///     .await?;
/// let user = reply.into_value();
/// ```
#[derive(Debug)]
pub struct ApiClient<C> {
    transport: C,
    endpoint: Endpoint,
    config: ClientConfig,
    interceptors: Arc<Interceptors>,
}

impl<C: Clone> Clone for ApiClient<C> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            endpoint: self.endpoint.clone(),
            config: self.config.clone(),
            interceptors: Arc::clone(&self.interceptors),
        }
    }
}

impl<C> ApiClient<C> {
    /// Create a client for the given base URL with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or cannot be a base.
    pub fn new(transport: C, base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self::with_endpoint(transport, Endpoint::parse(base_url)?))
    }

    /// Create a client for a pre-parsed endpoint.
    #[must_use]
    pub fn with_endpoint(transport: C, endpoint: Endpoint) -> Self {
        Self {
            transport,
            endpoint,
            config: ClientConfig::default(),
            interceptors: Arc::default(),
        }
    }

    /// Create a client builder.
    #[must_use]
    pub fn builder(transport: C, endpoint: Endpoint) -> ApiClientBuilder<C> {
        ApiClientBuilder::new(transport, endpoint)
    }

    /// The base endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The interceptor chains.
    #[must_use]
    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    /// Replace the base endpoint.
    pub fn set_endpoint(&mut self, endpoint: Endpoint) {
        self.endpoint = endpoint;
    }

    /// Enable or disable request/response dumps.
    pub fn set_debug(&mut self, debug: bool) {
        self.config.debug = debug;
    }

    /// Set the `User-Agent` header value.
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.config.user_agent = user_agent.into();
    }

    /// Set the policy for non-2xx responses without an error message.
    pub fn set_non_success_policy(&mut self, policy: NonSuccessPolicy) {
        self.config.non_success_policy = policy;
    }

    /// Append a request interceptor.
    pub fn add_request_interceptor(&mut self, interceptor: impl RequestInterceptor) {
        Arc::make_mut(&mut self.interceptors).add_request_interceptor(interceptor);
    }

    /// Append a response interceptor.
    pub fn add_response_interceptor(&mut self, interceptor: impl ResponseInterceptor) {
        Arc::make_mut(&mut self.interceptors).add_response_interceptor(interceptor);
    }

    /// Get a reference to the transport.
    #[must_use]
    pub const fn inner(&self) -> &C {
        &self.transport
    }

    /// Consume the client and return the transport.
    #[must_use]
    pub fn into_inner(self) -> C {
        self.transport
    }

    fn context(&self) -> ClientContext<'_> {
        ClientContext::new(&self.endpoint, &self.config)
    }

    fn classifier(&self) -> Classifier {
        Classifier::new(self.config.non_success_policy)
    }

    /// Materialize a call descriptor into a transport-ready request.
    ///
    /// The path is resolved against the endpoint (query pairs merged, path
    /// parameters substituted when bound), `User-Agent` is set, then the
    /// caller's headers. A body is encoded as JSON with
    /// `Content-Type: application/json`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`](roundtrip_core::Error::Template) for an
    /// invalid template or a missing parameter, and
    /// [`Error::Encode`](roundtrip_core::Error::Encode) if the body cannot
    /// be serialized.
    pub fn new_request<B: Serialize>(&self, request: &ApiRequest<B>) -> Result<Request<Bytes>> {
        let url = match request.params() {
            Some(params) => self.endpoint.resolve_with_params(request.path(), params)?,
            None => self.endpoint.resolve(request.path()),
        };

        let mut builder = Request::<Bytes>::builder(request.method(), url)
            .header("User-Agent", self.config.user_agent.as_str())
            .headers(request.headers().iter().cloned());

        if let Some(body) = request.body_ref() {
            builder = builder.json(body)?;
        }

        Ok(builder.build())
    }
}

impl<C: HttpClient> ApiClient<C> {
    /// Build and execute a call, decoding the body into `T`.
    ///
    /// # Errors
    ///
    /// See [`new_request`](Self::new_request) and [`execute`](Self::execute).
    pub async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        request: ApiRequest<B>,
    ) -> Result<Reply<T>> {
        let request = self.new_request(&request)?;
        self.execute(request).await
    }

    /// Execute a request, decoding the body into `T` and classifying the
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns interceptor and transport errors as they occur; a
    /// classification error (`Status`, `ErrorResponse`, `BodyEmpty`, `Http`)
    /// carrying the buffered response; or, for an accepted response,
    /// [`Error::Decode`](roundtrip_core::Error::Decode) if the body is not a
    /// valid `T`.
    pub async fn execute<T: DeserializeOwned>(&self, request: Request<Bytes>) -> Result<Reply<T>> {
        let response = self.round_trip(request, Target::of::<T>()).await?;

        if response.content_length() == Some(0) {
            debug!(status = response.status(), "declared empty body, skipping decode");
            return Ok(Reply { response, value: None });
        }

        let value = decode_target::<T>(response.body());
        let envelope = decode_envelope(response.body());

        // Rejections take precedence over a failed target decode.
        let verdict = self
            .classifier()
            .classify(&Exchange::new(&response, envelope.as_ref()));
        match (verdict, value) {
            (Verdict::Reject(rejection), _) => Err(rejection.into_error(response)),
            (Verdict::Accept, Ok(value)) => Ok(Reply { response, value }),
            (Verdict::Accept, Err(err)) => Err(err.with_response(response)),
        }
    }

    /// Execute a request and return the buffered response without decoding
    /// or classifying it.
    ///
    /// # Errors
    ///
    /// Returns interceptor and transport errors.
    pub async fn execute_raw(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        self.round_trip(request, Target::Raw).await
    }

    /// Steps 1 to 4: interceptors around the transport, then the body read.
    async fn round_trip(&self, mut request: Request<Bytes>, target: Target) -> Result<Response<Bytes>> {
        let context = self.context();

        self.interceptors
            .handle_request(&context, &mut request, target)?;
        debug!(method = %request.method(), url = %request.url(), "request intercepted");

        if self.config.debug {
            info!(target: DUMP_TARGET, "{}", dump::request(&request));
        }

        let sent = request.clone();
        let raw = self.transport.execute(request).await?;
        debug!(status = raw.status(), "response received");

        self.interceptors.handle_response(&context, &sent, &raw)?;

        let response = raw.collect().await?;
        debug!(status = response.status(), bytes = response.body().len(), "body read");

        if self.config.debug {
            info!(target: DUMP_TARGET, "{}", dump::response(&response));
        }

        Ok(response)
    }
}

/// Builder for [`ApiClient`].
///
/// # Example
///
/// ```ignore
/// use roundtrip::interceptor::{BearerAuth, ContentTypeCheck};
/// use roundtrip::{ApiClient, Endpoint, HyperClient};
///
/// let client = ApiClient::builder(HyperClient::new(), Endpoint::parse("https://api.example.com")?)
///     .user_agent("acme-sdk/1.0")
///     .request_interceptor(BearerAuth::new(token))
///     .response_interceptor(ContentTypeCheck::json())
///     .build();
/// ```
#[derive(Debug)]
pub struct ApiClientBuilder<C> {
    transport: C,
    endpoint: Endpoint,
    config: ClientConfigBuilder,
    interceptors: Interceptors,
}

impl<C> ApiClientBuilder<C> {
    /// Start from a transport and an endpoint.
    #[must_use]
    pub fn new(transport: C, endpoint: Endpoint) -> Self {
        Self {
            transport,
            endpoint,
            config: ClientConfigBuilder::default(),
            interceptors: Interceptors::new(),
        }
    }

    /// Set the `User-Agent` header value.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    /// Enable or disable request/response dumps.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config = self.config.debug(debug);
        self
    }

    /// Set the policy for non-2xx responses without an error message.
    #[must_use]
    pub fn non_success_policy(mut self, policy: NonSuccessPolicy) -> Self {
        self.config = self.config.non_success_policy(policy);
        self
    }

    /// Append a request interceptor.
    #[must_use]
    pub fn request_interceptor(mut self, interceptor: impl RequestInterceptor) -> Self {
        self.interceptors.add_request_interceptor(interceptor);
        self
    }

    /// Append a response interceptor.
    #[must_use]
    pub fn response_interceptor(mut self, interceptor: impl ResponseInterceptor) -> Self {
        self.interceptors.add_response_interceptor(interceptor);
        self
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> ApiClient<C> {
        ApiClient {
            transport: self.transport,
            endpoint: self.endpoint,
            config: self.config.build(),
            interceptors: Arc::new(self.interceptors),
        }
    }
}

#[cfg(test)]
mod tests {
    use roundtrip_core::{Error, Method};

    use super::*;

    #[derive(Debug, Clone)]
    struct NoTransport;

    fn client() -> ApiClient<NoTransport> {
        ApiClient::new(NoTransport, "https://api.example.com/api?token=abc").expect("valid URL")
    }

    #[test]
    fn new_request_resolves_and_sets_defaults() {
        let request = client()
            .new_request(&ApiRequest::get("/v1/users?page=2").header("Accept", "application/json"))
            .expect("request");

        assert_eq!(request.method(), Method::Get);
        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/api/v1/users?page=2&token=abc"
        );
        assert!(request.header("User-Agent").is_some_and(|ua| ua.starts_with("roundtrip/")));
        assert_eq!(request.header("accept"), Some("application/json"));
        assert!(request.header("Content-Type").is_none());
        assert!(request.body().is_none());
    }

    #[test]
    fn new_request_encodes_body_and_params() {
        let mut client = client();
        client.set_user_agent("acme-sdk/1.0");

        let call = ApiRequest::put("/users/{id}")
            .path_param("id", "jane doe")
            .body(serde_json::json!({"admin": true}));
        let request = client.new_request(&call).expect("request");

        assert_eq!(request.url().path(), "/api/users/jane%20doe");
        assert_eq!(request.header("user-agent"), Some("acme-sdk/1.0"));
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(
            request.body().map(|body| body.to_vec()),
            Some(br#"{"admin":true}"#.to_vec())
        );
    }

    #[test]
    fn caller_headers_override_user_agent() {
        let request = client()
            .new_request(&ApiRequest::get("/").header("user-agent", "custom"))
            .expect("request");
        assert_eq!(request.header("User-Agent"), Some("custom"));
        assert_eq!(request.headers().len(), 1);
    }

    #[test]
    fn new_request_reports_template_errors() {
        let err = client()
            .new_request(&ApiRequest::get("/users/{id}").path_param("name", "x"))
            .expect_err("missing id");
        assert!(matches!(err, Error::Template { .. }));
    }

    #[test]
    fn new_request_reports_encode_errors() {
        use std::collections::HashMap;

        let mut body = HashMap::new();
        body.insert(vec![1_u8], "non-string key");
        let err = client()
            .new_request(&ApiRequest::post("/blobs").body(body))
            .expect_err("unencodable");
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn registration_is_copy_on_write() {
        let mut first = client();
        first.add_request_interceptor(crate::interceptor::DefaultHeader::accept_json());
        let second = first.clone();
        first.add_response_interceptor(crate::interceptor::ContentTypeCheck::json());

        assert_eq!(first.interceptors().response_count(), 1);
        assert_eq!(second.interceptors().request_count(), 1);
        assert_eq!(second.interceptors().response_count(), 0);
    }

    #[test]
    fn builder_applies_config() {
        let endpoint = Endpoint::parse("https://api.example.com").expect("valid URL");
        let client = ApiClient::builder(NoTransport, endpoint)
            .user_agent("builder/1")
            .debug(true)
            .non_success_policy(NonSuccessPolicy::Strict)
            .request_interceptor(crate::interceptor::BearerAuth::new("t"))
            .build();

        assert_eq!(client.config().user_agent, "builder/1");
        assert!(client.config().debug);
        assert_eq!(client.classifier().policy(), NonSuccessPolicy::Strict);
        assert_eq!(client.interceptors().request_count(), 1);
    }
}
