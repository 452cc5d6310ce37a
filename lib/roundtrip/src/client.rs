//! Default transport: hyper-util over rustls, with tower layers around it.
//!
//! The transport stops at the response head. The body is handed back as an
//! unread stream; the engine decides when to read it.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{TryStreamExt, future};
use http_body_util::{BodyStream, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{self, Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use roundtrip_core::{Error, HttpClient, RawResponse, Request, ResponseBody, Result};
use tower::util::BoxCloneService;
use tower::{Layer, ServiceExt};
use tower_service::Service;

use crate::config::{TransportConfig, TransportConfigBuilder};

#[cfg(feature = "middleware-logging")]
use crate::middleware::LoggingLayer;

/// Type-erased transport service.
///
/// Layers added with [`HyperClientBuilder::layer`] wrap a service of this type.
pub type BoxedService = BoxCloneService<Request<Bytes>, RawResponse, Error>;

/// Future type of the transport services.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'static>>;

type Pool = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

type WrapFn = Box<dyn FnOnce(BoxedService) -> BoxedService + Send>;

// ============================================================================
// Wire
// ============================================================================

/// Innermost service: one pooled hyper exchange per call.
#[derive(Clone)]
struct Wire {
    pool: Pool,
    timeout: Duration,
}

impl Wire {
    fn new(config: &TransportConfig) -> Self {
        let pool = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector(config));

        Self {
            pool,
            timeout: config.timeout,
        }
    }
}

impl Service<Request<Bytes>> for Wire {
    type Response = RawResponse;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let pool = self.pool.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let outbound = to_hyper(request)?;
            let response = tokio::time::timeout(timeout, pool.request(outbound))
                .await
                .map_err(|_elapsed| Error::Timeout)?
                .map_err(transport_error)?;

            let (head, incoming) = response.into_parts();
            let body: ResponseBody = Box::pin(
                BodyStream::new(incoming)
                    .try_filter_map(|frame| future::ready(Ok(frame.into_data().ok())))
                    .map_err(|err| Error::connection(format!("reading response body: {err}"))),
            );

            Ok(RawResponse::new(head.status.as_u16(), header_map(&head.headers), body))
        })
    }
}

/// rustls with the webpki roots; `http://` is allowed, HTTP/2 negotiated by ALPN.
fn connector(config: &TransportConfig) -> HttpsConnector<HttpConnector> {
    let roots: rustls::RootCertStore = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    let tls = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut tcp = HttpConnector::new();
    tcp.enforce_http(false);
    tcp.set_connect_timeout(Some(config.connect_timeout));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(tcp)
}

fn to_hyper(request: Request<Bytes>) -> Result<http::Request<Full<Bytes>>> {
    let (method, url, headers, body) = request.into_parts();

    headers
        .iter()
        .fold(
            http::Request::builder()
                .method(http::Method::from(method))
                .uri(url.as_str()),
            |outbound, (name, value)| outbound.header(name.as_str(), value.as_str()),
        )
        .body(Full::new(body.unwrap_or_default()))
        .map_err(|err| Error::invalid_request(err.to_string()))
}

/// Headers whose value is not visible ASCII are dropped.
fn header_map(headers: &http::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_owned(), value.to_str().ok()?.to_owned())))
        .collect()
}

#[allow(clippy::needless_pass_by_value)]
fn transport_error(err: legacy::Error) -> Error {
    let message = error_chain(&err);
    if caused_by_tls(&err) {
        Error::tls(message)
    } else {
        Error::connection(message)
    }
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    std::iter::successors(Some(err), |&cause| cause.source())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

// tokio-rustls reports handshake failures as an io::Error wrapping rustls::Error.
fn caused_by_tls(err: &(dyn StdError + 'static)) -> bool {
    std::iter::successors(Some(err), |&cause| cause.source()).any(|cause| {
        cause.is::<rustls::Error>()
            || cause
                .downcast_ref::<std::io::Error>()
                .and_then(std::io::Error::get_ref)
                .is_some_and(|inner| inner.is::<rustls::Error>())
    })
}

// ============================================================================
// HyperClient
// ============================================================================

/// The layered service stack, locked so that [`HyperClient`] is `Sync`.
#[derive(Clone)]
struct Stack(Arc<Mutex<BoxedService>>);

impl Stack {
    fn dispatch(&self, request: Request<Bytes>) -> ServiceFuture {
        let service = self.0.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Box::pin(service.oneshot(request))
    }
}

/// [`HttpClient`] over hyper-util with connection pooling, rustls and tower
/// middleware.
///
/// # Example
///
/// ```ignore
/// use roundtrip::HyperClient;
/// use std::time::Duration;
///
/// let transport = HyperClient::builder()
///     .timeout(Duration::from_secs(10))
///     .with_logging()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperClient {
    stack: Stack,
    config: TransportConfig,
}

impl fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Transport with the default configuration and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Transport with the given configuration and no middleware.
    #[must_use]
    pub fn with_config(config: TransportConfig) -> Self {
        HyperClientBuilder {
            config: config.into(),
            ..HyperClientBuilder::default()
        }
        .build()
    }

    /// Start a builder from the default configuration.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// The configuration this transport was built with.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for HyperClient {
    async fn execute(&self, request: Request<Bytes>) -> Result<RawResponse> {
        self.stack.dispatch(request).await
    }
}

/// Builder for [`HyperClient`].
///
/// Logging, when enabled, sits directly on the wire; layers added with
/// [`layer`](Self::layer) wrap it, the last one outermost.
///
/// ```ignore
/// use roundtrip::HyperClient;
/// use roundtrip::middleware::LoggingLayer;
///
/// let transport = HyperClient::builder()
///     .layer(LoggingLayer::debug())
///     .build();
/// ```
#[derive(Default)]
pub struct HyperClientBuilder {
    config: TransportConfigBuilder,
    #[cfg(feature = "middleware-logging")]
    logging: Option<LoggingLayer>,
    layers: Vec<WrapFn>,
}

impl fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("HyperClientBuilder");
        debug.field("config", &self.config);
        #[cfg(feature = "middleware-logging")]
        debug.field("logging", &self.logging.map(|logging| logging.level()));
        debug.field("layers", &self.layers.len()).finish()
    }
}

impl HyperClientBuilder {
    /// Time allowed until the response head arrives.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Time allowed to establish a connection.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Maximum idle connections kept per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// How long an idle connection stays in the pool.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Wrap the transport in a tower layer.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + 'static,
        L::Service: Service<Request<Bytes>, Response = RawResponse, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send + 'static,
    {
        self.layers
            .push(Box::new(move |inner| BoxCloneService::new(layer.layer(inner))));
        self
    }

    /// Enable the default middleware: info-level logging unless logging is
    /// already configured. Without the `middleware-logging` feature this
    /// changes nothing.
    #[must_use]
    pub fn with_defaults(self) -> Self {
        #[cfg(feature = "middleware-logging")]
        {
            if self.logging.is_none() {
                return self.with_logging();
            }
        }
        self
    }

    /// Log each exchange at info level.
    #[cfg(feature = "middleware-logging")]
    #[must_use]
    pub fn with_logging(mut self) -> Self {
        self.logging = Some(LoggingLayer::new());
        self
    }

    /// Log each exchange at debug level, headers included.
    #[cfg(feature = "middleware-logging")]
    #[must_use]
    pub fn with_debug_logging(mut self) -> Self {
        self.logging = Some(LoggingLayer::debug());
        self
    }

    /// Assemble the service stack.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let config = self.config.build();
        let wire: BoxedService = BoxCloneService::new(Wire::new(&config));

        #[cfg(feature = "middleware-logging")]
        let wire = match self.logging {
            Some(logging) => BoxCloneService::new(logging.layer(wire)),
            None => wire,
        };

        let service = self.layers.into_iter().fold(wire, |inner, wrap| wrap(inner));

        HyperClient {
            stack: Stack(Arc::new(Mutex::new(service))),
            config,
        }
    }
}
