//! Tower middleware for the [`HyperClient`](crate::HyperClient) transport.
//!
//! Transport middleware wraps the raw exchange: it sees every request the
//! engine submits and every response before the engine reads its body.
//! Per-call concerns that depend on the client (authentication, header
//! defaults, content-type checks) are [interceptors](crate::interceptor)
//! instead.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `middleware-logging` | [`LoggingLayer`] and the `.with_logging()` helper |
//!
//! # Example
//!
//! ```ignore
//! use roundtrip::HyperClient;
//! use roundtrip::middleware::LoggingLayer;
//!
//! let transport = HyperClient::builder()
//!     .layer(LoggingLayer::debug())
//!     .build();
//! ```

#[cfg(feature = "middleware-logging")]
mod logging;

#[cfg(feature = "middleware-logging")]
pub use logging::{LogLevel, Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
