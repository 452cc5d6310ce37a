//! Error types for roundtrip.

use bytes::Bytes;
use derive_more::{Display, Error, From};

use crate::{Response, StatusEnvelope};

/// Boxed error returned by interceptors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for a request/response round-trip.
///
/// Errors raised after the response body has been read carry the buffered
/// [`Response`], so callers can still inspect status and headers. See
/// [`Error::response`].
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The request path is not a valid template, or a placeholder has no value.
    #[display("invalid path template '{template}': {message}")]
    #[from(skip)]
    Template {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        message: String,
    },

    /// The request body could not be encoded as JSON.
    #[display("JSON encode error: {_0}")]
    #[from]
    Encode(serde_json::Error),

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// A registered interceptor rejected the round-trip.
    ///
    /// Response interceptors abort after the response head arrived; its
    /// status and headers are attached with an empty body.
    #[display("interceptor aborted the request: {error}")]
    #[from(skip)]
    Interceptor {
        /// The interceptor's own error.
        #[error(not(source))]
        error: BoxError,
        /// Head of the response a response interceptor rejected.
        #[error(not(source))]
        response: Option<Box<Response<Bytes>>>,
    },

    /// JSON deserialization error with path context.
    #[display("JSON decode error at '{path}': {message}")]
    #[from(skip)]
    Decode {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
        /// Response whose body failed to decode.
        #[error(not(source))]
        response: Option<Box<Response<Bytes>>>,
    },

    /// The status envelope reported an application-level failure.
    #[display("{envelope}")]
    #[from(skip)]
    Status {
        /// The decoded envelope.
        envelope: StatusEnvelope,
        /// Response carrying the envelope.
        #[error(not(source))]
        response: Box<Response<Bytes>>,
    },

    /// Non-2xx response whose body carried an error message.
    #[display("{message}")]
    #[from(skip)]
    ErrorResponse {
        /// The `Message` field of the error body.
        message: String,
        /// Response carrying the error body.
        #[error(not(source))]
        response: Box<Response<Bytes>>,
    },

    /// Non-2xx response with an empty body.
    #[display("{message}")]
    #[from(skip)]
    BodyEmpty {
        /// Status text or a generic description.
        message: String,
        /// The empty response.
        #[error(not(source))]
        response: Box<Response<Bytes>>,
    },

    /// Non-2xx response without a recognizable error message (strict policy only).
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Status text.
        message: String,
        /// The rejected response.
        #[error(not(source))]
        response: Box<Response<Bytes>>,
    },
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a path template error.
    #[must_use]
    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Wrap an interceptor failure.
    #[must_use]
    pub fn interceptor(error: impl Into<BoxError>) -> Self {
        Self::Interceptor {
            error: error.into(),
            response: None,
        }
    }

    /// Create a JSON decode error with path context and no response attached.
    #[must_use]
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
            response: None,
        }
    }

    /// Attach the buffered response to a decode or interceptor error.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn with_response(self, response: Response<Bytes>) -> Self {
        match self {
            Self::Decode { path, message, .. } => Self::Decode {
                path,
                message,
                response: Some(Box::new(response)),
            },
            Self::Interceptor { error, .. } => Self::Interceptor {
                error,
                response: Some(Box::new(response)),
            },
            other => other,
        }
    }

    /// The buffered response this error was raised for, if any.
    #[must_use]
    pub fn response(&self) -> Option<&Response<Bytes>> {
        match self {
            Self::Decode { response, .. } | Self::Interceptor { response, .. } => response.as_deref(),
            Self::Status { response, .. }
            | Self::ErrorResponse { response, .. }
            | Self::BodyEmpty { response, .. }
            | Self::Http { response, .. } => Some(&**response),
            _ => None,
        }
    }

    /// Returns the HTTP status code when a response is attached.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.response().map(Response::status)
    }

    /// The interceptor's own error, for downcasting.
    #[must_use]
    pub fn interceptor_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Interceptor { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` for errors produced by response classification.
    #[must_use]
    pub const fn is_classified(&self) -> bool {
        matches!(
            self,
            Self::Status { .. } | Self::ErrorResponse { .. } | Self::BodyEmpty { .. } | Self::Http { .. }
        )
    }

    /// Try to decode the attached response body as JSON.
    ///
    /// Returns `None` when no response is attached.
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[derive(Debug, Deserialize)]
    /// struct ApiError {
    ///     code: String,
    /// }
    ///
    /// if let Err(err) = client.call::<_, User>(request).await {
    ///     if let Some(Ok(api_error)) = err.decode_body::<ApiError>() {
    ///         println!("API error code: {}", api_error.code);
    ///     }
    /// }
    /// ```
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.response().map(|response| crate::from_json(response.body()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn response(status: u16, body: &'static str) -> Response<Bytes> {
        Response::new(status, HashMap::new(), Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn error_display() {
        assert_eq!(Error::Timeout.to_string(), "request timeout");
        assert_eq!(
            Error::connection("failed to connect").to_string(),
            "connection error: failed to connect"
        );
        assert_eq!(
            Error::template("/users/{id", "unclosed '{'").to_string(),
            "invalid path template '/users/{id': unclosed '{'"
        );
        assert_eq!(
            Error::decode("user.address.city", "missing field `city`").to_string(),
            "JSON decode error at 'user.address.city': missing field `city`"
        );
    }

    #[test]
    fn classified_errors_display_their_message() {
        let err = Error::ErrorResponse {
            message: "boom".to_string(),
            response: Box::new(response(500, r#"{"Message":"boom"}"#)),
        };
        assert_eq!(err.to_string(), "boom");
        assert!(err.is_classified());
        assert_eq!(err.status(), Some(500));

        let err = Error::Status {
            envelope: StatusEnvelope::new(404, "not found", "not found"),
            response: Box::new(response(200, "")),
        };
        assert_eq!(err.to_string(), "Status 404: not found");
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn with_response_only_attaches_to_decode_errors() {
        let err = Error::decode(".", "expected value").with_response(response(200, "oops"));
        assert_eq!(err.status(), Some(200));

        let err = Error::Timeout.with_response(response(200, "oops"));
        assert!(err.response().is_none());

        let err = Error::interceptor("wrong media type").with_response(response(415, ""));
        assert_eq!(err.status(), Some(415));
        assert_eq!(err.to_string(), "interceptor aborted the request: wrong media type");
    }

    #[test]
    fn interceptor_error_downcasts() {
        #[derive(Debug, derive_more::Display, derive_more::Error)]
        #[display("denied")]
        struct Denied;

        let err = Error::interceptor(Denied);
        assert_eq!(err.to_string(), "interceptor aborted the request: denied");
        let inner = err.interceptor_error().expect("interceptor error");
        assert!(inner.downcast_ref::<Denied>().is_some());
        assert!(!err.is_classified());
    }

    #[test]
    fn predicates() {
        assert!(Error::Timeout.is_timeout());
        assert!(!Error::connection("x").is_timeout());
        assert!(Error::connection("x").is_connection());
        assert!(Error::Timeout.status().is_none());
    }

    #[test]
    fn decode_body_of_attached_response() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct ApiError {
            code: String,
        }

        let err = Error::BodyEmpty {
            message: "response body is empty".to_string(),
            response: Box::new(response(502, "")),
        };
        assert!(matches!(err.decode_body::<ApiError>(), Some(Err(_))));

        let err = Error::ErrorResponse {
            message: "nope".to_string(),
            response: Box::new(response(400, r#"{"Message":"nope","code":"E42"}"#)),
        };
        let decoded = err
            .decode_body::<ApiError>()
            .expect("has response")
            .expect("decodes");
        assert_eq!(decoded.code, "E42");

        assert!(Error::Timeout.decode_body::<ApiError>().is_none());
    }
}
