//! Response classification.
//!
//! Classification is a small decision table. Each rule looks at an
//! [`Exchange`] and either passes (`None`) or settles the outcome with a
//! [`Verdict`]. Rules run in the order of [`RULES`]; when none settles, the
//! exchange is accepted.
//!
//! | # | Rule | Rejects with |
//! |---|------|--------------|
//! | 1 | [`status_envelope`] | [`Rejection::Status`] |
//! | 2 | [`http_status`] | [`Rejection::BodyEmpty`], [`Rejection::Decode`], [`Rejection::ErrorResponse`], [`Rejection::Http`] |

use bytes::Bytes;

use crate::body::deserialize_json;
use crate::{Error, ErrorResponse, Response, StatusEnvelope};

/// Message used for non-2xx responses whose empty body had no declared length.
pub const EMPTY_BODY_MESSAGE: &str = "response body is empty";

/// What a non-2xx response without a recognizable error message turns into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NonSuccessPolicy {
    /// Accept the response (compatible with existing callers).
    #[default]
    Lenient,
    /// Reject it with [`Error::Http`].
    Strict,
}

/// Everything the classifier looks at.
#[derive(Debug, Clone, Copy)]
pub struct Exchange<'a> {
    /// HTTP status code.
    pub status: u16,
    /// Declared `Content-Length`, if any.
    pub content_length: Option<u64>,
    /// The buffered body.
    pub body: &'a [u8],
    /// Decoded status envelope, if the body had one.
    pub envelope: Option<&'a StatusEnvelope>,
}

impl<'a> Exchange<'a> {
    /// Describe a buffered response and its (optional) envelope.
    #[must_use]
    pub fn new(response: &'a Response<Bytes>, envelope: Option<&'a StatusEnvelope>) -> Self {
        Self {
            status: response.status(),
            content_length: response.content_length(),
            body: response.body(),
            envelope,
        }
    }
}

/// Why an exchange was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The envelope carried a failing status.
    Status(StatusEnvelope),
    /// The error body carried this message.
    ErrorResponse(String),
    /// The error body was empty.
    BodyEmpty(String),
    /// The error body was not valid JSON.
    Decode {
        /// JSON path of the failure.
        path: String,
        /// Decoder message.
        message: String,
    },
    /// No recognizable error message, strict policy.
    Http(u16),
}

impl Rejection {
    /// Turn the rejection into an [`Error`] carrying the response.
    #[must_use]
    pub fn into_error(self, response: Response<Bytes>) -> Error {
        let response = Box::new(response);
        match self {
            Self::Status(envelope) => Error::Status { envelope, response },
            Self::ErrorResponse(message) => Error::ErrorResponse { message, response },
            Self::BodyEmpty(message) => Error::BodyEmpty { message, response },
            Self::Decode { path, message } => Error::Decode {
                path,
                message,
                response: Some(response),
            },
            Self::Http(status) => Error::Http {
                status,
                message: status_text(status),
                response,
            },
        }
    }
}

/// Outcome of a classification rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The round-trip succeeded.
    Accept,
    /// The round-trip failed.
    Reject(Rejection),
}

/// A classification rule.
pub type Rule = fn(&Exchange<'_>, NonSuccessPolicy) -> Option<Verdict>;

/// The rules, in precedence order.
pub const RULES: &[(&str, Rule)] = &[
    ("status_envelope", status_envelope as Rule),
    ("http_status", http_status as Rule),
];

/// Applies [`RULES`] to exchanges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classifier {
    policy: NonSuccessPolicy,
}

impl Classifier {
    /// A classifier with the given policy.
    #[must_use]
    pub const fn new(policy: NonSuccessPolicy) -> Self {
        Self { policy }
    }

    /// The configured policy.
    #[must_use]
    pub const fn policy(&self) -> NonSuccessPolicy {
        self.policy
    }

    /// First verdict of [`RULES`], or [`Verdict::Accept`].
    #[must_use]
    pub fn classify(&self, exchange: &Exchange<'_>) -> Verdict {
        RULES
            .iter()
            .find_map(|(name, rule)| {
                let verdict = rule(exchange, self.policy)?;
                tracing::debug!(rule = *name, ?verdict, "classification settled");
                Some(verdict)
            })
            .unwrap_or(Verdict::Accept)
    }
}

/// Rule 1: a failing status envelope rejects, whatever the HTTP status.
#[must_use]
pub fn status_envelope(exchange: &Exchange<'_>, _policy: NonSuccessPolicy) -> Option<Verdict> {
    let envelope = exchange.envelope?;
    envelope
        .is_failure()
        .then(|| Verdict::Reject(Rejection::Status(envelope.clone())))
}

/// Rule 2: a non-2xx HTTP status is examined through its error body.
#[must_use]
pub fn http_status(exchange: &Exchange<'_>, policy: NonSuccessPolicy) -> Option<Verdict> {
    if (200..=299).contains(&exchange.status) {
        return None;
    }

    if exchange.body.is_empty() {
        let message = if exchange.content_length == Some(0) {
            status_text(exchange.status)
        } else {
            EMPTY_BODY_MESSAGE.to_string()
        };
        return Some(Verdict::Reject(Rejection::BodyEmpty(message)));
    }

    let decoded = match deserialize_json::<Option<ErrorResponse>>(exchange.body) {
        Ok(decoded) => decoded,
        Err(err) => {
            return Some(Verdict::Reject(Rejection::Decode {
                path: err.path().to_string(),
                message: err.inner().to_string(),
            }));
        }
    };

    match (decoded.as_ref().and_then(ErrorResponse::message), policy) {
        (Some(message), _) => Some(Verdict::Reject(Rejection::ErrorResponse(
            message.to_string(),
        ))),
        (None, NonSuccessPolicy::Lenient) => Some(Verdict::Accept),
        (None, NonSuccessPolicy::Strict) => {
            Some(Verdict::Reject(Rejection::Http(exchange.status)))
        }
    }
}

/// `"404 Not Found"`, or just the code for unknown statuses.
fn status_text(status: u16) -> String {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map_or_else(|| status.to_string(), |reason| format!("{status} {reason}"))
}
