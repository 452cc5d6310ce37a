//! Response `Content-Type` verification.

use std::sync::Arc;

use bytes::Bytes;
use derive_more::{Display, Error};
use roundtrip_core::{APPLICATION_JSON, BoxError, RawResponse, Request};

use super::{ClientContext, ResponseInterceptor};

/// The response media type differs from the expected one.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("expected Content-Type \"{expected}\", got \"{actual}\"")]
pub struct ContentTypeMismatch {
    /// Media type the interceptor was configured with.
    pub expected: String,
    /// Media type found on the response, without parameters.
    pub actual: String,
}

/// Response interceptor rejecting responses of an unexpected media type.
///
/// Parameters such as `charset` are ignored: `application/json;
/// charset=utf-8` matches `application/json`. A missing header counts as an
/// empty media type.
#[derive(Debug, Clone)]
pub struct ContentTypeCheck {
    expected: Arc<str>,
}

impl ContentTypeCheck {
    /// Expect the given media type.
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: Arc::from(expected.into()),
        }
    }

    /// Expect `application/json`.
    #[must_use]
    pub fn json() -> Self {
        Self::new(APPLICATION_JSON)
    }

    /// The expected media type.
    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }
}

fn media_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
}

impl ResponseInterceptor for ContentTypeCheck {
    fn intercept(
        &self,
        _ctx: &ClientContext<'_>,
        _request: &Request<Bytes>,
        response: &RawResponse,
    ) -> Result<(), BoxError> {
        let actual = media_type(response.header("Content-Type").unwrap_or_default());
        if actual.eq_ignore_ascii_case(&self.expected) {
            return Ok(());
        }

        Err(ContentTypeMismatch {
            expected: self.expected.to_string(),
            actual: actual.to_string(),
        }
        .into())
    }
}
