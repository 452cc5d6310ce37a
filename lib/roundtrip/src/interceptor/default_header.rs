//! Static headers added to every request.

use bytes::Bytes;
use roundtrip_core::{BoxError, Request};

use super::{ClientContext, RequestInterceptor, Target};

/// Request interceptor adding a header unless the request already has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultHeader {
    name: String,
    value: String,
}

impl DefaultHeader {
    /// Add `name: value` to requests that lack `name`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// `Accept: application/json`.
    #[must_use]
    pub fn accept_json() -> Self {
        Self::new("Accept", roundtrip_core::APPLICATION_JSON)
    }
}

impl RequestInterceptor for DefaultHeader {
    fn intercept(
        &self,
        _ctx: &ClientContext<'_>,
        request: &mut Request<Bytes>,
        _target: Target,
    ) -> Result<(), BoxError> {
        if request.header(&self.name).is_none() {
            request.set_header(self.name.clone(), self.value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use roundtrip_core::{Endpoint, Method};

    use super::*;
    use crate::ClientConfig;

    #[test]
    fn only_fills_missing_headers() {
        let endpoint = Endpoint::parse("https://api.example.com").expect("valid endpoint");
        let config = ClientConfig::default();
        let ctx = ClientContext::new(&endpoint, &config);

        let mut plain = Request::<Bytes>::builder(Method::Get, endpoint.resolve("/a")).build();
        let mut explicit = Request::<Bytes>::builder(Method::Get, endpoint.resolve("/b"))
            .header("accept", "text/csv")
            .build();

        let interceptor = DefaultHeader::accept_json();
        for request in [&mut plain, &mut explicit] {
            interceptor
                .intercept(&ctx, request, Target::of::<()>())
                .expect("never fails");
        }

        assert_eq!(plain.header("Accept"), Some("application/json"));
        assert_eq!(explicit.header("Accept"), Some("text/csv"));
    }
}
