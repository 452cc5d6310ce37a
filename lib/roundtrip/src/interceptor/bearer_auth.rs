//! Bearer token authentication.
//!
//! Adds an `Authorization: Bearer <token>` header to all outgoing requests.

use std::sync::Arc;

use bytes::Bytes;
use roundtrip_core::{BoxError, Request};

use super::{ClientContext, RequestInterceptor, Target};

/// Request interceptor that adds bearer token authentication.
///
/// # Example
///
/// ```ignore
/// use roundtrip::interceptor::BearerAuth;
///
/// client.add_request_interceptor(BearerAuth::new("my-secret-token"));
/// ```
#[derive(Clone)]
pub struct BearerAuth {
    token: Arc<str>,
}

impl BearerAuth {
    /// Create a new bearer auth interceptor with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::from(token.into()),
        }
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}

impl RequestInterceptor for BearerAuth {
    fn intercept(
        &self,
        _ctx: &ClientContext<'_>,
        request: &mut Request<Bytes>,
        _target: Target,
    ) -> Result<(), BoxError> {
        request.set_header("Authorization", format!("Bearer {}", self.token));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use roundtrip_core::{Endpoint, Method};

    use super::*;
    use crate::ClientConfig;

    #[test]
    fn sets_authorization_header() {
        let endpoint = Endpoint::parse("https://api.example.com").expect("valid endpoint");
        let config = ClientConfig::default();
        let ctx = ClientContext::new(&endpoint, &config);
        let mut request = Request::<Bytes>::builder(Method::Get, endpoint.resolve("/me"))
            .header("authorization", "Basic old")
            .build();

        BearerAuth::new("test-token")
            .intercept(&ctx, &mut request, Target::Raw)
            .expect("never fails");

        assert_eq!(request.header("Authorization"), Some("Bearer test-token"));
        assert_eq!(request.headers().len(), 1);
    }

    #[test]
    fn debug_hides_token() {
        let debug = format!("{:?}", BearerAuth::new("secret"));
        assert!(!debug.contains("secret"));
    }
}
