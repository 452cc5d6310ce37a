//! JSON body encoding and the dual decode of response bodies.
//!
//! A response body is read once and then decoded twice, independently:
//!
//! - [`decode_target`] into the caller's type, where failures are fatal;
//! - [`decode_envelope`] into a [`StatusEnvelope`], where failures are
//!   logged and ignored.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::{Error, Result, StatusEnvelope};

/// MIME type used for request and response bodies.
pub const APPLICATION_JSON: &str = "application/json";

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns [`Error::Encode`] if JSON serialization fails.
///
/// # Example
///
/// ```
/// use roundtrip_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { name: String }
///
/// let user = User { name: "Alice".to_string() };
/// let bytes = to_json(&user).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize the first JSON value in `bytes`, keeping the failing path.
///
/// Trailing content after the first value is ignored.
pub(crate) fn deserialize_json<T: DeserializeOwned>(
    bytes: &[u8],
) -> std::result::Result<T, serde_path_to_error::Error<serde_json::Error>> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Errors
///
/// Returns [`Error::Decode`] with the path to the problematic field
/// (e.g., "user.address.city").
///
/// # Example
///
/// ```
/// use roundtrip_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct User { name: String }
///
/// let user: User = from_json(br#"{"name":"Alice"}"#).expect("deserialize");
/// assert_eq!(user, User { name: "Alice".to_string() });
/// ```
pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    deserialize_json(bytes).map_err(|e| Error::decode(e.path().to_string(), e.inner().to_string()))
}

/// Decode a response body into the caller's target type.
///
/// A body that is empty or only whitespace has no content and yields
/// `Ok(None)`.
///
/// # Errors
///
/// Returns [`Error::Decode`] for any other malformed body.
pub fn decode_target<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<T>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    from_json(bytes).map(Some)
}

/// Best-effort decode of the status envelope.
///
/// Bodies that are not a JSON object yield `None`; mistyped fields are left
/// empty.
#[must_use]
pub fn decode_envelope(bytes: &[u8]) -> Option<StatusEnvelope> {
    match deserialize_json::<StatusEnvelope>(bytes) {
        Ok(envelope) => Some(envelope),
        Err(err) => {
            tracing::debug!(
                path = %err.path(),
                error = %err.inner(),
                "status envelope not decodable, ignoring"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        id: u64,
        name: String,
    }

    #[test]
    fn to_json_reports_encode_errors() {
        let mut map = std::collections::HashMap::new();
        map.insert((1, 2), "tuple keys are not JSON object keys");

        let err = to_json(&map).expect_err("non-string keys");
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn from_json_error_has_path() {
        let err = from_json::<User>(br#"{"id": "one", "name": "x"}"#).expect_err("bad id");
        let Error::Decode { path, .. } = err else {
            panic!("expected decode error, got {err:?}");
        };
        assert_eq!(path, "id");
    }

    #[test]
    fn from_json_ignores_trailing_content() {
        let user: User = from_json(b"{\"id\":1,\"name\":\"a\"}\n{\"id\":2}").expect("first value");
        assert_eq!(user.id, 1);
    }

    #[test]
    fn decode_target_treats_blank_body_as_no_content() {
        assert_eq!(decode_target::<User>(b"").expect("empty"), None);
        assert_eq!(decode_target::<User>(b" \n\t").expect("whitespace"), None);
    }

    #[test]
    fn decode_target_fails_on_malformed_body() {
        let err = decode_target::<User>(b"<html>").expect_err("not json");
        assert!(matches!(err, Error::Decode { response: None, .. }));
    }

    #[test]
    fn decode_target_and_envelope_share_one_buffer() {
        let body = br#"{"id": 3, "name": "c", "status": 200, "msg": "ok"}"#;

        let user = decode_target::<User>(body).expect("decode").expect("content");
        assert_eq!(user, User { id: 3, name: "c".to_string() });

        let envelope = decode_envelope(body).expect("envelope");
        assert_eq!(envelope.status(), 200);
        assert_eq!(envelope.msg(), "ok");
        assert!(!envelope.is_failure());
    }

    #[test]
    fn decode_envelope_swallows_failures() {
        assert!(decode_envelope(b"").is_none());
        assert!(decode_envelope(b"[1, 2, 3]").is_none());
        assert!(decode_envelope(b"not json").is_none());
    }

    #[test]
    fn decode_envelope_drops_mistyped_fields_only() {
        let envelope = decode_envelope(br#"{"status": "ok", "msg": "late"}"#).expect("envelope");
        assert_eq!(envelope.status(), 0);
        assert_eq!(envelope.msg(), "late");
        assert!(!envelope.is_failure());
    }
}
