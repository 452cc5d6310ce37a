//! Secondary decode targets: the status envelope and the error body.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Application-level status some APIs embed in every response body.
///
/// Recognized keys are `status` (integer), `msg` and `message`. All of them
/// are optional and decoded independently: a field of the wrong type is left
/// empty without discarding the others. Bodies that are not JSON objects fail
/// to decode, which is tolerated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEnvelope {
    #[serde(default, deserialize_with = "lenient")]
    status: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    msg: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    message: Option<String>,
}

/// Decode a field, treating a value of the wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

impl StatusEnvelope {
    /// Build an envelope by hand.
    #[must_use]
    pub fn new(status: i64, msg: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            msg: Some(msg.into()),
            message: Some(message.into()),
        }
    }

    /// The numeric status, `0` when absent.
    #[must_use]
    pub fn status(&self) -> i64 {
        self.status.unwrap_or_default()
    }

    /// The `msg` field, empty when absent.
    #[must_use]
    pub fn msg(&self) -> &str {
        self.msg.as_deref().unwrap_or_default()
    }

    /// The `message` field, empty when absent.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }

    /// A non-zero status outside `200..=299` is a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        let status = self.status();
        status != 0 && !(200..=299).contains(&status)
    }
}

impl fmt::Display for StatusEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.msg() == self.message() {
            write!(f, "Status {}: {}", self.status(), self.msg())
        } else {
            write!(f, "Status {}: {} {}", self.status(), self.msg(), self.message())
        }
    }
}

/// Error body shape checked for non-2xx responses.
///
/// The key is `Message`, matched case-sensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

impl ErrorResponse {
    /// Build an error body by hand.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// The message, if present and non-empty.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|message| !message.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_failure_range() {
        assert!(!StatusEnvelope::default().is_failure());
        assert!(!StatusEnvelope::new(0, "", "").is_failure());
        assert!(!StatusEnvelope::new(200, "ok", "").is_failure());
        assert!(!StatusEnvelope::new(299, "", "").is_failure());
        assert!(StatusEnvelope::new(199, "", "").is_failure());
        assert!(StatusEnvelope::new(300, "", "").is_failure());
        assert!(StatusEnvelope::new(404, "", "").is_failure());
        assert!(StatusEnvelope::new(-1, "", "").is_failure());
    }

    #[test]
    fn envelope_message_is_deduplicated() {
        let envelope = StatusEnvelope::new(500, "down", "down");
        assert_eq!(envelope.to_string(), "Status 500: down");

        let envelope = StatusEnvelope::new(500, "down", "maintenance window");
        assert_eq!(envelope.to_string(), "Status 500: down maintenance window");
    }

    #[test]
    fn envelope_fields_are_optional() {
        let envelope: StatusEnvelope =
            serde_json::from_str(r#"{"id": 7, "msg": null}"#).expect("decode");
        assert_eq!(envelope.status(), 0);
        assert_eq!(envelope.msg(), "");
        assert!(!envelope.is_failure());

        let envelope: StatusEnvelope =
            serde_json::from_str(r#"{"status": 403, "message": "forbidden"}"#).expect("decode");
        assert!(envelope.is_failure());
        assert_eq!(envelope.to_string(), "Status 403:  forbidden");
    }

    #[test]
    fn envelope_fields_decode_independently() {
        let envelope: StatusEnvelope =
            serde_json::from_str(r#"{"status": 500, "msg": 42, "message": "down"}"#)
                .expect("decode");
        assert_eq!(envelope.status(), 500);
        assert_eq!(envelope.msg(), "");
        assert_eq!(envelope.message(), "down");
        assert!(envelope.is_failure());

        let envelope: StatusEnvelope =
            serde_json::from_str(r#"{"status": "503", "msg": "busy"}"#).expect("decode");
        assert_eq!(envelope.status(), 0);
        assert_eq!(envelope.msg(), "busy");
        assert!(!envelope.is_failure());

        assert!(serde_json::from_str::<StatusEnvelope>("[1, 2]").is_err());
    }

    #[test]
    fn error_response_key_is_case_sensitive() {
        let body: ErrorResponse = serde_json::from_str(r#"{"Message": "boom"}"#).expect("decode");
        assert_eq!(body.message(), Some("boom"));

        let body: ErrorResponse = serde_json::from_str(r#"{"message": "boom"}"#).expect("decode");
        assert_eq!(body.message(), None);

        let body: ErrorResponse = serde_json::from_str(r#"{"Message": ""}"#).expect("decode");
        assert_eq!(body.message(), None);
    }
}
