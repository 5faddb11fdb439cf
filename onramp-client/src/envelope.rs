//! Response envelope decoding.
//!
//! The backend answers in one of two shapes:
//!
//! ```text
//! { "success": true,  ...payload fields }              enveloped success
//! { "success": false, "error": "...", "code": "..." }  enveloped failure
//! { ...payload fields }                                legacy, no wrapper
//! ```
//!
//! The enveloped shape is recognised by a boolean `success` field; everything
//! else that is valid JSON is decoded as the legacy payload. A `success: false`
//! is a failure whatever the HTTP status was.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::classify::code_of;
use crate::error::{OnrampError, Result};

const EMPTY_RESPONSE: &str = "Empty response data";
const DEFAULT_FAILURE_MESSAGE: &str = "Unknown error";

/// A parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    /// `success: true`; holds the whole object, wrapper field included.
    Success(Value),
    /// `success: false` with the reported error and optional code.
    Failure {
        error: Option<String>,
        code: Option<String>,
    },
    /// No `success` flag; the body is the payload.
    Legacy(Value),
}

impl ResponseEnvelope {
    /// Parse raw bytes into an envelope.
    ///
    /// Empty bodies and malformed JSON are rejected here, before any legacy
    /// decoding is attempted.
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(OnrampError::Unknown(EMPTY_RESPONSE.to_string()));
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| OnrampError::Unknown(format!("Invalid JSON response: {}", e)))?;

        let flag = value
            .as_object()
            .and_then(|object| object.get("success"))
            .and_then(Value::as_bool);

        Ok(match flag {
            Some(true) => Self::Success(value),
            Some(false) => Self::Failure {
                error: value
                    .get("error")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                code: code_of(value.get("code")),
            },
            None => Self::Legacy(value),
        })
    }

    /// Whether this is the legacy, unwrapped shape.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    /// Extract the payload, or the failure as an API error carrying `status`.
    pub fn into_payload<T: DeserializeOwned>(self, status: u16) -> Result<T> {
        match self {
            Self::Success(value) | Self::Legacy(value) => serde_json::from_value(value)
                .map_err(|e| OnrampError::Unknown(format!("Failed to decode response: {}", e))),
            Self::Failure { error, code } => {
                let message = error.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                let message = match code {
                    Some(code) => format!("{} (Code: {})", message, code),
                    None => message,
                };
                Err(OnrampError::api(message, status))
            }
        }
    }
}

/// Decode a response body into `T`, enveloped shape first, legacy second.
pub fn decode<T: DeserializeOwned>(body: &[u8], status: u16) -> Result<T> {
    let envelope = ResponseEnvelope::parse(body)?;
    if envelope.is_legacy() {
        tracing::debug!("Response has no envelope, decoding as legacy payload");
    }
    envelope.into_payload(status)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Connection {
        platform: String,
        connected: bool,
        #[serde(default)]
        scopes: Vec<String>,
    }

    #[test]
    fn test_enveloped_success_decodes_payload() {
        let body = br#"{"success":true,"platform":"google","connected":true}"#;
        let decoded: Connection = decode(body, 200).unwrap();
        assert_eq!(
            decoded,
            Connection {
                platform: "google".into(),
                connected: true,
                scopes: vec![],
            }
        );
    }

    #[test]
    fn test_enveloped_success_shape_mismatch_is_unknown() {
        let body = br#"{"success":true,"platform":42}"#;
        let err = decode::<Connection>(body, 200).unwrap_err();
        assert!(matches!(err, OnrampError::Unknown(ref m) if m.starts_with("Failed to decode response")));
    }

    #[test]
    fn test_enveloped_failure_on_200_is_api_error() {
        let body = br#"{"success":false,"error":"Invalid code","code":"E_CODE"}"#;
        let err = decode::<Connection>(body, 200).unwrap_err();
        assert_eq!(err, OnrampError::api("Invalid code (Code: E_CODE)", 200));
    }

    #[test]
    fn test_enveloped_failure_defaults_message() {
        let err = decode::<Value>(br#"{"success":false}"#, 200).unwrap_err();
        assert_eq!(err, OnrampError::api("Unknown error", 200));

        let err = decode::<Value>(br#"{"success":false,"code":17}"#, 201).unwrap_err();
        assert_eq!(err, OnrampError::api("Unknown error (Code: 17)", 201));
    }

    #[test]
    fn test_legacy_payload_roundtrip() {
        let original = Connection {
            platform: "spotify".into(),
            connected: false,
            scopes: vec!["read".into()],
        };
        let body = serde_json::to_vec(&original).unwrap();

        assert!(ResponseEnvelope::parse(&body).unwrap().is_legacy());
        let decoded: Connection = decode(&body, 200).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_non_boolean_success_is_legacy() {
        let envelope = ResponseEnvelope::parse(br#"{"success":"yes"}"#).unwrap();
        assert!(envelope.is_legacy());
    }

    #[test]
    fn test_legacy_mismatch_is_unknown() {
        let err = decode::<Connection>(br#"[1,2,3]"#, 200).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnknownError);
    }

    #[test]
    fn test_empty_body_is_unknown() {
        assert_eq!(
            decode::<Value>(b"", 200).unwrap_err(),
            OnrampError::Unknown("Empty response data".into())
        );
        assert_eq!(
            decode::<Value>(b"  \n", 200).unwrap_err(),
            OnrampError::Unknown("Empty response data".into())
        );
    }

    #[test]
    fn test_malformed_json_fails_fast() {
        let err = decode::<Value>(b"{not json", 200).unwrap_err();
        assert!(matches!(err, OnrampError::Unknown(ref m) if m.starts_with("Invalid JSON response")));
    }
}
