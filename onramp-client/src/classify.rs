//! Failure classification.
//!
//! Pure, total mapping of transport and HTTP failures into [`OnrampError`].

use serde_json::Value;

use crate::error::OnrampError;

/// A transport-level failure: no HTTP response was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// Connecting failed: DNS, refused connection, unreachable host, offline.
    Unreachable(String),
    /// The request or a read timed out.
    TimedOut(String),
    /// Anything else (TLS, body read, redirect loop, ...).
    Other(String),
}

impl From<&reqwest::Error> for TransportFailure {
    fn from(err: &reqwest::Error) -> Self {
        if err.is_connect() {
            Self::Unreachable(err.to_string())
        } else if err.is_timeout() {
            Self::TimedOut(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// Classify a transport failure.
pub fn classify_transport(failure: &TransportFailure) -> OnrampError {
    match failure {
        TransportFailure::Unreachable(_) => OnrampError::NetworkUnavailable,
        TransportFailure::TimedOut(reason) => {
            OnrampError::Network(format!("Request timed out: {}", reason))
        }
        TransportFailure::Other(reason) => OnrampError::Network(reason.clone()),
    }
}

/// Classify a non-2xx response into an API error.
///
/// The message is taken from the body's `error`, `message` or `detail` field
/// (an `error` object's own `message` also counts), with a `code` appended
/// when present. Anything unparseable yields `"HTTP error <status>"`.
pub fn classify_status(status: u16, body: &[u8]) -> OnrampError {
    let message = extract_message(body).unwrap_or_else(|| format!("HTTP error {}", status));
    OnrampError::api(message, status)
}

fn extract_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let object = value.as_object()?;

    let message = ["error", "message", "detail"].iter().find_map(|field| {
        match object.get(*field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Object(nested) => nested
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    })?;

    Some(match code_of(object.get("code")) {
        Some(code) => format!("{} (Code: {})", message, code),
        None => message,
    })
}

/// Render an envelope `code` that may be a string or a number.
pub(crate) fn code_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
