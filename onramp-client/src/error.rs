//! Client error types.
//!
//! Every failure of the request pipeline surfaces as exactly one
//! [`OnrampError`]. The set of variants is closed; [`ErrorKind`] is the
//! data-free discriminant for callers that only branch on the category.

use std::fmt;

use thiserror::Error;

/// Failure taxonomy of the request pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OnrampError {
    /// The client is misconfigured (bad base URL, unreadable config file, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No network connectivity: the backend could not be reached at all.
    #[error("network unavailable")]
    NetworkUnavailable,

    /// Any other transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// The backend reported a failure.
    #[error("API error{}: {message}", status_suffix(.status_code))]
    Api {
        /// Message extracted from the response, or a generic one.
        message: String,
        /// HTTP status of the response, when there was one.
        status_code: Option<u16>,
    },

    /// The backend answered 429.
    #[error("rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The bearer credential is missing, expired or was rejected.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Email verification endpoint failure, with user-facing wording.
    #[error("email verification failed: {0}")]
    EmailVerificationFailed(String),

    /// Undecodable or otherwise unexpected response.
    #[error("unknown error: {0}")]
    Unknown(String),

    /// The user abandoned an interactive step.
    #[error("cancelled by user")]
    UserCancelled,

    /// A required collaborator (such as the credential store) was not supplied.
    #[error("client not initialized")]
    NotInitialized,
}

fn status_suffix(status_code: &Option<u16>) -> String {
    status_code.map(|c| format!(" ({})", c)).unwrap_or_default()
}

/// Discriminant of [`OnrampError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConfigurationError,
    NetworkUnavailable,
    NetworkError,
    ApiError,
    RateLimitExceeded,
    AuthenticationFailed,
    EmailVerificationFailed,
    UnknownError,
    UserCancelled,
    NotInitialized,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationError => "configuration_error",
            Self::NetworkUnavailable => "network_unavailable",
            Self::NetworkError => "network_error",
            Self::ApiError => "api_error",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::AuthenticationFailed => "authentication_failed",
            Self::EmailVerificationFailed => "email_verification_failed",
            Self::UnknownError => "unknown_error",
            Self::UserCancelled => "user_cancelled",
            Self::NotInitialized => "not_initialized",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OnrampError {
    /// Build an [`OnrampError::Api`].
    pub fn api(message: impl Into<String>, status_code: impl Into<Option<u16>>) -> Self {
        Self::Api {
            message: message.into(),
            status_code: status_code.into(),
        }
    }

    /// The discriminant of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::ConfigurationError,
            Self::NetworkUnavailable => ErrorKind::NetworkUnavailable,
            Self::Network(_) => ErrorKind::NetworkError,
            Self::Api { .. } => ErrorKind::ApiError,
            Self::RateLimitExceeded(_) => ErrorKind::RateLimitExceeded,
            Self::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            Self::EmailVerificationFailed(_) => ErrorKind::EmailVerificationFailed,
            Self::Unknown(_) => ErrorKind::UnknownError,
            Self::UserCancelled => ErrorKind::UserCancelled,
            Self::NotInitialized => ErrorKind::NotInitialized,
        }
    }

    /// HTTP status attached to an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// The embedded message, if the variant carries one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Configuration(m)
            | Self::Network(m)
            | Self::RateLimitExceeded(m)
            | Self::AuthenticationFailed(m)
            | Self::EmailVerificationFailed(m)
            | Self::Unknown(m)
            | Self::Api { message: m, .. } => Some(m.as_str()),
            Self::NetworkUnavailable | Self::UserCancelled | Self::NotInitialized => None,
        }
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimitExceeded(_))
    }

    /// Check if this is a server-side (5xx) API error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Api { status_code: Some(status), .. } if *status >= 500)
    }

    /// Transient failures a caller may reasonably retry later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkUnavailable | Self::Network(_) | Self::RateLimitExceeded(_)
        ) || self.is_server_error()
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, OnrampError>;
