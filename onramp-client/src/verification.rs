//! Error rewriting for the email verification endpoints.
//!
//! Failures from `request-code` and `verify-code` are shown to end users, so
//! they are converted into [`OnrampError::EmailVerificationFailed`] with text
//! that depends on which of the two operations failed.

use std::fmt;

use crate::error::OnrampError;

/// The email operation an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailOperation {
    RequestCode,
    VerifyCode,
}

impl EmailOperation {
    fn service(&self) -> &'static str {
        match self {
            Self::RequestCode => "Email request",
            Self::VerifyCode => "Email verification",
        }
    }

    fn action(&self) -> &'static str {
        match self {
            Self::RequestCode => "send the verification code",
            Self::VerifyCode => "verify the code",
        }
    }
}

impl fmt::Display for EmailOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestCode => f.write_str("request-code"),
            Self::VerifyCode => f.write_str("verify-code"),
        }
    }
}

/// Rewrite any pipeline error into an email verification failure.
pub fn enhance_email_error(err: OnrampError, operation: EmailOperation) -> OnrampError {
    let message = match err {
        OnrampError::EmailVerificationFailed(_) => return err,
        OnrampError::Api {
            status_code: Some(404),
            ..
        } => format!(
            "{} service is temporarily unavailable. Please try again later.",
            operation.service()
        ),
        OnrampError::Api {
            status_code: Some(429),
            ..
        }
        | OnrampError::RateLimitExceeded(_) => {
            "Too many attempts. Please wait a few minutes before trying again.".to_string()
        }
        OnrampError::Api {
            status_code: Some(status),
            ..
        } if status >= 500 => format!(
            "The server encountered an error while trying to {}. Please try again later.",
            operation.action()
        ),
        OnrampError::Api { message, .. } => match operation {
            EmailOperation::RequestCode => message,
            EmailOperation::VerifyCode => format!("Invalid or expired code: {}", message),
        },
        OnrampError::NetworkUnavailable => format!(
            "No internet connection. Unable to {}.",
            operation.action()
        ),
        OnrampError::Network(reason) => {
            format!("Network error while trying to {}: {}", operation.action(), reason)
        }
        OnrampError::AuthenticationFailed(message) => message,
        OnrampError::Configuration(message) => format!("Email service is misconfigured: {}", message),
        OnrampError::Unknown(message) => {
            format!("Unable to {}: {}", operation.action(), message)
        }
        OnrampError::UserCancelled => "Email verification was cancelled.".to_string(),
        OnrampError::NotInitialized => "Email verification is not available yet.".to_string(),
    };

    tracing::debug!(%operation, %message, "Rewrote email verification error");
    OnrampError::EmailVerificationFailed(message)
}
