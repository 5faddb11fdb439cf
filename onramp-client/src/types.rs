//! Request and response bodies of the backend endpoints.
//!
//! Response types tolerate missing optional fields and ignore unknown keys, so
//! both the enveloped and the legacy response shapes decode into them.

use chrono::{DateTime, Utc};
use onramp_core::{Credential, PlatformId, Secret};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Email verification
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RequestCodeRequest {
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestCodeResponse {
    #[serde(default)]
    pub message: Option<String>,
    /// Seconds until the emailed code stops being accepted.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

/// Response of `verify-code`. Carries the bearer credential on success.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyCodeResponse {
    #[serde(default, alias = "access_token", alias = "jwt")]
    pub token: Option<Secret>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_new_user: bool,
}

impl VerifyCodeResponse {
    /// The credential issued by this response, if any.
    ///
    /// An explicit `expires_at` wins over `expires_in`; without either, expiry
    /// is left to the token itself.
    pub fn credential(&self) -> Option<Credential> {
        let token = self.token.as_ref().filter(|t| !t.is_empty())?;
        let credential = Credential::new(token.clone());
        Some(match (self.expires_at, self.expires_in) {
            (Some(at), _) => credential.with_expiry(at),
            (None, Some(seconds)) => credential.expiring_in(seconds),
            (None, None) => credential,
        })
    }
}

/// Outcome of a successful email verification.
///
/// The bearer credential itself has been handed to the credential store and
/// is not exposed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSession {
    pub user_id: Option<String>,
    pub is_new_user: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailStatusRequest {
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailStatusResponse {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Platforms
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationUrlResponse {
    #[serde(alias = "url", alias = "authorizationUrl")]
    pub authorization_url: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Tokens produced by a platform's own OAuth SDK.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformTokens {
    pub access_token: Secret,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

impl PlatformTokens {
    pub fn new(access_token: impl Into<Secret>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            id_token: None,
            expires_at: None,
            scopes: Vec::new(),
        }
    }

    pub fn with_refresh_token(mut self, token: impl Into<Secret>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn with_id_token(mut self, token: impl Into<Secret>) -> Self {
        self.id_token = Some(token.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ConnectRequest<'a> {
    pub platform: &'a PlatformId,
    #[serde(flatten)]
    pub tokens: &'a PlatformTokens,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectResponse {
    #[serde(default)]
    pub platform: Option<PlatformId>,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a Secret,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: Secret,
    #[serde(default)]
    pub refresh_token: Option<Secret>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// PIN and health
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PinRequest<'a> {
    pub pin: &'a Secret,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PinResponse {
    #[serde(default)]
    pub accepted: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl HealthResponse {
    /// Whether the backend reported itself healthy.
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_deref(), Some("ok" | "healthy" | "up"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_verify_response_token_aliases() {
        let response: VerifyCodeResponse =
            serde_json::from_value(json!({"success": true, "access_token": "abc"})).unwrap();
        assert_eq!(response.token.unwrap().expose(), "abc");
        assert!(!response.is_new_user);
    }

    #[test]
    fn test_verify_response_credential_expiry() {
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let response = VerifyCodeResponse {
            token: Some(Secret::new("t")),
            expires_at: Some(at),
            expires_in: Some(60),
            ..Default::default()
        };
        assert_eq!(response.credential().unwrap().explicit_expiry(), Some(at));

        let response = VerifyCodeResponse {
            token: Some(Secret::new("t")),
            expires_in: Some(3600),
            ..Default::default()
        };
        let expiry = response.credential().unwrap().explicit_expiry().unwrap();
        assert!(expiry > Utc::now() + chrono::Duration::seconds(3500));
    }

    #[test]
    fn test_verify_response_without_token() {
        assert!(VerifyCodeResponse::default().credential().is_none());
        let empty = VerifyCodeResponse {
            token: Some(Secret::new("")),
            ..Default::default()
        };
        assert!(empty.credential().is_none());
    }

    #[test]
    fn test_connect_request_shape() {
        let platform = PlatformId::new("Google");
        let tokens = PlatformTokens::new("access").with_id_token("id");
        let body = serde_json::to_value(ConnectRequest {
            platform: &platform,
            tokens: &tokens,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"platform": "google", "access_token": "access", "id_token": "id"})
        );
    }

    #[test]
    fn test_pin_request_exposes_pin_on_wire_only() {
        let pin = Secret::new("4321");
        let request = PinRequest { pin: &pin };
        assert_eq!(serde_json::to_value(&request).unwrap(), json!({"pin": "4321"}));
        assert!(!format!("{:?}", request).contains("4321"));
    }

    #[test]
    fn test_health_status() {
        let health: HealthResponse = serde_json::from_value(json!({"status": "ok"})).unwrap();
        assert!(health.is_healthy());
        assert!(!HealthResponse::default().is_healthy());
    }
}
