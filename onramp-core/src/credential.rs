//! Bearer credential lifecycle.
//!
//! This module provides:
//! - [`Credential`] - The end-user bearer token with its implicit expiry
//! - [`CredentialStore`] - The lifecycle interface the request pipeline consumes
//! - [`SecretCredentialStore`] - A [`CredentialStore`] persisted in any [`SecretStore`]
//!
//! Expiry is resolved in order: the explicit timestamp recorded when the
//! credential was issued, then the `exp` claim of the token when it is a JWT.
//! If neither is available the expiry is undetermined.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::model::CredentialField;
use crate::store::{Secret, SecretStore};

/// Default expiry buffer in seconds.
///
/// A credential expiring within this window is reported as expired so it is
/// not presented on a call that would outlive it.
const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 60;

/// Default storage namespace for credential keys.
pub const DEFAULT_NAMESPACE: &str = "onramp";

/// The end-user bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: Secret,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct JwtClaims {
    exp: Option<i64>,
}

impl Credential {
    /// Create a credential with no explicit expiry.
    pub fn new(token: impl Into<Secret>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Record an explicit expiry instant.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Record an expiry relative to now.
    ///
    /// Offsets beyond the representable range saturate to the latest or
    /// earliest instant, so a negative overflow still reads as expired.
    pub fn expiring_in(self, seconds: i64) -> Self {
        let expires_at = Duration::try_seconds(seconds)
            .and_then(|offset| Utc::now().checked_add_signed(offset))
            .unwrap_or(if seconds < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            });
        self.with_expiry(expires_at)
    }

    /// The bearer token.
    pub fn token(&self) -> &Secret {
        &self.token
    }

    /// The explicit expiry recorded at issuance, if any.
    pub fn explicit_expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// The effective expiry: explicit, else the JWT `exp` claim.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at.or_else(|| self.jwt_expiry())
    }

    /// Decode the `exp` claim without verifying the signature.
    ///
    /// Returns `None` for tokens that are not three-segment JWTs, whose payload
    /// is not base64url JSON, or that carry no numeric `exp`.
    pub fn jwt_expiry(&self) -> Option<DateTime<Utc>> {
        let mut segments = self.token.expose().split('.');
        let (_, payload, _) = (segments.next()?, segments.next()?, segments.next()?);
        if segments.next().is_some() {
            return None;
        }

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        let claims: JwtClaims = serde_json::from_slice(&bytes).ok()?;
        DateTime::from_timestamp(claims.exp?, 0)
    }

    /// Whether the credential is expired, or will be within `buffer`.
    ///
    /// `None` when the expiry cannot be determined.
    pub fn is_expired_within(&self, buffer: Duration) -> Option<bool> {
        self.expires_at().map(|exp| {
            exp.checked_sub_signed(buffer)
                .is_none_or(|deadline| deadline <= Utc::now())
        })
    }

    /// `Authorization` header value.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token.expose())
    }
}

/// Lifecycle interface for the bearer credential.
///
/// The request pipeline reads the credential before every bearer-mode call and
/// clears it when the backend answers 401. Implementations must tolerate
/// `clear` racing with `get` from concurrent calls.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current credential, or `None` if absent.
    async fn get(&self) -> Option<Credential>;

    /// Whether the credential is expired. `None` means undetermined, which
    /// callers treat as not expired.
    fn is_expired(&self, credential: &Credential) -> Option<bool>;

    /// Invalidate the stored credential. Returns whether the clear succeeded.
    async fn clear(&self) -> bool;

    /// Persist a newly issued credential. Returns whether it was stored.
    async fn store(&self, credential: Credential) -> bool;
}

/// [`CredentialStore`] persisted through a [`SecretStore`] backend.
///
/// The token lives at `{namespace}/credential/access_token` and the explicit
/// expiry, as unix seconds, at `{namespace}/credential/expires_at`. Backend
/// errors are logged and reported as absence or failure.
pub struct SecretCredentialStore<S: SecretStore> {
    store: S,
    namespace: String,
    expiry_buffer: Duration,
}

impl<S: SecretStore> SecretCredentialStore<S> {
    /// Create a credential store under the default namespace with the default
    /// expiry buffer.
    pub fn new(store: S) -> Self {
        Self {
            store,
            namespace: DEFAULT_NAMESPACE.to_string(),
            expiry_buffer: Duration::seconds(DEFAULT_EXPIRY_BUFFER_SECS),
        }
    }

    /// Use a custom key namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Use a custom expiry buffer.
    pub fn with_expiry_buffer(mut self, buffer: Duration) -> Self {
        self.expiry_buffer = buffer;
        self
    }

    /// The underlying secret store.
    pub fn backend(&self) -> &S {
        &self.store
    }

    fn key(&self, field: CredentialField) -> String {
        field.key(&self.namespace)
    }

    async fn read_expiry(&self) -> Option<DateTime<Utc>> {
        match self.store.get(&self.key(CredentialField::ExpiresAt)).await {
            Ok(Some(raw)) => raw
                .expose()
                .parse::<i64>()
                .ok()
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read credential expiry: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl<S: SecretStore> CredentialStore for SecretCredentialStore<S> {
    async fn get(&self) -> Option<Credential> {
        let token = match self.store.get(&self.key(CredentialField::AccessToken)).await {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => return None,
            Err(e) => {
                tracing::error!("Failed to read credential: {}", e);
                return None;
            }
        };

        let mut credential = Credential::new(token);
        if let Some(expires_at) = self.read_expiry().await {
            credential = credential.with_expiry(expires_at);
        }
        Some(credential)
    }

    fn is_expired(&self, credential: &Credential) -> Option<bool> {
        credential.is_expired_within(self.expiry_buffer)
    }

    async fn clear(&self) -> bool {
        let mut cleared = true;
        for field in [CredentialField::AccessToken, CredentialField::ExpiresAt] {
            if let Err(e) = self.store.delete(&self.key(field)).await {
                tracing::error!("Failed to clear credential {}: {}", field, e);
                cleared = false;
            }
        }

        if cleared {
            tracing::info!("Cleared stored credential");
        }
        cleared
    }

    async fn store(&self, credential: Credential) -> bool {
        let token_key = self.key(CredentialField::AccessToken);
        let expiry_key = self.key(CredentialField::ExpiresAt);

        // Expiry first, token last. On failure the token is dropped.
        let expiry = match credential.explicit_expiry() {
            Some(expires_at) => {
                self.store
                    .set(&expiry_key, &Secret::new(expires_at.timestamp().to_string()))
                    .await
            }
            None => self.store.delete(&expiry_key).await,
        };

        let result = match expiry {
            Ok(()) => self.store.set(&token_key, credential.token()).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                tracing::debug!("Stored credential");
                true
            }
            Err(e) => {
                tracing::error!("Failed to store credential: {}", e);
                if let Err(e) = self.store.delete(&token_key).await {
                    tracing::error!("Failed to drop partially stored credential: {}", e);
                }
                false
            }
        }
    }
}
