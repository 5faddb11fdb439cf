//! Credential resolution.
//!
//! Decides, per endpoint category, which credential a call carries and builds
//! the destination URL and header set. Resolution only reads the credential
//! store; invalidation belongs to the executor.

use std::fmt;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use onramp_core::{Credential, CredentialStore, Secret};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use tokio::sync::RwLock;
use url::Url;

use crate::config::{ClientConfig, SDK_VERSION};
use crate::error::{OnrampError, Result};

pub const HEADER_SDK_VERSION: &str = "x-sdk-version";
pub const HEADER_ENVIRONMENT: &str = "x-environment";
pub const HEADER_TIMESTAMP: &str = "x-timestamp";
pub const HEADER_AUTH_TYPE: &str = "x-auth-type";
pub const HEADER_API_KEY: &str = "x-api-key";

const MISSING_CREDENTIAL: &str = "No authentication token found. Please verify your email first.";
const EXPIRED_CREDENTIAL: &str = "Authentication token expired. Please verify your email again.";

/// How a call authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Static service key; identifies the application.
    ServiceKey,
    /// End-user bearer credential.
    UserBearer,
}

impl AuthStrategy {
    /// Value of the `X-Auth-Type` marker.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::ServiceKey => "api_key",
            Self::UserBearer => "jwt",
        }
    }
}

/// Classification of backend endpoints by required authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointCategory {
    EmailVerification,
    AuthorizationUrl,
    HealthCheck,
    PlatformConnect,
    PlatformRevoke,
    PinSubmission,
    TokenRefresh,
}

impl EndpointCategory {
    /// The strategy every endpoint of this category uses.
    pub fn strategy(&self) -> AuthStrategy {
        match self {
            Self::EmailVerification | Self::AuthorizationUrl | Self::HealthCheck => {
                AuthStrategy::ServiceKey
            }
            Self::PlatformConnect | Self::PlatformRevoke | Self::PinSubmission | Self::TokenRefresh => {
                AuthStrategy::UserBearer
            }
        }
    }
}

impl fmt::Display for EndpointCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EmailVerification => "email_verification",
            Self::AuthorizationUrl => "authorization_url",
            Self::HealthCheck => "health_check",
            Self::PlatformConnect => "platform_connect",
            Self::PlatformRevoke => "platform_revoke",
            Self::PinSubmission => "pin_submission",
            Self::TokenRefresh => "token_refresh",
        };
        f.write_str(name)
    }
}

/// Destination and headers for one call.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub strategy: AuthStrategy,
}

/// Chooses the credential for each call and builds its headers.
///
/// Bearer-mode resolution holds the read side of the credential gate across
/// its `get` and `is_expired` calls; the executor takes the write side to
/// clear the credential. A resolution that starts while a clear is in
/// progress waits for it and then fails closed.
pub struct CredentialResolver {
    base_url: Url,
    service_key: Option<Secret>,
    static_headers: HeaderMap,
    store: Option<Arc<dyn CredentialStore>>,
    gate: RwLock<()>,
}

impl CredentialResolver {
    pub fn new(config: &ClientConfig, store: Option<Arc<dyn CredentialStore>>) -> Result<Self> {
        let base_url = config.parsed_base_url()?;

        let mut static_headers = HeaderMap::new();
        static_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        static_headers.insert(USER_AGENT, header_value(&config.user_agent(), "user agent")?);
        static_headers.insert(HEADER_SDK_VERSION, HeaderValue::from_static(SDK_VERSION));
        static_headers.insert(
            HEADER_ENVIRONMENT,
            HeaderValue::from_static(config.environment.as_str()),
        );

        if let Some(key) = &config.service_key {
            header_value(key.expose(), "service key")?;
        }

        Ok(Self {
            base_url,
            service_key: config.service_key.clone(),
            static_headers,
            store,
            gate: RwLock::new(()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn store(&self) -> Option<&Arc<dyn CredentialStore>> {
        self.store.as_ref()
    }

    pub(crate) fn gate(&self) -> &RwLock<()> {
        &self.gate
    }

    /// Build the absolute URL for an API path.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| OnrampError::Configuration(format!("invalid request path {:?}: {}", path, e)))
    }

    /// Resolve destination and headers for a call in `category`.
    pub async fn resolve(&self, category: EndpointCategory, path: &str) -> Result<ResolvedRequest> {
        let strategy = category.strategy();
        let url = self.url(path)?;
        let mut headers = self.static_headers.clone();
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        headers.insert(HEADER_TIMESTAMP, header_value(&timestamp, "timestamp")?);
        headers.insert(HEADER_AUTH_TYPE, HeaderValue::from_static(strategy.marker()));

        match strategy {
            AuthStrategy::ServiceKey => {
                if let Some(key) = &self.service_key {
                    let mut value = header_value(key.expose(), "service key")?;
                    value.set_sensitive(true);
                    headers.insert(HEADER_API_KEY, value);
                }
            }
            AuthStrategy::UserBearer => {
                let credential = self.current_credential().await?;
                let mut value = HeaderValue::from_str(&credential.authorization_header())
                    .map_err(|_| {
                        OnrampError::AuthenticationFailed(
                            "Stored authentication token is malformed.".to_string(),
                        )
                    })?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
        }

        tracing::debug!(%category, strategy = strategy.marker(), "Resolved request credentials");
        Ok(ResolvedRequest {
            url,
            headers,
            strategy,
        })
    }

    /// Fetch a usable bearer credential, failing closed.
    async fn current_credential(&self) -> Result<Credential> {
        let store = self.store.as_ref().ok_or(OnrampError::NotInitialized)?;
        let _read = self.gate.read().await;

        let credential = match store.get().await {
            Some(credential) => credential,
            None => {
                tracing::warn!("Bearer call attempted without a stored credential");
                return Err(OnrampError::AuthenticationFailed(MISSING_CREDENTIAL.to_string()));
            }
        };

        match store.is_expired(&credential) {
            Some(true) => {
                tracing::warn!("Stored credential has expired");
                Err(OnrampError::AuthenticationFailed(EXPIRED_CREDENTIAL.to_string()))
            }
            Some(false) => Ok(credential),
            None => {
                tracing::debug!("Credential expiry undetermined, treating as valid");
                Ok(credential)
            }
        }
    }

    /// Static headers sent on every call.
    pub fn static_headers(&self) -> &HeaderMap {
        &self.static_headers
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| OnrampError::Configuration(format!("{} is not a valid header value", what)))
}
