use std::sync::Arc;
use std::time::Instant;

use onramp_core::{Credential, CredentialStore};
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::api::{EmailApi, HealthApi, PinApi, PlatformsApi};
use crate::classify::{TransportFailure, classify_status, classify_transport};
use crate::config::ClientConfig;
use crate::envelope;
use crate::error::{OnrampError, Result};
use crate::request::RequestSpec;
use crate::resolve::{AuthStrategy, CredentialResolver};

const AUTH_EXPIRED: &str = "Authentication expired. Please verify your email again.";

/// Client for the Onramp onboarding backend.
///
/// Every call goes through the same pipeline: the endpoint category picks the
/// credential, the request is sent exactly once, and the response is decoded
/// through the envelope or classified into an [`OnrampError`]. Clones share
/// one connection pool and one credential store.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use onramp_client::OnrampClient;
/// use onramp_core::{MemoryStore, SecretCredentialStore};
///
/// # async fn example() -> onramp_client::Result<()> {
/// let client = OnrampClient::builder()
///     .base_url("http://localhost:8080")
///     .service_key("sk_test")
///     .credential_store(Arc::new(SecretCredentialStore::new(MemoryStore::new())))
///     .build()?;
///
/// client.email().request_code("user@example.com").await?;
/// let session = client.email().verify_code("user@example.com", "123456").await?;
/// println!("verified, new user: {}", session.is_new_user);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OnrampClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    http: reqwest::Client,
    resolver: CredentialResolver,
    config: ClientConfig,
}

impl OnrampClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client from configuration alone, without a credential store.
    ///
    /// Bearer-mode calls on such a client fail with
    /// [`OnrampError::NotInitialized`].
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn base_url(&self) -> &Url {
        self.inner.resolver.base_url()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub(crate) fn credential_store(&self) -> Option<&Arc<dyn CredentialStore>> {
        self.inner.resolver.store()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Email verification endpoints.
    pub fn email(&self) -> EmailApi {
        EmailApi::new(self.clone())
    }

    /// Platform authorization, connect, revoke and refresh endpoints.
    pub fn platforms(&self) -> PlatformsApi {
        PlatformsApi::new(self.clone())
    }

    /// PIN submission.
    pub fn pin(&self) -> PinApi {
        PinApi::new(self.clone())
    }

    /// Backend health.
    pub fn health(&self) -> HealthApi {
        HealthApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Credential lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether a non-expired bearer credential is stored.
    pub async fn is_authenticated(&self) -> bool {
        let Some(store) = self.credential_store() else {
            return false;
        };
        let _read = self.inner.resolver.gate().read().await;
        match store.get().await {
            Some(credential) => store.is_expired(&credential) != Some(true),
            None => false,
        }
    }

    /// Drop the stored bearer credential.
    pub async fn sign_out(&self) -> Result<()> {
        let store = self.credential_store().ok_or(OnrampError::NotInitialized)?;
        let _write = self.inner.resolver.gate().write().await;
        if store.clear().await {
            info!("Signed out");
            Ok(())
        } else {
            error!("Credential store refused to clear");
            Err(OnrampError::Unknown("Failed to clear stored credential".to_string()))
        }
    }

    /// Hand a freshly issued credential to the store.
    pub(crate) async fn persist_credential(&self, credential: Credential) -> Result<()> {
        let store = self.credential_store().ok_or(OnrampError::NotInitialized)?;
        let _write = self.inner.resolver.gate().write().await;
        if store.store(credential).await {
            debug!("Stored bearer credential");
            Ok(())
        } else {
            error!("Credential store refused the new credential");
            Err(OnrampError::AuthenticationFailed(
                "Failed to persist credential".to_string(),
            ))
        }
    }

    /// Invalidate the credential after the backend rejected it.
    async fn invalidate_credential(&self) {
        let Some(store) = self.credential_store() else {
            return;
        };
        let _write = self.inner.resolver.gate().write().await;
        if store.clear().await {
            warn!("Backend rejected bearer credential, cleared stored credential");
        } else {
            error!("Backend rejected bearer credential, but clearing it failed");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request execution
    // ─────────────────────────────────────────────────────────────────────────

    /// Execute one call and decode its response into `T`.
    #[instrument(skip(self, spec), fields(method = %spec.method, path = %spec.path, category = %spec.category))]
    pub async fn execute<T, B>(&self, spec: RequestSpec<B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let resolved = self.inner.resolver.resolve(spec.category, &spec.path).await?;

        let mut request = self
            .inner
            .http
            .request(spec.method.into(), resolved.url)
            .headers(resolved.headers);

        if let Some(payload) = &spec.payload {
            let body = payload.to_json()?;
            if self.inner.config.detailed_logging {
                debug!(body = %String::from_utf8_lossy(&body), "Request body");
            }
            request = request.body(body);
        }

        debug!("Sending request");
        let started = Instant::now();

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = classify_transport(&TransportFailure::from(&e));
                warn!(error = %e, elapsed_ms = started.elapsed().as_millis() as u64, "Request failed before a response");
                return Err(err);
            }
        };

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // 429 is decided from the headers alone; the body is never read.
        if status == StatusCode::TOO_MANY_REQUESTS {
            let err = OnrampError::RateLimitExceeded(rate_limit_message(retry_after.as_deref()));
            warn!(status = status.as_u16(), elapsed_ms = started.elapsed().as_millis() as u64, kind = %err.kind(), error = %err, "Request failed");
            return Err(err);
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, %status, "Failed to read response body");
                return Err(classify_transport(&TransportFailure::from(&e)));
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        if self.inner.config.detailed_logging {
            debug!(body = %String::from_utf8_lossy(&body), "Response body");
        }

        let result = self
            .interpret(resolved.strategy, status, &body)
            .await;
        match &result {
            Ok(_) => info!(status = status.as_u16(), elapsed_ms, "Request succeeded"),
            Err(e) => warn!(status = status.as_u16(), elapsed_ms, kind = %e.kind(), error = %e, "Request failed"),
        }
        result
    }

    /// Apply the status policy, then the envelope decoder.
    async fn interpret<T: DeserializeOwned>(
        &self,
        strategy: AuthStrategy,
        status: StatusCode,
        body: &[u8],
    ) -> Result<T> {
        if status.is_success() {
            return envelope::decode(body, status.as_u16());
        }

        match status {
            StatusCode::UNAUTHORIZED if strategy == AuthStrategy::UserBearer => {
                self.invalidate_credential().await;
                Err(OnrampError::AuthenticationFailed(AUTH_EXPIRED.to_string()))
            }
            _ => Err(classify_status(status.as_u16(), body)),
        }
    }
}

fn rate_limit_message(retry_after: Option<&str>) -> String {
    match retry_after.and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(seconds) => format!("Rate limit exceeded. Please try again in {} seconds.", seconds),
        None => "Rate limit exceeded. Please try again later.".to_string(),
    }
}

/// Builder for creating an [`OnrampClient`].
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn CredentialStore>>,
}

impl ClientBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the backend base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the static service key.
    pub fn service_key(mut self, key: impl Into<String>) -> Self {
        self.config.service_key = Some(onramp_core::Secret::new(key));
        self
    }

    /// Set the environment marker.
    pub fn environment(mut self, environment: crate::config::Environment) -> Self {
        self.config.environment = environment;
        self
    }

    /// Log request and response bodies at debug level.
    pub fn detailed_logging(mut self, enabled: bool) -> Self {
        self.config.detailed_logging = enabled;
        self
    }

    /// Set the credential store consulted by bearer-mode calls.
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<OnrampClient> {
        self.config.validate()?;
        let resolver = CredentialResolver::new(&self.config, self.store)?;

        let http = reqwest::Client::builder()
            .read_timeout(self.config.request_timeout())
            .timeout(self.config.resource_timeout())
            .build()
            .map_err(|e| OnrampError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(OnrampClient {
            inner: Arc::new(ClientInner {
                http,
                resolver,
                config: self.config,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_to_production_url() {
        let client = ClientBuilder::new().build().unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.onramp.dev/");
    }

    #[test]
    fn test_builder_rejects_invalid_url() {
        let result = ClientBuilder::new().base_url("::not a url::").build();
        assert!(matches!(result, Err(OnrampError::Configuration(_))));
    }

    #[test]
    fn test_builder_normalizes_trailing_slash() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:8080/backend")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/backend/");
    }

    #[test]
    fn test_rate_limit_message() {
        assert_eq!(
            rate_limit_message(Some("30")),
            "Rate limit exceeded. Please try again in 30 seconds."
        );
        assert_eq!(
            rate_limit_message(Some("Wed, 21 Oct 2026 07:28:00 GMT")),
            "Rate limit exceeded. Please try again later."
        );
        assert_eq!(rate_limit_message(None), "Rate limit exceeded. Please try again later.");
    }

    #[tokio::test]
    async fn test_sign_out_without_store() {
        let client = ClientBuilder::new().build().unwrap();
        assert_eq!(client.sign_out().await, Err(OnrampError::NotInitialized));
        assert!(!client.is_authenticated().await);
    }
}
