//! Health API.

use crate::client::OnrampClient;
use crate::error::Result;
use crate::request::RequestSpec;
use crate::resolve::EndpointCategory;
use crate::types::HealthResponse;

/// Health API client.
///
/// Served at the root of the base URL, authenticated with the service key.
pub struct HealthApi {
    client: OnrampClient,
}

impl HealthApi {
    pub(crate) fn new(client: OnrampClient) -> Self {
        Self { client }
    }

    /// Check backend health.
    pub async fn check(&self) -> Result<HealthResponse> {
        self.client
            .execute(RequestSpec::get(EndpointCategory::HealthCheck, "health"))
            .await
    }

    /// Simple connectivity check - returns true if the backend answered.
    pub async fn is_reachable(&self) -> bool {
        self.check().await.is_ok()
    }
}
