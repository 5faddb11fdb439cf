//! Platform connection API.

use onramp_core::{PlatformId, Secret};
use serde_json::{Map, Value};

use crate::client::OnrampClient;
use crate::error::{OnrampError, Result};
use crate::request::{Payload, RequestSpec};
use crate::resolve::EndpointCategory;
use crate::types::{
    AuthorizationUrlResponse, ConnectRequest, ConnectResponse, PlatformTokens, RefreshRequest,
    RefreshResponse,
};

/// Platform connection client.
///
/// Everything except [`authorization_url`](Self::authorization_url) requires
/// a verified email.
pub struct PlatformsApi {
    client: OnrampClient,
}

impl PlatformsApi {
    pub(crate) fn new(client: OnrampClient) -> Self {
        Self { client }
    }

    /// Get the URL that starts the platform's OAuth flow.
    pub async fn authorization_url(
        &self,
        platform: &PlatformId,
        redirect_uri: &str,
    ) -> Result<AuthorizationUrlResponse> {
        let spec = RequestSpec::post(
            EndpointCategory::AuthorizationUrl,
            platform_path(platform, "authorization-url")?,
        )
        .untyped(Payload::untyped([
            ("platform", Value::from(platform.as_str())),
            ("redirect_uri", Value::from(redirect_uri)),
        ]));
        self.client.execute(spec).await
    }

    /// Hand the tokens from a platform's OAuth SDK to the backend.
    pub async fn connect(
        &self,
        platform: &PlatformId,
        tokens: &PlatformTokens,
    ) -> Result<ConnectResponse> {
        let spec = RequestSpec::post(
            EndpointCategory::PlatformConnect,
            platform_path(platform, "connect")?,
        )
        .typed(ConnectRequest { platform, tokens });
        self.client.execute(spec).await
    }

    /// Revoke a platform connection. Returns whether the backend confirmed it.
    pub async fn revoke(&self, platform: &PlatformId) -> Result<bool> {
        let spec = RequestSpec::post(
            EndpointCategory::PlatformRevoke,
            platform_path(platform, "revoke")?,
        )
        .untyped(Payload::untyped([("platform", Value::from(platform.as_str()))]));
        let response: Map<String, Value> = self.client.execute(spec).await?;
        Ok(response.get("success").and_then(Value::as_bool) == Some(true))
    }

    /// Exchange a platform refresh token for a new access token.
    pub async fn refresh(
        &self,
        platform: &PlatformId,
        refresh_token: &Secret,
    ) -> Result<RefreshResponse> {
        let spec = RequestSpec::post(
            EndpointCategory::TokenRefresh,
            platform_path(platform, "refresh")?,
        )
        .typed(RefreshRequest { refresh_token });
        self.client.execute(spec).await
    }
}

fn platform_path(platform: &PlatformId, action: &str) -> Result<String> {
    if !platform.is_valid() {
        return Err(OnrampError::Configuration(format!(
            "invalid platform identifier {:?}",
            platform.as_str()
        )));
    }
    Ok(format!("api/v1/platforms/{}/{}", platform, action))
}
