//! Client construction for CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use onramp_client::{ClientConfig, OnrampClient};
use onramp_core::{CredentialStore, SecretCredentialStore, create_store};
use tracing::debug;

/// Load configuration and build a client backed by the chosen secret store.
pub fn build_client(config_path: Option<&Path>, memory_store: bool) -> Result<OnrampClient> {
    let config = ClientConfig::load(config_path).context("failed to load configuration")?;
    debug!(
        environment = %config.environment,
        has_service_key = config.service_key.is_some(),
        "Loaded configuration"
    );

    let store: Arc<dyn CredentialStore> =
        Arc::new(SecretCredentialStore::new(create_store(!memory_store)));

    OnrampClient::builder()
        .config(config)
        .credential_store(store)
        .build()
        .context("failed to build client")
}
