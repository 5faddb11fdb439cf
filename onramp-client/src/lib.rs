//! Onramp Client Library
//!
//! Authenticated request pipeline for the Onramp onboarding backend: email
//! verification, platform OAuth connections and PIN submission.
//!
//! # Overview
//!
//! Every call belongs to an [`EndpointCategory`], and the category alone
//! decides how it is authenticated:
//!
//! - **Service key**: email verification, authorization URLs and health checks
//!   carry the static service key configured on the client.
//! - **User bearer**: connect, revoke, refresh and PIN submission carry the
//!   short-lived credential issued by email verification. The credential is
//!   read from a [`CredentialStore`](onramp_core::CredentialStore) before every
//!   call; a missing or expired credential fails the call without contacting
//!   the backend, and a 401 clears it.
//!
//! Responses are decoded through the backend's `{"success": ...}` envelope,
//! falling back to the bare payload for older endpoints. All failures surface
//! as a single [`OnrampError`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use onramp_client::{ClientConfig, OnrampClient, PlatformTokens};
//! use onramp_core::{MemoryStore, PlatformId, SecretCredentialStore};
//!
//! #[tokio::main]
//! async fn main() -> onramp_client::Result<()> {
//!     let config = ClientConfig::load(None)?;
//!     let client = OnrampClient::builder()
//!         .config(config)
//!         .credential_store(Arc::new(SecretCredentialStore::new(MemoryStore::new())))
//!         .build()?;
//!
//!     client.email().request_code("user@example.com").await?;
//!     client.email().verify_code("user@example.com", "123456").await?;
//!
//!     let google = PlatformId::new("google");
//!     let connected = client
//!         .platforms()
//!         .connect(&google, &PlatformTokens::new("ya29.token"))
//!         .await?;
//!     println!("connected: {}", connected.connected);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! [`ClientConfig::load`] merges defaults, a TOML file and `ONRAMP_*`
//! environment variables:
//!
//! ```toml
//! base_url = "https://api.onramp.dev"
//! service_key = "sk_live_..."
//! environment = "production"
//! detailed_logging = false
//! ```
//!
//! # Feature Flags
//!
//! - `config-file` (default): TOML config file loading

pub mod api;
pub mod classify;
mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod request;
pub mod resolve;
pub mod types;
pub mod verification;

// Re-export main types from client module
pub use client::{ClientBuilder, OnrampClient};

// Re-export from other modules
pub use config::{ClientConfig, Environment};
pub use envelope::ResponseEnvelope;
pub use error::{ErrorKind, OnrampError, Result};
pub use request::{HttpMethod, Payload, RequestSpec};
pub use resolve::{AuthStrategy, EndpointCategory};
pub use types::{
    AuthorizationUrlResponse, ConnectResponse, EmailStatusResponse, HealthResponse,
    PinResponse, PlatformTokens, RefreshResponse, RequestCodeResponse, VerifiedSession,
};
pub use verification::EmailOperation;
