//! # Onramp Core
//!
//! Credential model and storage for the Onramp onboarding SDK.
//!
//! This crate provides:
//! - Domain types for platforms and credential fields
//! - The [`Credential`] bearer token and the [`CredentialStore`] lifecycle trait
//! - In-memory and (optionally) keyring-based secret storage
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use onramp_core::{Credential, CredentialStore, MemoryStore, SecretCredentialStore};
//!
//! async fn remember(token: String) -> bool {
//!     let store = SecretCredentialStore::new(MemoryStore::new());
//!     store.store(Credential::new(token).expiring_in(3600)).await
//! }
//! ```

pub mod credential;
pub mod model;
pub mod store;

// Re-export commonly used types at crate root
pub use model::{
    CredentialField,
    PlatformId,
};

pub use store::{
    Secret,
    SecretStore,
    StoreError,
    MemoryStore,
    create_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;

pub use credential::{
    Credential,
    CredentialStore,
    SecretCredentialStore,
};
