//! Integration tests for the bearer credential lifecycle.
//!
//! These tests exercise `SecretCredentialStore` over each secret backend:
//! - Storing and reading back a credential
//! - Key layout in the backend
//! - Expiry reporting
//! - Clearing

use chrono::{Duration, Utc};
use onramp_core::{
    Credential, CredentialStore, MemoryStore, Secret, SecretCredentialStore, SecretStore,
    create_store,
};

#[cfg(feature = "keyring-store")]
use onramp_core::KeyringStore;

#[tokio::test]
async fn test_credential_keys_in_backend() {
    let store = SecretCredentialStore::new(MemoryStore::new());
    let expires_at = Utc::now() + Duration::hours(2);
    assert!(store.store(Credential::new("tok").with_expiry(expires_at)).await);

    let backend = store.backend();
    assert_eq!(
        backend.get("onramp/credential/access_token").await.unwrap(),
        Some(Secret::new("tok"))
    );
    assert_eq!(
        backend.get("onramp/credential/expires_at").await.unwrap(),
        Some(Secret::new(expires_at.timestamp().to_string()))
    );
}

#[tokio::test]
async fn test_namespaced_store_uses_its_own_keys() {
    let store = SecretCredentialStore::new(MemoryStore::new()).with_namespace("staging");
    assert!(store.store(Credential::new("tok")).await);

    assert!(store.backend().exists("staging/credential/access_token").await.unwrap());
    assert!(!store.backend().exists("onramp/credential/access_token").await.unwrap());
}

#[tokio::test]
async fn test_lifecycle_over_boxed_backend() {
    let store = SecretCredentialStore::new(create_store(false));

    assert!(store.get().await.is_none());

    assert!(store.store(Credential::new("first").expiring_in(3600)).await);
    let credential = store.get().await.unwrap();
    assert_eq!(credential.token().expose(), "first");
    assert_eq!(store.is_expired(&credential), Some(false));

    // Replacing the credential replaces its expiry too.
    assert!(store.store(Credential::new("second")).await);
    let credential = store.get().await.unwrap();
    assert_eq!(credential.token().expose(), "second");
    assert_eq!(credential.explicit_expiry(), None);
    assert_eq!(store.is_expired(&credential), None);

    assert!(store.clear().await);
    assert!(store.get().await.is_none());
    assert!(store.clear().await, "clearing twice should succeed");
}

#[tokio::test]
async fn test_custom_buffer_changes_expiry_verdict() {
    let credential = Credential::new("tok").expiring_in(120);

    let default_buffer = SecretCredentialStore::new(MemoryStore::new());
    assert_eq!(default_buffer.is_expired(&credential), Some(false));

    let wide_buffer = SecretCredentialStore::new(MemoryStore::new())
        .with_expiry_buffer(Duration::minutes(5));
    assert_eq!(wide_buffer.is_expired(&credential), Some(true));
}

#[cfg(feature = "keyring-store")]
#[tokio::test]
async fn test_keyring_lifecycle() {
    // Skip this test if keyring is not available
    let keyring = match KeyringStore::try_new("onramp-test-lifecycle") {
        Ok(s) => s,
        Err(_) => {
            eprintln!("Skipping test: keyring unavailable");
            return;
        }
    };
    let store = SecretCredentialStore::new(keyring);

    if !store.store(Credential::new("keyring-token").expiring_in(600)).await {
        eprintln!("Skipping test: keyring set failed");
        return;
    }

    // If get returns None, the keyring daemon isn't running
    let Some(credential) = store.get().await else {
        eprintln!("Skipping test: keyring get returned None - daemon not running");
        return;
    };
    assert_eq!(credential.token().expose(), "keyring-token");

    assert!(store.clear().await);
    assert!(store.get().await.is_none());
}
