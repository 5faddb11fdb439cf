//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use onramp_client::OnrampClient;
use onramp_core::{Credential, CredentialStore, MemoryStore, SecretCredentialStore};
use wiremock::MockServer;

pub const SERVICE_KEY: &str = "sk_test_123";

/// Credential store double that counts lifecycle calls.
pub struct CountingStore {
    inner: SecretCredentialStore<MemoryStore>,
    refuse_writes: bool,
    gets: AtomicUsize,
    clears: AtomicUsize,
    stores: AtomicUsize,
}

impl CountingStore {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::build(false))
    }

    pub fn refusing_writes() -> Arc<Self> {
        Arc::new(Self::build(true))
    }

    pub async fn with(credential: Credential) -> Arc<Self> {
        let store = Self::build(false);
        assert!(store.inner.store(credential).await);
        Arc::new(store)
    }

    fn build(refuse_writes: bool) -> Self {
        Self {
            inner: SecretCredentialStore::new(MemoryStore::new()),
            refuse_writes,
            gets: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
            stores: AtomicUsize::new(0),
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    pub async fn current(&self) -> Option<Credential> {
        self.inner.get().await
    }
}

#[async_trait]
impl CredentialStore for CountingStore {
    async fn get(&self) -> Option<Credential> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get().await
    }

    fn is_expired(&self, credential: &Credential) -> Option<bool> {
        self.inner.is_expired(credential)
    }

    async fn clear(&self) -> bool {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear().await
    }

    async fn store(&self, credential: Credential) -> bool {
        self.stores.fetch_add(1, Ordering::SeqCst);
        if self.refuse_writes {
            return false;
        }
        self.inner.store(credential).await
    }
}

/// A credential valid for the next hour.
pub fn fresh_credential(token: &str) -> Credential {
    Credential::new(token).expiring_in(3600)
}

pub fn client(server: &MockServer, store: Arc<dyn CredentialStore>) -> OnrampClient {
    OnrampClient::builder()
        .base_url(server.uri())
        .service_key(SERVICE_KEY)
        .credential_store(store)
        .build()
        .unwrap()
}
