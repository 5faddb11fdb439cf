//! Concurrent calls sharing one credential store.
//!
//! Bearer-mode resolution reads the credential under the shared side of the
//! client's credential gate; a 401 clears it under the exclusive side. A call
//! that starts resolving while a clear is running waits for the clear and then
//! fails without contacting the backend.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{CountingStore, client, fresh_credential};
use onramp_client::OnrampError;
use onramp_core::{Credential, CredentialStore, MemoryStore, SecretCredentialStore, Secret};
use serde_json::json;
use tokio::sync::Notify;
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Store whose `clear` announces itself and then takes a while.
struct SlowClearStore {
    inner: SecretCredentialStore<MemoryStore>,
    clear_started: Notify,
    clears: AtomicUsize,
}

#[async_trait]
impl CredentialStore for SlowClearStore {
    async fn get(&self) -> Option<Credential> {
        self.inner.get().await
    }

    fn is_expired(&self, credential: &Credential) -> Option<bool> {
        self.inner.is_expired(credential)
    }

    async fn clear(&self) -> bool {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.clear_started.notify_one();
        tokio::time::sleep(Duration::from_millis(150)).await;
        self.inner.clear().await
    }

    async fn store(&self, credential: Credential) -> bool {
        self.inner.store(credential).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn call_started_during_clear_fails_closed() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/pin"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let inner = SecretCredentialStore::new(MemoryStore::new());
    assert!(inner.store(fresh_credential("session-token")).await);
    let store = Arc::new(SlowClearStore {
        inner,
        clear_started: Notify::new(),
        clears: AtomicUsize::new(0),
    });
    let client = client(&server, store.clone());

    let first = {
        let client = client.clone();
        tokio::spawn(async move { client.pin().submit(&Secret::new("1111")).await })
    };

    store.clear_started.notified().await;
    let second = client.pin().submit(&Secret::new("2222")).await;

    assert_eq!(
        first.await.unwrap().unwrap_err(),
        OnrampError::AuthenticationFailed(
            "Authentication expired. Please verify your email again.".into()
        )
    );
    assert_eq!(
        second.unwrap_err(),
        OnrampError::AuthenticationFailed(
            "No authentication token found. Please verify your email first.".into()
        )
    );
    assert_eq!(store.clears.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bearer_calls_share_credential() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/platforms/google/revoke"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true}))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(8)
        .mount(&server)
        .await;

    let store = CountingStore::with(fresh_credential("session-token")).await;
    let client = client(&server, store.clone());

    let calls = (0..8).map(|_| {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .platforms()
                .revoke(&onramp_core::PlatformId::new("google"))
                .await
        })
    });

    for call in calls.collect::<Vec<_>>() {
        assert!(call.await.unwrap().unwrap());
    }
    assert_eq!(store.gets(), 8);
    assert_eq!(store.clears(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_401s_each_clear_once() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/pin"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(50)))
        .mount(&server)
        .await;

    let store = CountingStore::with(fresh_credential("session-token")).await;
    let client = client(&server, store.clone());

    let calls: Vec<_> = (0..3)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.pin().submit(&Secret::new("0000")).await })
        })
        .collect();

    let mut sent = 0;
    for call in calls {
        let err = call.await.unwrap().unwrap_err();
        assert!(err.is_auth_error());
        if err.message() == Some("Authentication expired. Please verify your email again.") {
            sent += 1;
        }
    }

    assert_eq!(store.clears(), sent);
    assert!(store.current().await.is_none());
}
