//! Test helpers for storefront integration tests.
//!
//! - Minting unsigned JWTs with a chosen expiry
//! - Starting a mock storefront API
//! - Wiring a session client onto a manual clock

use storefront_core::session::SessionClient;
use storefront_core::storage::{KeyValueStore, MemoryStore};
use storefront_core::tokens::{Clock, CredentialStore, ManualClock, TokenLifecycle};
use storefront_core::transport::{HttpTransport, Transport};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use wiremock::MockServer;

static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Whole seconds since the epoch, matching JWT `exp` granularity.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs()
}

pub fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Unsigned JWT expiring at `exp_secs`. Every call yields a distinct token.
pub fn jwt(exp_secs: u64) -> String {
    let id = TOKEN_COUNTER.fetch_add(1, Ordering::SeqCst);
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload =
        URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"alice","jti":"{id}","exp":{exp_secs}}}"#));
    format!("{header}.{payload}.signature")
}

pub fn token_pair(access_exp: u64, refresh_exp: u64) -> Value {
    json!({ "token": jwt(access_exp), "refreshToken": jwt(refresh_exp) })
}

/// Mock API server plus a transport pointed at its `/api/` prefix.
pub async fn start_api() -> (MockServer, HttpTransport) {
    let server = MockServer::start().await;
    let transport = HttpTransport::new(&format!("{}/api", server.uri()))
        .expect("mock server URL should parse");
    (server, transport)
}

pub struct Client {
    pub session: SessionClient,
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
}

/// Session client over `transport` with a clock frozen at `start_secs`.
pub fn client(transport: HttpTransport, start_secs: u64) -> Client {
    let transport: Arc<dyn Transport> = Arc::new(transport);
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(at(start_secs)));

    let tokens = TokenLifecycle::new(
        Arc::clone(&transport),
        CredentialStore::new(Arc::clone(&store) as Arc<dyn KeyValueStore>),
        Arc::clone(&clock) as Arc<dyn Clock>,
    );

    Client {
        session: SessionClient::new(transport, tokens),
        clock,
        store,
    }
}
