//! Test doubles shared by the unit tests.

use crate::error::{ApiError, TransportError};
use crate::storage::{KeyValueStore, MemoryStore};
use crate::tokens::{CredentialStore, ManualClock, TokenLifecycle};
use crate::transport::{Headers, Method, Transport};

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};

/// Fixed "now" every test clock starts at.
pub(crate) const NOW_SECS: u64 = 1_700_000_000;

static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(0);

pub(crate) fn now() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(NOW_SECS)
}

/// Unsigned JWT expiring `exp_secs` after the epoch. Every call is unique.
pub(crate) fn jwt(exp_secs: u64) -> String {
    let id = TOKEN_COUNTER.fetch_add(1, Ordering::SeqCst);
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload =
        URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"alice","jti":"{id}","exp":{exp_secs}}}"#));
    format!("{header}.{payload}.signature")
}

/// JWT expiring `offset` seconds after the test "now" (negative = in the past).
pub(crate) fn jwt_in(offset: i64) -> String {
    jwt(NOW_SECS.saturating_add_signed(offset))
}

pub(crate) fn token_pair_response(access_offset: i64, refresh_offset: i64) -> Value {
    json!({ "token": jwt_in(access_offset), "refreshToken": jwt_in(refresh_offset) })
}

pub(crate) fn api_error(error_code: u32, status: u16) -> TransportError {
    TransportError::api(ApiError::new(error_code, "rejected", status))
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: Headers,
}

/// Scripted transport. Responses are queued per (method, path); the last
/// queued response is repeated once the queue is down to one.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<(String, String), VecDeque<Result<Value, TransportError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) fn respond(&self, method: Method, path: &str, result: Result<Value, TransportError>) {
        self.routes
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(result);
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, method: Method, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: &Headers,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body: body.cloned(),
            headers: headers.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut routes = self.routes.lock().unwrap();
        let queue = routes
            .get_mut(&(method.to_string(), path.to_string()))
            .unwrap_or_else(|| panic!("no response scripted for {method} {path}"));
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

/// A lifecycle over an in-memory store and a clock frozen at [`now`].
pub(crate) struct Harness {
    pub transport: Arc<MockTransport>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub tokens: TokenLifecycle,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_transport(MockTransport::new())
    }

    pub(crate) fn with_transport(transport: MockTransport) -> Self {
        let store = Arc::new(MemoryStore::new());
        store.set("keepLoggedIn", "true").unwrap();
        Self::with_parts(Arc::new(transport), store)
    }

    pub(crate) fn with_parts(transport: Arc<MockTransport>, store: Arc<MemoryStore>) -> Self {
        let clock = Arc::new(ManualClock::new(now()));
        let tokens = TokenLifecycle::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            CredentialStore::new(Arc::clone(&store) as Arc<dyn KeyValueStore>),
            Arc::clone(&clock) as Arc<dyn crate::tokens::Clock>,
        );
        Self {
            transport,
            store,
            clock,
            tokens,
        }
    }

    /// Log in with tokens expiring at the given offsets from now.
    pub(crate) fn sign_in(&self, access_offset: i64, refresh_offset: i64) {
        self.tokens
            .handle_tokens(&jwt_in(access_offset), &jwt_in(refresh_offset))
            .unwrap();
    }
}
