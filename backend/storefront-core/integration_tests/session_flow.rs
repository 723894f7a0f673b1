// End-to-end session tests over real HTTP against a mock storefront API
// Tests login, refresh on stale token, logout and restoring a persisted session

use crate::helpers::{client, now_secs, start_api, token_pair};

use storefront_core::Storefront;
use storefront_core::config::ClientConfig;
use storefront_core::error::{CoreError, SessionError};
use storefront_core::storage::KeyValueStore;
use storefront_core::tokens::LogoutOutcome;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

/// **VALUE**: Walks a whole session: login, authorized call, silent refresh, logout.
///
/// **WHY THIS MATTERS**: Each step hands tokens to the next. A wrong key name or header at
/// any stage only shows up when the pieces run together over HTTP.
#[tokio::test]
async fn given_logged_in_user_when_token_goes_stale_then_refreshed_and_logout_revokes() {
    // GIVEN: A server issuing a 60s access token, then a rotated pair on refresh
    let (server, transport) = start_api().await;
    let start = now_secs();
    let login_pair = token_pair(start + 60, start + 3600);
    let refreshed_pair = token_pair(start + 600, start + 7200);
    let login_access = login_pair["token"].as_str().unwrap().to_string();
    let refreshed_access = refreshed_pair["token"].as_str().unwrap().to_string();

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "username": "alice", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&login_pair))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/balance/7"))
        .and(header("Authorization", format!("Bearer {login_access}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "balance": 10.0 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({ "refreshToken": login_pair["refreshToken"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&refreshed_pair))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/balance/7"))
        .and(header("Authorization", format!("Bearer {refreshed_access}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "balance": 15.0 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/auth/refresh"))
        .and(body_json(
            json!({ "refreshToken": refreshed_pair["refreshToken"] }),
        ))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(transport, start);

    // WHEN: Logging in and reading the balance with a fresh token
    client.session.login("alice", "secret", true).await.unwrap();
    let first = client.session.get_balance("7").await.unwrap();

    // AND: Reading it again after the access token went stale
    client.clock.advance(Duration::from_secs(120));
    let second = client.session.get_balance("7").await.unwrap();

    // AND: Logging out
    let outcome = client.session.logout().await;

    // THEN: Each call used the right token and nothing is left locally
    assert_eq!(first, 10.0);
    assert_eq!(second, 15.0);
    assert!(matches!(outcome, LogoutOutcome::Revoked));
    assert!(client.store.get("token").is_none());
    assert!(client.store.get("refreshToken").is_none());
    assert!(!client.session.is_logged_in());
}

#[tokio::test]
async fn given_server_rejects_refresh_when_requesting_then_session_expired() {
    let (server, transport) = start_api().await;
    let start = now_secs();
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_pair(start + 60, start + 3600)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errorCode": 401003,
            "message": "Token expired",
            "status": 401
        })))
        .mount(&server)
        .await;

    let client = client(transport, start);
    client.session.login("alice", "secret", true).await.unwrap();
    client.clock.advance(Duration::from_secs(61));

    let err = client.session.get_all_users().await.unwrap_err();

    assert!(err.requires_login());
    match err {
        CoreError::Session(SessionError::SessionExpired { cause, .. }) => assert!(matches!(
            cause.as_deref(),
            Some(SessionError::RefreshTokenExpired { .. })
        )),
        other => panic!("expected SessionExpired, got {other:?}"),
    }
    assert!(client.store.get("token").is_none());
}

#[tokio::test]
async fn given_revoke_fails_when_logging_out_then_still_logged_out() {
    let (server, transport) = start_api().await;
    let start = now_secs();
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_pair(start + 600, start + 3600)),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client(transport, start);
    client.session.login("alice", "secret", true).await.unwrap();

    let outcome = client.session.logout().await;

    assert!(!outcome.is_clean());
    assert!(!client.session.is_logged_in());
    assert!(client.store.get("token").is_none());
}

/// **VALUE**: Verifies a keep-logged-in session and the cart survive a restart.
///
/// **WHY THIS MATTERS**: Restoring from the durable store is the only reason the store exists.
#[tokio::test]
async fn given_persisted_state_when_storefront_reopened_then_session_and_cart_restored() {
    // GIVEN: A storefront on disk, logged in with keep-logged-in and a filled cart
    let (server, _) = start_api().await;
    let start = now_secs();
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_pair(start + 600, start + 3600)),
        )
        .mount(&server)
        .await;

    let data_dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig::default();
    config.api.base_url = format!("{}/api/", server.uri());

    let first = Storefront::open(&config, data_dir.path()).unwrap();
    first.session.login("alice", "secret", true).await.unwrap();
    first
        .cart
        .lock()
        .unwrap()
        .add_item("apple", "COUNT", "0,99", "3")
        .unwrap();
    drop(first);

    // WHEN: Opening a new storefront on the same directory
    let second = Storefront::open(&config, data_dir.path()).unwrap();

    // THEN: Still logged in, cart intact
    assert!(second.session.is_logged_in());
    let cart = second.cart.lock().unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.total_price(), "2.97");
}

#[tokio::test]
async fn given_session_without_keep_logged_in_when_reopened_then_logged_out() {
    let (server, _) = start_api().await;
    let start = now_secs();
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_pair(start + 600, start + 3600)),
        )
        .mount(&server)
        .await;

    let data_dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig::default();
    config.api.base_url = format!("{}/api/", server.uri());

    let first = Storefront::open(&config, data_dir.path()).unwrap();
    first.session.login("alice", "secret", false).await.unwrap();
    assert!(first.session.is_logged_in());
    drop(first);

    let second = Storefront::open(&config, data_dir.path()).unwrap();

    assert!(!second.session.is_logged_in());
}

/// **VALUE**: Verifies a damaged state file does not stop the storefront from opening.
///
/// **WHY THIS MATTERS**: A crash or a full disk can leave the state file truncated. The user
/// should land on a login screen with an empty cart, not a client that refuses to start.
///
/// **BUG THIS CATCHES**: Would catch the file store's parse failure propagating out of
/// `Storefront::open`.
#[tokio::test]
async fn given_corrupt_state_file_when_storefront_opened_then_starts_logged_out_and_empty() {
    // GIVEN: A data directory whose state file is cut off mid-object
    let data_dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::default();
    let state_file = config.store_path(data_dir.path());
    std::fs::write(&state_file, r#"{"token": "abc", "cart": "[{"#).unwrap();

    // WHEN: Opening the storefront
    let storefront = Storefront::open(&config, data_dir.path()).unwrap();

    // THEN: Logged out, empty cart, and the damaged file kept for inspection
    assert!(!storefront.session.is_logged_in());
    assert!(storefront.cart.lock().unwrap().is_empty());
    let mut corrupt_name = state_file.into_os_string();
    corrupt_name.push(".corrupt");
    assert!(std::path::PathBuf::from(corrupt_name).exists());
}
