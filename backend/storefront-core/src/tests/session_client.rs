// Unit tests for SessionClient
// Tests authorization refresh, session expiry, client-side validation and endpoint paths

use crate::cart::CartStore;
use crate::error::{CoreError, SessionError};
use crate::session::{HistoryQuery, NewUser, SessionClient, UserUpdate};
use crate::storage::KeyValueStore;
use crate::storage::keys::{CART, KEEP_LOGGED_IN, TOKEN};
use crate::tests::helpers::{Harness, MockTransport, api_error, token_pair_response};
use crate::transport::{Method, Transport};

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

fn client(harness: &Harness) -> SessionClient {
    SessionClient::new(
        Arc::clone(&harness.transport) as Arc<dyn Transport>,
        harness.tokens.clone(),
    )
}

// ============================================
// LOGIN / LOGOUT
// ============================================

/// **VALUE**: Verifies login stores the keep-logged-in choice and commits the issued tokens.
///
/// **BUG THIS CATCHES**: Would catch the flag being written after the tokens, which puts the
/// first token pair in the wrong medium.
#[tokio::test]
async fn given_credentials_when_logging_in_then_session_started() {
    // GIVEN: A server accepting the login
    let harness = Harness::new();
    let client = client(&harness);
    let pair = token_pair_response(300, 7200);
    harness
        .transport
        .respond(Method::Post, "auth/login", Ok(pair.clone()));

    // WHEN: Logging in with keep-logged-in set
    let session = client.login("alice", "secret", true).await.unwrap();

    // THEN: Credentials were posted, the flag and tokens persisted
    let call = &harness.transport.calls()[0];
    assert_eq!(
        call.body,
        Some(json!({ "username": "alice", "password": "secret" }))
    );
    assert!(call.headers.is_empty());
    assert_eq!(harness.store.get(KEEP_LOGGED_IN).as_deref(), Some("true"));
    assert_eq!(harness.store.get(TOKEN).as_deref(), pair["token"].as_str());
    assert!(session.keep_logged_in);
    assert!(client.is_logged_in());
}

#[tokio::test]
async fn given_login_without_keep_logged_in_when_logged_in_then_tokens_not_durable() {
    let harness = Harness::new();
    let client = client(&harness);
    harness.transport.respond(
        Method::Post,
        "auth/login",
        Ok(token_pair_response(300, 7200)),
    );

    let session = client.login("alice", "secret", false).await.unwrap();

    assert!(!session.keep_logged_in);
    assert!(harness.store.get(TOKEN).is_none());
    assert!(client.is_logged_in());
}

#[tokio::test]
async fn given_wrong_password_when_logging_in_then_server_code_surfaces() {
    let harness = Harness::new();
    let client = client(&harness);
    harness
        .transport
        .respond(Method::Post, "auth/login", Err(api_error(401004, 401)));

    let err = client.login("alice", "wrong", true).await.unwrap_err();

    assert_eq!(err.error_code(), Some(401004));
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn given_cart_attached_when_logging_out_then_cart_emptied() {
    let harness = Harness::new();
    harness.sign_in(300, 3600);
    harness
        .transport
        .respond(Method::Delete, "auth/refresh", Ok(Value::Null));
    let cart = CartStore::load(Arc::clone(&harness.store) as Arc<dyn KeyValueStore>).into_shared();
    cart.lock()
        .unwrap()
        .add_item("apple", "COUNT", "1", "2")
        .unwrap();
    let client = client(&harness).with_cart(Arc::clone(&cart));

    let outcome = client.logout().await;

    assert!(outcome.is_clean());
    assert!(cart.lock().unwrap().is_empty());
    assert_eq!(harness.store.get(CART).as_deref(), Some("[]"));
    assert!(!client.is_logged_in());
}

// ============================================
// AUTHORIZATION
// ============================================

#[tokio::test]
async fn given_valid_access_token_when_authorizing_then_no_refresh() {
    let harness = Harness::new();
    harness.sign_in(300, 3600);

    let headers = client(&harness).authorization().await.unwrap();

    assert_eq!(
        headers.get("Authorization").map(str::to_string),
        harness.tokens.authorization_header()
    );
    assert!(harness.transport.calls().is_empty());
}

/// **VALUE**: Verifies a stale access token is refreshed before the request goes out.
///
/// **BUG THIS CATCHES**: Would catch the old bearer being sent and bounced with 401003,
/// turning every first request after idle time into a user-visible error.
#[tokio::test]
async fn given_stale_access_token_when_requesting_then_refreshed_first() {
    // GIVEN: A stale access token and a balance endpoint
    let harness = Harness::new();
    harness.sign_in(-5, 3600);
    let rotated = token_pair_response(300, 7200);
    harness
        .transport
        .respond(Method::Post, "auth/refresh", Ok(rotated.clone()));
    harness
        .transport
        .respond(Method::Get, "balance/7", Ok(json!({ "balance": 12.5 })));

    // WHEN: Requesting the balance
    let balance = client(&harness).get_balance("7").await.unwrap();

    // THEN: Refresh first, then the request with the new bearer
    assert_eq!(balance, 12.5);
    let calls = harness.transport.calls();
    assert_eq!(calls[0].path, "auth/refresh");
    assert_eq!(calls[1].path, "balance/7");
    assert_eq!(
        calls[1].headers.get("Authorization"),
        Some(format!("Bearer {}", rotated["token"].as_str().unwrap()).as_str())
    );
}

/// **VALUE**: Verifies concurrent requests on a stale session trigger exactly one refresh.
///
/// **WHY THIS MATTERS**: A page load fires several authorized requests at once. The server
/// rotates the refresh token on every exchange, so a second exchange would present a spent
/// token and log the user out.
///
/// **BUG THIS CATCHES**: Would catch authorization refreshing per request instead of going
/// through the shared in-flight refresh.
#[tokio::test]
async fn given_stale_access_token_when_requests_concurrent_then_one_refresh_shared() {
    // GIVEN: A stale session and a slow refresh endpoint
    let harness = Harness::with_transport(MockTransport::with_delay(Duration::from_millis(50)));
    harness.sign_in(-5, 3600);
    let rotated = token_pair_response(300, 7200);
    harness
        .transport
        .respond(Method::Post, "auth/refresh", Ok(rotated.clone()));
    harness
        .transport
        .respond(Method::Get, "balance/7", Ok(json!({ "balance": 12.5 })));
    let client = client(&harness);

    // WHEN: Four balance requests run at once
    let results =
        futures_util::future::join_all((0..4).map(|_| client.get_balance("7"))).await;

    // THEN: One refresh, four requests all carrying the rotated bearer
    assert!(results.iter().all(|result| matches!(result, Ok(balance) if *balance == 12.5)));
    assert_eq!(harness.transport.calls_to(Method::Post, "auth/refresh"), 1);
    assert_eq!(harness.transport.calls_to(Method::Get, "balance/7"), 4);
    let bearer = format!("Bearer {}", rotated["token"].as_str().unwrap());
    assert!(
        harness
            .transport
            .calls()
            .iter()
            .filter(|call| call.path == "balance/7")
            .all(|call| call.headers.get("Authorization") == Some(bearer.as_str()))
    );
}

/// **VALUE**: Verifies an unrecoverable session is ended locally and reported as expired.
///
/// **WHY THIS MATTERS**: The UI routes to the login screen on SessionExpired. Leaving the dead
/// tokens behind would bounce the user straight back into the same failure after login.
#[tokio::test]
async fn given_refresh_rejected_when_authorizing_then_session_expired_and_purged() {
    // GIVEN: A stale session the server will not refresh
    let harness = Harness::new();
    harness.sign_in(-5, 3600);
    harness
        .transport
        .respond(Method::Post, "auth/refresh", Err(api_error(401009, 401)));

    // WHEN: Authorizing
    let err = client(&harness).authorization().await.unwrap_err();

    // THEN: SessionExpired caused by the invalid refresh token; no tokens left
    match &err {
        SessionError::SessionExpired { cause, .. } => assert!(matches!(
            cause.as_deref(),
            Some(SessionError::RefreshTokenInvalid { .. })
        )),
        other => panic!("expected SessionExpired, got {other:?}"),
    }
    assert!(harness.tokens.current_session().is_none());
    assert!(harness.store.get(TOKEN).is_none());
}

#[tokio::test]
async fn given_both_tokens_expired_when_requesting_then_session_expired_without_network() {
    let harness = Harness::new();
    harness.sign_in(-100, -1);

    let err = client(&harness).get_all_users().await.unwrap_err();

    assert!(err.requires_login());
    assert!(harness.transport.calls().is_empty());
    assert!(harness.tokens.current_session().is_none());
}

#[tokio::test]
async fn given_no_session_when_requesting_then_session_expired() {
    let harness = Harness::new();

    let err = client(&harness).get_user_by_id("1").await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::Session(SessionError::SessionExpired { .. })
    ));
}

// ============================================
// BALANCE
// ============================================

/// **VALUE**: Verifies zero, NaN and infinite amounts are rejected locally with their codes.
///
/// **BUG THIS CATCHES**: Would catch validation after the request, which charges a network
/// round trip and lets the server decide what a NaN balance means.
#[tokio::test]
async fn given_non_numeric_amounts_when_submitted_then_rejected_before_request() {
    // GIVEN: A logged in client
    let harness = Harness::new();
    harness.sign_in(300, 3600);
    let client = client(&harness);

    // WHEN: Submitting unusable amounts
    let set = client.set_balance("7", 0.0).await.unwrap_err();
    let topup = client.topup_balance("7", f64::NAN).await.unwrap_err();
    let withdraw = client.withdraw_balance("7", f64::INFINITY).await.unwrap_err();

    // THEN: 450001-450003, nothing sent
    assert_eq!(set.error_code(), Some(450001));
    assert_eq!(topup.error_code(), Some(450002));
    assert_eq!(withdraw.error_code(), Some(450003));
    assert!(matches!(set, CoreError::Validation(_)));
    assert!(harness.transport.calls().is_empty());
}

#[tokio::test]
async fn given_valid_amounts_when_submitted_then_balance_endpoints_called() {
    let harness = Harness::new();
    harness.sign_in(300, 3600);
    let client = client(&harness);
    harness
        .transport
        .respond(Method::Patch, "balance/7", Ok(json!({ "balance": 50.0 })));
    harness
        .transport
        .respond(Method::Post, "balance/7/topup", Ok(json!({ "balance": 60.0 })));
    harness
        .transport
        .respond(Method::Post, "balance/7/withdraw", Ok(json!({ "balance": 55.5 })));

    assert_eq!(client.set_balance("7", 50.0).await.unwrap(), 50.0);
    assert_eq!(client.topup_balance("7", 10.0).await.unwrap(), 60.0);
    assert_eq!(client.withdraw_balance("7", 4.5).await.unwrap(), 55.5);

    let bodies: Vec<Option<Value>> = harness
        .transport
        .calls()
        .into_iter()
        .map(|call| call.body)
        .collect();
    assert_eq!(
        bodies,
        vec![
            Some(json!({ "balance": 50.0 })),
            Some(json!({ "amount": 10.0 })),
            Some(json!({ "amount": 4.5 })),
        ]
    );
}

#[tokio::test]
async fn given_negative_amount_when_withdrawn_then_passed_to_server() {
    let harness = Harness::new();
    harness.sign_in(300, 3600);
    harness
        .transport
        .respond(Method::Post, "balance/7/withdraw", Err(api_error(400005, 400)));

    let err = client(&harness).withdraw_balance("7", -3.0).await.unwrap_err();

    assert_eq!(err.error_code(), Some(400005));
}

#[tokio::test]
async fn given_response_without_balance_when_read_then_json_error() {
    let harness = Harness::new();
    harness.sign_in(300, 3600);
    harness
        .transport
        .respond(Method::Get, "balance/7", Ok(json!({ "amount": 1 })));

    let err = client(&harness).get_balance("7").await.unwrap_err();

    assert!(matches!(err, CoreError::Transport(_)));
}

#[tokio::test]
async fn given_history_query_when_requested_then_query_string_encoded() {
    let harness = Harness::new();
    harness.sign_in(300, 3600);
    let path = "balance/7/history?fromDate=2024-01-01&toDate=2024-01-31&offset=20&limit=10";
    harness.transport.respond(Method::Get, path, Ok(json!([])));

    let history = client(&harness)
        .balance_history(
            "7",
            &HistoryQuery {
                from_date: "2024-01-01".to_string(),
                to_date: "2024-01-31".to_string(),
                offset: 20,
                limit: 10,
            },
        )
        .await
        .unwrap();

    assert_eq!(history, json!([]));
    assert_eq!(harness.transport.calls_to(Method::Get, path), 1);
}

// ============================================
// USERS
// ============================================

#[tokio::test]
async fn given_new_user_when_registering_then_posted_without_authorization() {
    let harness = Harness::new();
    harness
        .transport
        .respond(Method::Post, "user/register", Ok(json!({ "id": 3 })));
    let user = NewUser {
        username: "bob".to_string(),
        member_id: "M-3".to_string(),
        password: "hunter2".to_string(),
        email: None,
    };

    let created = client(&harness).register(&user).await.unwrap();

    assert_eq!(created, json!({ "id": 3 }));
    let call = &harness.transport.calls()[0];
    assert!(call.headers.is_empty());
    assert_eq!(
        call.body,
        Some(json!({ "username": "bob", "memberId": "M-3", "password": "hunter2" }))
    );
    assert!(!format!("{user:?}").contains("hunter2"));
}

/// **VALUE**: Verifies every user operation hits its documented method and path with auth.
#[tokio::test]
async fn given_user_operations_when_called_then_expected_routes() {
    // GIVEN: A logged in client and a server answering every route
    let harness = Harness::new();
    harness.sign_in(300, 3600);
    let client = client(&harness);
    let routes = [
        (Method::Patch, "user/3"),
        (Method::Get, "user/"),
        (Method::Get, "user/3"),
        (Method::Delete, "user/3"),
        (Method::Post, "user/3/roles/ADMIN"),
        (Method::Delete, "user/3/roles/ADMIN"),
    ];
    for (method, path) in routes {
        harness.transport.respond(method, path, Ok(json!({})));
    }

    // WHEN: Calling each operation
    let update = UserUpdate {
        email: Some("bob@example.com".to_string()),
        ..UserUpdate::default()
    };
    client.update_user("3", &update).await.unwrap();
    client.get_all_users().await.unwrap();
    client.get_user_by_id("3").await.unwrap();
    client.delete_user_by_id("3").await.unwrap();
    client.add_role("3", "ADMIN").await.unwrap();
    client.delete_role("3", "ADMIN").await.unwrap();

    // THEN: Routes in order, all authorized, partial update only sends set fields
    let calls = harness.transport.calls();
    let seen: Vec<(Method, &str)> = calls
        .iter()
        .map(|call| (call.method, call.path.as_str()))
        .collect();
    assert_eq!(seen, routes);
    assert!(calls.iter().all(|call| call.headers.get("Authorization").is_some()));
    assert_eq!(calls[0].body, Some(json!({ "email": "bob@example.com" })));
}

// ============================================
// WATCH
// ============================================

#[tokio::test(start_paused = true)]
async fn given_balance_watch_when_period_elapses_then_update_delivered() {
    let harness = Harness::new();
    harness.sign_in(3600, 7200);
    harness
        .transport
        .respond(Method::Get, "balance/7", Ok(json!({ "balance": 3.0 })));
    let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();

    let _watch = client(&harness).watch_balance("7", std::time::Duration::from_secs(10), move |r| {
        let _ = sender.send(r.ok());
    });

    assert_eq!(receiver.recv().await, Some(Some(3.0)));
}
