// Integration tests for HttpTransport against a mock storefront API
// Tests JSON decoding, error payload handling, headers and network failures

use crate::helpers::start_api;

use storefront_core::error::TransportError;
use storefront_core::transport::{Headers, HttpTransport, Transport};

use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn given_json_response_when_get_then_decoded() {
    // GIVEN: An endpoint answering with JSON
    let (server, transport) = start_api().await;
    Mock::given(method("GET"))
        .and(path("/api/balance/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "balance": 12.5 })))
        .mount(&server)
        .await;

    // WHEN: Requesting it
    let value = transport.get("balance/7", &Headers::new()).await.unwrap();

    // THEN: The JSON body comes back as-is
    assert_eq!(value, json!({ "balance": 12.5 }));
}

/// **VALUE**: Verifies an empty success body is not a decoding failure.
///
/// **BUG THIS CATCHES**: Would catch a blanket `serde_json::from_str` on the body, which turns
/// every successful revoke (204) into a JSON error and a failed logout.
#[tokio::test]
async fn given_empty_success_body_when_sent_then_null() {
    let (server, transport) = start_api().await;
    Mock::given(method("DELETE"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let value = transport
        .delete("auth/refresh", None, &Headers::new())
        .await
        .unwrap();

    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn given_body_and_headers_when_posted_then_forwarded() {
    let (server, transport) = start_api().await;
    Mock::given(method("POST"))
        .and(path("/api/balance/7/topup"))
        .and(header("Authorization", "Bearer abc"))
        .and(body_json(json!({ "amount": 5.0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "balance": 5.0 })))
        .expect(1)
        .mount(&server)
        .await;

    let value = transport
        .post(
            "balance/7/topup",
            &json!({ "amount": 5.0 }),
            &Headers::authorization("Bearer abc"),
        )
        .await
        .unwrap();

    assert_eq!(value["balance"], 5.0);
}

#[tokio::test]
async fn given_path_with_query_when_sent_then_query_preserved() {
    let (server, transport) = start_api().await;
    Mock::given(method("GET"))
        .and(path("/api/balance/7/history"))
        .and(query_param("fromDate", "2024-01-01"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let value = transport
        .get(
            "balance/7/history?fromDate=2024-01-01&toDate=2024-01-31&offset=0&limit=10",
            &Headers::new(),
        )
        .await
        .unwrap();

    assert_eq!(value, json!([]));
}

/// **VALUE**: Verifies the server's structured error reaches callers untouched.
///
/// **WHY THIS MATTERS**: The error catalog translates by `errorCode`. If the transport
/// flattens the payload into a string, every error shows the generic fallback message.
#[tokio::test]
async fn given_structured_error_when_sent_then_api_error_preserved() {
    // GIVEN: A 400 with a full error payload
    let (server, transport) = start_api().await;
    Mock::given(method("POST"))
        .and(path("/api/user/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorCode": 400015,
            "message": "username taken",
            "status": 400,
            "details": ["bob"]
        })))
        .mount(&server)
        .await;

    // WHEN: Registering
    let err = transport
        .post("user/register", &json!({}), &Headers::new())
        .await
        .unwrap_err();

    // THEN: Code, message, status and details all survive
    let api = err.api_error().expect("should be an API error");
    assert_eq!(api.error_code, 400015);
    assert_eq!(api.message, "username taken");
    assert_eq!(api.status, 400);
    assert_eq!(api.details, vec![json!("bob")]);
    assert_eq!(err.error_category(), "client_error");
}

#[tokio::test]
async fn given_error_payload_without_status_when_sent_then_http_status_used() {
    let (server, transport) = start_api().await;
    Mock::given(method("GET"))
        .and(path("/api/user/9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "errorCode": 404005 })),
        )
        .mount(&server)
        .await;

    let err = transport.get("user/9", &Headers::new()).await.unwrap_err();

    assert_eq!(err.error_code(), Some(404005));
    assert_eq!(err.status_code().map(|s| s.0), Some(404));
}

#[tokio::test]
async fn given_plain_text_error_when_sent_then_code_zero_with_body() {
    let (server, transport) = start_api().await;
    Mock::given(method("GET"))
        .and(path("/api/user/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = transport.get("user/", &Headers::new()).await.unwrap_err();

    let api = err.api_error().expect("should be an API error");
    assert_eq!(api.error_code, 0);
    assert_eq!(api.message, "Bad Gateway");
    assert_eq!(api.status, 502);
    assert_eq!(err.error_category(), "server_error");
}

#[tokio::test]
async fn given_invalid_json_success_when_sent_then_json_error() {
    let (server, transport) = start_api().await;
    Mock::given(method("GET"))
        .and(path("/api/balance/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ broken"))
        .mount(&server)
        .await;

    let err = transport.get("balance/7", &Headers::new()).await.unwrap_err();

    assert!(matches!(err, TransportError::Json { .. }));
}

/// **VALUE**: Verifies slow responses fail as a timeout instead of hanging the caller.
#[tokio::test]
async fn given_slow_server_when_timeout_elapses_then_timeout_error() {
    // GIVEN: A server answering after two seconds and a 200ms client timeout
    let (server, _) = start_api().await;
    Mock::given(method("GET"))
        .and(path("/api/user/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;
    let transport =
        HttpTransport::with_timeout(&format!("{}/api/", server.uri()), Duration::from_millis(200))
            .unwrap();

    // WHEN: Requesting
    let err = transport.get("user/", &Headers::new()).await.unwrap_err();

    // THEN: A timeout, not an API error
    assert!(
        matches!(
            err,
            TransportError::Http {
                is_timeout: true,
                ..
            }
        ),
        "got: {err:?}"
    );
    assert_eq!(err.error_category(), "timeout");
}

#[tokio::test]
async fn given_unreachable_server_when_sent_then_http_error() {
    // GIVEN: A port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let transport = HttpTransport::new(&format!("http://127.0.0.1:{port}/api/")).unwrap();

    // WHEN: Requesting
    let err = transport.get("user/", &Headers::new()).await.unwrap_err();

    // THEN: A network error without an API payload
    assert!(matches!(err, TransportError::Http { .. }), "got: {err:?}");
    assert!(err.error_code().is_none());
}

#[test]
fn given_malformed_base_url_when_constructed_then_url_error() {
    let result = HttpTransport::new("not a url");

    assert!(matches!(result, Err(TransportError::UrlParse { .. })));
}
