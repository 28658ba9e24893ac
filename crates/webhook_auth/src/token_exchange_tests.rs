//! Tests for token exchange

use super::*;
use wiremock::matchers::{body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn secret() -> SecretString {
    SecretString::from("abc123".to_string())
}

#[tokio::test]
async fn successful_exchange_returns_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/site/oauth2/access_token"))
        .and(header_regex("authorization", r"^JWT \S+\.\S+\.\S+$"))
        .and(body_string_contains("grant_type=urn%3Abitbucket%3Aoauth2%3Ajwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "bearer-xyz",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let exchanger = TokenExchanger::new(
        format!("{}/site/oauth2/access_token", server.uri()),
        "review-relay-app",
    )
    .unwrap();

    let token = exchanger.exchange(&secret(), "tenant-1").await.unwrap();
    assert_eq!(token, "bearer-xyz");
}

#[tokio::test]
async fn rejected_exchange_surfaces_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let exchanger = TokenExchanger::new(server.uri(), "review-relay-app").unwrap();
    let err = exchanger.exchange(&secret(), "tenant-1").await.unwrap_err();

    assert!(matches!(err, AuthError::ExchangeRejected { status: 401 }));
}

#[tokio::test]
async fn response_without_access_token_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "bearer"
        })))
        .mount(&server)
        .await;

    let exchanger = TokenExchanger::new(server.uri(), "review-relay-app").unwrap();
    let err = exchanger.exchange(&secret(), "tenant-1").await.unwrap_err();

    assert!(matches!(err, AuthError::ExchangeResponse));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    // Nothing listens on this port.
    let exchanger = TokenExchanger::new("http://127.0.0.1:9/token", "review-relay-app").unwrap();
    let err = exchanger.exchange(&secret(), "tenant-1").await.unwrap_err();

    assert!(matches!(err, AuthError::ExchangeTransport { .. }));
}
