//! Session token validation against a mock Auth service.

use auth_service::AuthError;
use auth_service::headers;
use auth_service::identity::{AuthMethod, Details, RequestContext};
use auth_service::server_token::ServerToken;
use auth_service::session::{SessionTokenValidator, TokenValidator};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FixedServerToken(Result<String, ()>);

impl ServerToken for FixedServerToken {
    fn server_token(&self) -> Result<String, AuthError> {
        self.0.clone().map_err(|()| AuthError::NoCredentialYet)
    }
}

fn validator(server: &MockServer, server_token: Result<String, ()>) -> TokenValidator {
    TokenValidator::new(
        Arc::new(FixedServerToken(server_token)),
        Client::new(),
        Url::parse(&server.uri()).unwrap(),
    )
    .unwrap()
}

async fn respond_with(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/token/user-session"))
        .and(header(headers::SESSION_TOKEN, "srv-token"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

async fn validate(server: &MockServer) -> Result<auth_service::identity::Identity, AuthError> {
    validator(server, Ok("srv-token".to_string()))
        .validate_session_token(&RequestContext::new(), "user-session")
        .await
}

#[tokio::test]
async fn test_server_session() {
    let server = respond_with(ResponseTemplate::new(200).set_body_json(json!({"isserver": true}))).await;

    let identity = validate(&server).await.unwrap();
    assert_eq!(identity.method(), AuthMethod::SessionToken);
    assert_eq!(identity.user_id(), "");
    assert_eq!(identity.token(), "user-session");
    assert!(identity.is_service());
    assert!(!identity.is_user());
}

#[tokio::test]
async fn test_server_session_camel_case_field() {
    let server = respond_with(ResponseTemplate::new(200).set_body_json(json!({"isServer": true}))).await;

    assert!(validate(&server).await.unwrap().is_service());
}

#[tokio::test]
async fn test_server_session_with_both_field_spellings() {
    let body = r#"{"isServer":true,"isserver":true}"#;
    let server = respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json")).await;

    assert!(validate(&server).await.unwrap().is_service());
}

#[tokio::test]
async fn test_user_session() {
    let server = respond_with(ResponseTemplate::new(200).set_body_json(json!({"userid": "abc"}))).await;

    let identity = validate(&server).await.unwrap();
    assert_eq!(identity.user_id(), "abc");
    assert!(identity.is_user());
    assert!(identity.has_token());
}

#[tokio::test]
async fn test_missing_user_id() {
    let server = respond_with(ResponseTemplate::new(200).set_body_json(json!({}))).await;

    match validate(&server).await {
        Err(AuthError::MalformedUpstreamResponse(message)) => {
            assert_eq!(message, "user id is missing");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_body() {
    let server = respond_with(ResponseTemplate::new(200).set_body_string("not json")).await;

    assert!(matches!(
        validate(&server).await,
        Err(AuthError::MalformedUpstreamResponse(_))
    ));
}

#[tokio::test]
async fn test_unauthorized_session() {
    let server = respond_with(ResponseTemplate::new(401)).await;

    assert!(matches!(validate(&server).await, Err(AuthError::Unauthorized)));
}

#[tokio::test]
async fn test_upstream_failure_hides_token() {
    let server = respond_with(ResponseTemplate::new(500)).await;

    match validate(&server).await {
        Err(AuthError::UpstreamUnavailable { method, url, status }) => {
            assert_eq!(method, "GET");
            assert_eq!(status, Some(500));
            assert!(url.ends_with("/auth/token/***"));
            assert!(!url.contains("user-session"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_auth_service() {
    let server = MockServer::start().await;
    let url = Url::parse(&server.uri()).unwrap();
    drop(server);

    let validator = TokenValidator::new(
        Arc::new(FixedServerToken(Ok("srv-token".to_string()))),
        Client::new(),
        url,
    )
    .unwrap();
    let result = validator
        .validate_session_token(&RequestContext::new(), "user-session")
        .await;

    assert!(matches!(
        result,
        Err(AuthError::UpstreamUnavailable { status: None, .. })
    ));
}

#[tokio::test]
async fn test_correlation_id_forwarded() {
    let correlation_id = Uuid::new_v4();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/token/user-session"))
        .and(header(headers::CORRELATION_ID, correlation_id.to_string().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"userid": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let identity = validator(&server, Ok("srv-token".to_string()))
        .validate_session_token(&RequestContext::with_correlation_id(correlation_id), "user-session")
        .await
        .unwrap();
    assert_eq!(identity.user_id(), "abc");
}

#[tokio::test]
async fn test_missing_server_token_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = validator(&server, Err(()))
        .validate_session_token(&RequestContext::new(), "user-session")
        .await;

    assert!(matches!(result, Err(AuthError::NoCredentialYet)));
}

#[tokio::test]
async fn test_empty_token_rejected() {
    let server = MockServer::start().await;

    let result = validator(&server, Ok("srv-token".to_string()))
        .validate_session_token(&RequestContext::new(), "")
        .await;

    assert!(matches!(result, Err(AuthError::InvalidArgument(_))));
}
