mod common;

use auth_engine::{
    AuthError, AuthTransport, HttpAuthTransport, LoginRequest, RefreshRequest, RegisterRequest,
};
use common::{envelope, harness, user, user_json};
use portal_config_and_utils::Config;
use serde_json::json;
use session_storage::{MemoryStorage, TokenStore};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn login_request() -> LoginRequest {
    LoginRequest {
        email: "a@b.com".to_string(),
        password: "secret1".to_string(),
    }
}

#[tokio::test]
async fn login_unwraps_envelope() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "a@b.com", "password": "secret1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "user": user_json(),
            "tokens": { "accessToken": "AT1", "refreshToken": "RT1" }
        }))))
        .expect(1)
        .mount(&h.server)
        .await;

    let response = h.transport.login(&login_request()).await.unwrap();
    assert_eq!(response.user, user());
    assert_eq!(response.tokens.access_token, "AT1");
    assert_eq!(response.tokens.refresh_token, "RT1");
}

#[tokio::test]
async fn register_sends_name() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({
            "name": "A",
            "email": "a@b.com",
            "password": "secret1"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(envelope(json!({
            "user": user_json(),
            "tokens": { "accessToken": "AT1", "refreshToken": "RT1" }
        }))))
        .expect(1)
        .mount(&h.server)
        .await;

    let response = h
        .transport
        .register(&RegisterRequest {
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(response.user.name, "A");
}

#[tokio::test]
async fn error_status_is_not_interpreted() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "success": false, "message": "Invalid credentials" })),
        )
        .mount(&h.server)
        .await;

    let err = h.transport.login(&login_request()).await.unwrap_err();
    match &err {
        AuthError::Status { status, message } => {
            assert_eq!(*status, 401);
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn error_without_body_uses_reason_phrase() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&h.server)
        .await;

    let err = h
        .transport
        .register(&RegisterRequest {
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.server_message(), Some("Conflict"));
}

#[tokio::test]
async fn unsuccessful_envelope_is_rejected() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "message": "Account locked" })),
        )
        .mount(&h.server)
        .await;

    let err = h.transport.login(&login_request()).await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(ref msg) if msg == "Account locked"));
}

#[tokio::test]
async fn logout_sends_bearer_and_accepts_empty_body() {
    let h = harness().await;
    h.tokens.set_access_token("AT1").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("Authorization", "Bearer AT1"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;

    h.transport.logout().await.unwrap();
}

#[tokio::test]
async fn logout_without_token_sends_no_header() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&h.server)
        .await;

    h.transport.logout().await.unwrap();

    let requests = h.server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn logout_replays_with_refreshed_token_after_401() {
    let h = harness().await;
    h.tokens.set_session("AT_OLD", "RT_OLD", &user()).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("Authorization", "Bearer AT_OLD"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("Authorization", "Bearer AT_NEW"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "accessToken": "AT_NEW",
            "refreshToken": "RT_NEW"
        }))))
        .expect(1)
        .mount(&h.server)
        .await;

    h.transport.logout().await.unwrap();
    assert_eq!(h.tokens.get_refresh_token().unwrap().as_deref(), Some("RT_NEW"));
}

#[tokio::test]
async fn logout_with_rejected_refresh_ends_session() {
    let h = harness().await;
    h.tokens.set_session("AT_OLD", "RT_OLD", &user()).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.transport.logout().await.unwrap_err();
    assert!(err.session_ended(), "{:?}", err);
    assert!(!h.tokens.is_authenticated().unwrap());
}

#[tokio::test]
async fn refresh_posts_refresh_token() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "RT_OLD" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "accessToken": "AT_NEW",
            "refreshToken": "RT_NEW"
        }))))
        .expect(1)
        .mount(&h.server)
        .await;

    let tokens = h
        .transport
        .refresh(&RefreshRequest {
            refresh_token: "RT_OLD".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(tokens.access_token, "AT_NEW");
    assert_eq!(tokens.refresh_token, "RT_NEW");
}

#[tokio::test]
async fn refresh_path_is_configurable() {
    let h = harness().await;
    let mut config = h.config.clone();
    config.endpoints.refresh = "/auth/refresh-token".to_string();
    let transport = HttpAuthTransport::new(&config, Arc::clone(&h.tokens)).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "accessToken": "AT_NEW",
            "refreshToken": "RT_NEW"
        }))))
        .expect(1)
        .mount(&h.server)
        .await;

    let tokens = transport
        .refresh(&RefreshRequest {
            refresh_token: "RT_OLD".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(tokens.access_token, "AT_NEW");
}

#[tokio::test]
async fn connection_failure_is_transient() {
    let config = Config {
        // Nothing listens on the discard port
        api_base_url: "http://127.0.0.1:9/api".to_string(),
        request_timeout_secs: 2,
        ..Config::default()
    };
    let tokens = Arc::new(TokenStore::new(Box::new(MemoryStorage::new())));
    let transport = HttpAuthTransport::new(&config, tokens).unwrap();

    let err = transport.login(&login_request()).await.unwrap_err();
    assert!(matches!(err, AuthError::Http(_)), "{:?}", err);
    assert!(err.is_transient());
}
