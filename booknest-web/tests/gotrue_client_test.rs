//! The HTTP identity client against a fake auth API on a random port.

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use booknest_web::{
    config::IdentityConfig,
    models::EmailOtpType,
    services::{GoTrueClient, IdentityProvider, ProviderError, SignUpRequest},
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::net::TcpListener;
use url::Url;

const USER_ID: &str = "7d7ab8d4-5f8a-4a4b-8a39-3f1f0f6a2c11";
const ANON_KEY: &str = "fake-anon-key";

fn session_body() -> Value {
    json!({
        "access_token": "access-1",
        "refresh_token": "refresh-1",
        "expires_in": 1800,
        "token_type": "bearer",
        "user": { "id": USER_ID, "email": "reader@example.com", "aud": "authenticated" },
    })
}

fn has_api_key(headers: &HeaderMap) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(ANON_KEY)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn token(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !has_api_key(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "No API key found" })));
    }

    let accepted = match query.get("grant_type").map(String::as_str) {
        Some("pkce") => body["auth_code"] == "good-code" && body["code_verifier"] == "verifier-1",
        Some("password") => body["email"] == "reader@example.com" && body["password"] == "hunter22",
        _ => false,
    };

    if accepted {
        (StatusCode::OK, Json(session_body()))
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
        )
    }
}

async fn verify(Json(body): Json<Value>) -> impl IntoResponse {
    if body["token_hash"] == "hash-1" && body["type"] == "email_change" {
        (StatusCode::OK, Json(session_body()))
    } else {
        (
            StatusCode::FORBIDDEN,
            Json(json!({ "code": 403, "msg": "Token has expired or is invalid" })),
        )
    }
}

async fn user(headers: HeaderMap) -> impl IntoResponse {
    match bearer(&headers) {
        Some("access-1") => (
            StatusCode::OK,
            Json(json!({ "id": USER_ID, "email": "reader@example.com" })),
        ),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))),
    }
}

async fn signup(Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>) -> impl IntoResponse {
    if query.get("redirect_to").map(String::as_str) != Some("https://booknest.test/auth/confirm")
        || body["data"]["full_name"] != "Ada Lovelace"
    {
        return (StatusCode::BAD_REQUEST, Json(json!({ "msg": "unexpected signup" })));
    }
    (
        StatusCode::OK,
        Json(json!({ "id": USER_ID, "email": body["email"], "confirmation_sent_at": "2024-01-01T00:00:00Z" })),
    )
}

async fn logout(headers: HeaderMap) -> StatusCode {
    match bearer(&headers) {
        Some("access-1") => StatusCode::NO_CONTENT,
        _ => StatusCode::UNAUTHORIZED,
    }
}

async fn spawn_fake_provider() -> GoTrueClient {
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/verify", post(verify))
        .route("/auth/v1/user", get(user))
        .route("/auth/v1/signup", post(signup))
        .route("/auth/v1/logout", post(logout));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    GoTrueClient::new(&IdentityConfig {
        url: Url::parse(&format!("http://{}", addr)).unwrap(),
        anon_key: SecretString::new(ANON_KEY.to_string()),
        timeout_seconds: 5,
    })
    .expect("Failed to build client")
}

#[tokio::test]
async fn exchange_code_returns_user_and_session() {
    let client = spawn_fake_provider().await;

    let response = client
        .exchange_code("good-code", Some("verifier-1"))
        .await
        .unwrap();

    let user = response.user.unwrap();
    assert_eq!(user.id.to_string(), USER_ID);
    assert_eq!(user.email.as_deref(), Some("reader@example.com"));

    let session = response.session.unwrap();
    assert_eq!(session.access_token, "access-1");
    assert_eq!(session.expires_in, 1800);
}

#[tokio::test]
async fn rejected_code_surfaces_provider_message() {
    let client = spawn_fake_provider().await;

    let err = client
        .exchange_code("good-code", Some("wrong-verifier"))
        .await
        .unwrap_err();

    match err {
        ProviderError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid login credentials");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn verify_otp_sends_wire_type_name() {
    let client = spawn_fake_provider().await;

    let ok = client.verify_otp("hash-1", EmailOtpType::EmailChange).await;
    assert!(ok.unwrap().user.is_some());

    let err = client
        .verify_otp("hash-1", EmailOtpType::Email)
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Rejected { status: 403, ref message } if message == "Token has expired or is invalid"));
}

#[tokio::test]
async fn password_sign_in_and_user_lookup() {
    let client = spawn_fake_provider().await;

    let response = client
        .sign_in_with_password("reader@example.com", "hunter22")
        .await
        .unwrap();
    let token = response.session.unwrap().access_token;

    let user = client.get_user(&token).await.unwrap();
    assert_eq!(user.id.to_string(), USER_ID);

    let err = client.get_user("stale").await.unwrap_err();
    assert!(matches!(err, ProviderError::Rejected { status: 401, .. }));

    client.sign_out(&token).await.unwrap();
}

#[tokio::test]
async fn signup_awaiting_confirmation_has_no_session() {
    let client = spawn_fake_provider().await;

    let response = client
        .sign_up(&SignUpRequest {
            email: "ada@example.com".to_string(),
            password: "analytical".to_string(),
            full_name: "Ada Lovelace".to_string(),
            email_redirect_to: "https://booknest.test/auth/confirm".to_string(),
        })
        .await
        .unwrap();

    assert!(response.session.is_none());
    assert_eq!(
        response.user.unwrap().email.as_deref(),
        Some("ada@example.com")
    );
}

#[tokio::test]
async fn unreachable_provider_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = GoTrueClient::new(&IdentityConfig {
        url: Url::parse(&format!("http://{}", addr)).unwrap(),
        anon_key: SecretString::new(ANON_KEY.to_string()),
        timeout_seconds: 2,
    })
    .unwrap();

    let err = client.exchange_code("any", None).await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)));
}
