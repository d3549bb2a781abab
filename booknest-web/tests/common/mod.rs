//! Shared setup for booknest-web integration tests.
//!
//! The router runs in-process against the mock identity provider and the
//! in-memory store; nothing here needs a network or PostgreSQL.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use booknest_core::config::{Config, Environment};
use booknest_web::{
    build_router,
    config::{DatabaseConfig, IdentityConfig, SecurityConfig, SessionConfig, WebConfig},
    services::{InMemoryStore, MockIdentityProvider, ProviderUser},
    AppState,
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use std::sync::Arc;
use tower::util::ServiceExt;
use url::Url;
use uuid::Uuid;

pub const SITE_URL: &str = "https://booknest.test";

pub fn test_config() -> WebConfig {
    WebConfig {
        common: Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        environment: Environment::Dev,
        service_name: "booknest-web-test".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        site_url: Url::parse(SITE_URL).unwrap(),
        database: DatabaseConfig {
            url: SecretString::new("postgres://localhost/booknest_test".to_string()),
            max_connections: 2,
            min_connections: 0,
            acquire_timeout_seconds: 5,
            idle_timeout_seconds: 0,
            max_lifetime_seconds: 0,
            run_migrations: false,
        },
        identity: IdentityConfig {
            url: Url::parse("https://identity.test").unwrap(),
            anon_key: SecretString::new("test-anon-key".to_string()),
            timeout_seconds: 5,
        },
        session: SessionConfig {
            secure_cookies: false,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

pub fn test_user(email: &str) -> ProviderUser {
    ProviderUser {
        id: Uuid::new_v4(),
        email: Some(email.to_string()),
    }
}

pub struct TestApp {
    pub router: Router,
    pub identity: Arc<MockIdentityProvider>,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    pub fn spawn() -> Self {
        let identity = Arc::new(MockIdentityProvider::new());
        let store = Arc::new(InMemoryStore::new());

        let state = AppState::new(
            test_config(),
            identity.clone(),
            store.clone(),
            store.clone(),
        );
        let router = build_router(state).expect("Failed to build router");

        Self {
            router,
            identity,
            store,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router call failed")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// GET with an explicit `Host`, as a browser would send it.
    pub async fn get_from_host(&self, uri: &str, host: &str) -> Response<Body> {
        self.request(
            Request::get(uri)
                .header(header::HOST, host)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> Response<Body> {
        self.request(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// Value of the named cookie from the response's `Set-Cookie` headers.
pub fn cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookies(response).into_iter().find_map(|c| {
        let pair = c.split(';').next()?;
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim().to_string())
    })
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
