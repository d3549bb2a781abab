pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use booknest_core::error::AppError;
use booknest_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::WebConfig;
use crate::services::{
    AuthCompletion, AuthEventLogger, AuthLogRepository, BookmarkRepository, IdentityProvider,
};

#[derive(Clone)]
pub struct AppState {
    pub config: WebConfig,
    pub identity: Arc<dyn IdentityProvider>,
    pub bookmarks: Arc<dyn BookmarkRepository>,
    pub auth_flow: AuthCompletion,
}

impl AppState {
    pub fn new(
        config: WebConfig,
        identity: Arc<dyn IdentityProvider>,
        auth_logs: Arc<dyn AuthLogRepository>,
        bookmarks: Arc<dyn BookmarkRepository>,
    ) -> Self {
        let auth_flow = AuthCompletion::new(identity.clone(), AuthEventLogger::new(auth_logs));
        Self {
            config,
            identity,
            bookmarks,
            auth_flow,
        }
    }
}

fn cors_layer(config: &WebConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let bookmark_routes = Router::new()
        .route(
            "/bookmarks",
            get(handlers::list_bookmarks).post(handlers::create_bookmark),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_user,
        ));

    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/auth/confirm", get(handlers::confirm))
        .route("/auth/login", post(handlers::login))
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/google", get(handlers::google_login))
        .route("/logout", get(handlers::logout))
        .merge(bookmark_routes)
        .with_state(state.clone())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");

            // Path only: callback query strings carry one-time credentials.
            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                method = %request.method(),
                path = %request.uri().path(),
                version = ?request.version(),
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config));

    Ok(app)
}
