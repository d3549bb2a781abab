mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{body_json, body_string, test_user, TestApp};

#[tokio::test]
async fn health_check_reports_service() {
    let app = TestApp::spawn();

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "booknest-web-test");
}

#[tokio::test]
async fn metrics_endpoint_answers_with_text() {
    let app = TestApp::spawn();

    let response = app.get("/metrics").await;

    assert_eq!(response.status(), StatusCode::OK);
    // The recorder is only installed by the binary; the endpoint must still answer.
    let body = body_string(response).await;
    assert!(body.starts_with('#') || body.contains("http_requests_total"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = TestApp::spawn();

    let response = app.get("/does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_with_session_skips_user_lookup() {
    let app = TestApp::spawn();
    let token = app.identity.issue_session(test_user("reader@example.com"));

    let response = app
        .request(
            Request::get("/does-not-exist")
                .header(header::COOKIE, format!("booknest-access-token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.identity.calls().is_empty());
}
