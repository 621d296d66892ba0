mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{read_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn health_reports_up_when_backends_answer() {
    let app = TestApp::spawn();

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.request(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["checks"]["redis"], json!("up"));
}

#[tokio::test]
async fn health_degrades_when_the_counter_store_is_down() {
    let app = TestApp::spawn();
    app.rate_limits
        .fail
        .store(true, std::sync::atomic::Ordering::Relaxed);

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    assert_eq!(
        app.request(request).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn metrics_endpoint_exposes_the_registry() {
    let app = TestApp::spawn();

    let request = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.request(request).await;

    assert_eq!(response.status(), StatusCode::OK);
}
