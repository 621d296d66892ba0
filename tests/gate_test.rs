mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{json_request, read_json, TestApp, GATE_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn check_password_accepts_the_configured_password() {
    let app = TestApp::spawn();

    let response = app
        .request(json_request(
            "POST",
            "/check-password",
            json!({ "password": GATE_PASSWORD }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["valid"], json!(true));
}

#[tokio::test]
async fn check_password_rejects_a_wrong_password() {
    let app = TestApp::spawn();

    let response = app
        .request(json_request(
            "POST",
            "/check-password",
            json!({ "password": "letmein" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["valid"], json!(false));
}

#[tokio::test]
async fn verify_password_sets_the_gate_cookie() {
    let app = TestApp::spawn();

    let response = app
        .request(json_request(
            "POST",
            "/verify-password",
            json!({ "password": GATE_PASSWORD }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("password_access_token="))
        .map(str::to_string);
    assert!(cookie.is_some(), "gate cookie missing from response");
    assert!(cookie.unwrap().contains("HttpOnly"));

    let body = read_json(response).await;
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["from"], json!("/protected"));
}

#[tokio::test]
async fn verify_password_with_a_wrong_password_sets_no_cookie() {
    let app = TestApp::spawn();

    let response = app
        .request(json_request(
            "POST",
            "/verify-password",
            json!({ "password": "letmein" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let has_gate_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("password_access_token="));
    assert!(!has_gate_cookie);

    let body = read_json(response).await;
    assert_eq!(body["ok"], json!(false));
}

#[tokio::test]
async fn verify_password_keeps_a_relative_return_path() {
    let app = TestApp::spawn();

    let response = app
        .request(json_request(
            "POST",
            "/verify-password",
            json!({ "password": GATE_PASSWORD, "from": "/dashboard/files" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["from"], json!("/dashboard/files"));
}

#[tokio::test]
async fn verify_password_discards_unsafe_return_paths() {
    for bad in ["http://evil.example/steal", "//evil.example", "dashboard"] {
        let app = TestApp::spawn();

        let response = app
            .request(json_request(
                "POST",
                "/verify-password",
                json!({ "password": GATE_PASSWORD, "from": bad }),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["from"], json!("/protected"), "path {:?} leaked through", bad);
    }
}

#[tokio::test]
async fn access_status_requires_a_valid_gate_cookie() {
    let app = TestApp::spawn();

    let bare = Request::builder()
        .method("GET")
        .uri("/access/status")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.request(bare).await.status(), StatusCode::UNAUTHORIZED);

    let tampered = Request::builder()
        .method("GET")
        .uri("/access/status")
        .header(header::COOKIE, "password_access_token=0.deadbeef.deadbeef")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.request(tampered).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn access_status_accepts_a_freshly_issued_cookie() {
    let app = TestApp::spawn();

    let verify = app
        .request(json_request(
            "POST",
            "/verify-password",
            json!({ "password": GATE_PASSWORD }),
        ))
        .await;
    let cookie = verify
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("password_access_token="))
        .map(|v| v.split(';').next().unwrap().to_string())
        .expect("gate cookie missing");

    let status = Request::builder()
        .method("GET")
        .uri("/access/status")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.request(status).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn password_endpoints_share_one_fixed_window_quota() {
    let app = TestApp::spawn();

    // Quota is 8 per window across both password endpoints; failures count.
    for _ in 0..7 {
        let response = app
            .request(json_request(
                "POST",
                "/check-password",
                json!({ "password": "letmein" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let eighth = app
        .request(json_request(
            "POST",
            "/verify-password",
            json!({ "password": "letmein" }),
        ))
        .await;
    assert_eq!(eighth.status(), StatusCode::UNAUTHORIZED);

    let ninth = app
        .request(json_request(
            "POST",
            "/check-password",
            json!({ "password": GATE_PASSWORD }),
        ))
        .await;
    assert_eq!(ninth.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(ninth.headers().contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn rate_limiting_fails_closed_when_the_store_is_down() {
    let app = TestApp::spawn();
    app.rate_limits
        .fail
        .store(true, std::sync::atomic::Ordering::Relaxed);

    let response = app
        .request(json_request(
            "POST",
            "/check-password",
            json!({ "password": GATE_PASSWORD }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn requests_without_an_attributable_key_are_rejected() {
    let app = TestApp::spawn();

    // No client-id cookie, no forwarding headers, no peer address.
    let request = Request::builder()
        .method("POST")
        .uri("/check-password")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({ "password": GATE_PASSWORD })).unwrap(),
        ))
        .unwrap();

    assert_eq!(app.request(request).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ip_keyed_requests_are_issued_a_client_id_cookie() {
    let app = TestApp::spawn();

    let response = app
        .request(json_request(
            "POST",
            "/check-password",
            json!({ "password": GATE_PASSWORD }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let minted = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("dr_client_id="));
    assert!(minted, "client-id cookie missing from ip-keyed response");
}

#[tokio::test]
async fn a_presented_client_id_cookie_keys_the_quota() {
    let app = TestApp::spawn();

    let request = Request::builder()
        .method("POST")
        .uri("/check-password")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, "dr_client_id=client-a")
        .body(Body::from(
            serde_json::to_vec(&json!({ "password": GATE_PASSWORD })).unwrap(),
        ))
        .unwrap();
    let response = app.request(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    // An already-keyed client gets no replacement cookie.
    let minted = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("dr_client_id="));
    assert!(!minted);
}
