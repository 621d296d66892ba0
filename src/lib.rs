pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::PortalConfig;
use crate::error::AppError;
use crate::middleware::{
    auth_middleware, fixed_window_rate_limit, gate_middleware, rate_limit::RateLimitState,
};
use crate::services::{
    DocumentCatalog, EntitlementService, Notifier, RateLimitStore, SubscriptionStore,
};

/// Shared application state: configuration plus explicitly constructed,
/// dependency-injected clients with process-wide lifetime.
#[derive(Clone)]
pub struct AppState {
    pub config: PortalConfig,
    pub store: Arc<dyn SubscriptionStore>,
    pub entitlements: EntitlementService,
    pub catalog: Arc<dyn DocumentCatalog>,
    pub notifier: Arc<dyn Notifier>,
    pub rate_limits: Arc<dyn RateLimitStore>,
}

pub fn build_router(state: AppState) -> Router {
    let rl = &state.config.rate_limit;
    let cookie_name = rl.client_id_cookie_name.clone();
    let secure = state.config.is_prod();

    // Both password endpoints share the password-check bucket.
    let password_bucket = RateLimitState::new(
        "password-check",
        rl.password_check_limit,
        rl.password_check_window_seconds,
        state.rate_limits.clone(),
        cookie_name.clone(),
        secure,
    );
    let password_routes = Router::new()
        .route("/verify-password", post(handlers::verify_password))
        .route("/check-password", post(handlers::check_password))
        .layer(from_fn_with_state(password_bucket, fixed_window_rate_limit));

    let enquiry_bucket = RateLimitState::new(
        "general-enquiry",
        rl.general_enquiry_limit,
        rl.general_enquiry_window_seconds,
        state.rate_limits.clone(),
        cookie_name.clone(),
        secure,
    );
    let enquiry_routes = Router::new()
        .route("/enquiry", post(handlers::submit_enquiry))
        .layer(from_fn_with_state(enquiry_bucket, fixed_window_rate_limit));

    // Session first, then the quota: a rejected session never consumes quota.
    let access_bucket = RateLimitState::new(
        "password-access",
        rl.password_access_limit,
        rl.password_access_window_seconds,
        state.rate_limits.clone(),
        cookie_name,
        secure,
    );
    let access_routes = Router::new()
        .route("/request-access", post(handlers::request_access))
        .layer(from_fn_with_state(access_bucket, fixed_window_rate_limit))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let vault_routes = Router::new()
        .route("/vault-files", get(handlers::vault_files))
        .route("/secure-url", post(handlers::secure_url))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let gated_routes = Router::new()
        .route("/access/status", get(handlers::gate_status))
        .layer(from_fn_with_state(state.clone(), gate_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics))
        .merge(password_routes)
        .merge(enquiry_routes)
        .merge(access_routes)
        .merge(vault_routes)
        .merge(gated_routes)
        .with_state(state.clone())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .allowed_origins
                        .iter()
                        .filter_map(|o| match o.parse::<axum::http::HeaderValue>() {
                            Ok(v) => Some(v),
                            Err(e) => {
                                tracing::error!("Invalid CORS origin '{}': {}", o, e);
                                None
                            }
                        })
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ])
                .allow_credentials(true),
        )
        .layer(from_fn(request_id_middleware))
}

/// Attach a request id when the caller did not send one.
async fn request_id_middleware(
    mut req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    if !req.headers().contains_key("x-request-id") {
        let id = uuid::Uuid::new_v4().to_string();
        if let Ok(value) = axum::http::HeaderValue::from_str(&id) {
            req.headers_mut().insert("x-request-id", value);
        }
    }
    next.run(req).await
}

/// Service health check: verifies the subscription store and the rate-limit
/// store are reachable.
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        AppError::ServiceUnavailable
    })?;

    state.rate_limits.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Rate-limit store health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "checks": {
            "database": "up",
            "redis": "up"
        }
    })))
}
