//! Test helpers: an app wired with in-memory service implementations.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use chrono::Utc;
use dealroom_service::config::{
    AccessConfig, CatalogConfig, DatabaseConfig, Environment, GateConfig, PortalConfig,
    RateLimitConfig, RedisConfig, SessionConfig, SmtpConfig,
};
use dealroom_service::middleware::SessionClaims;
use dealroom_service::models::{CatalogCategory, CatalogDocument, Tier, TierPolicy};
use dealroom_service::services::{
    EntitlementService, MemoryRateLimitStore, MemoryStore, MockCatalog, MockNotifier,
};
use dealroom_service::{build_router, AppState};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::Secret;
use tower::ServiceExt;
use uuid::Uuid;

pub const SESSION_SECRET: &str = "test-session-secret";
pub const GATE_PASSWORD: &str = "open-sesame";
pub const HUB_ID: &str = "11111111-1111-1111-1111-111111111111";

pub fn hub_id() -> Uuid {
    HUB_ID.parse().unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub store: std::sync::Arc<MemoryStore>,
    pub catalog: std::sync::Arc<MockCatalog>,
    pub notifier: std::sync::Arc<MockNotifier>,
    pub rate_limits: std::sync::Arc<MemoryRateLimitStore>,
}

impl TestApp {
    pub fn spawn() -> Self {
        let config = test_config();
        let store = std::sync::Arc::new(MemoryStore::new());
        let catalog = std::sync::Arc::new(MockCatalog::new(test_catalog()));
        let notifier = std::sync::Arc::new(MockNotifier::new());
        let rate_limits = std::sync::Arc::new(MemoryRateLimitStore::new());

        let entitlements = EntitlementService::new(
            store.clone(),
            notifier.clone(),
            TierPolicy::default(),
        );

        let state = AppState {
            config,
            store: store.clone(),
            entitlements,
            catalog: catalog.clone(),
            notifier: notifier.clone(),
            rate_limits: rate_limits.clone(),
        };

        Self {
            router: build_router(state),
            store,
            catalog,
            notifier,
            rate_limits,
        }
    }

    pub async fn request(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }
}

pub fn test_config() -> PortalConfig {
    PortalConfig {
        environment: Environment::Dev,
        service_name: "dealroom-service".to_string(),
        service_version: "test".to_string(),
        log_level: "info".to_string(),
        port: 0,
        allowed_origins: vec!["http://localhost:3000".to_string()],
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        redis: RedisConfig {
            url: "redis://unused".to_string(),
        },
        session: SessionConfig {
            jwt_secret: Secret::new(SESSION_SECRET.to_string()),
        },
        gate: GateConfig {
            password: Secret::new(GATE_PASSWORD.to_string()),
            token_secret: Secret::new("test-gate-token-secret".to_string()),
            token_window_seconds: 3600,
            cookie_name: "password_access_token".to_string(),
            safe_redirect_path: "/protected".to_string(),
        },
        access: AccessConfig {
            hub_id: hub_id(),
            allowed_tiers: vec!["bronze".to_string(), "silver".to_string()],
            admin_email: "admin@example.com".to_string(),
        },
        catalog: CatalogConfig {
            base_url: "http://catalog.unused".to_string(),
            api_key: Secret::new("test-catalog-key".to_string()),
        },
        smtp: SmtpConfig {
            enabled: false,
            host: "localhost".to_string(),
            port: 587,
            user: String::new(),
            password: String::new(),
            from_email: "noreply@example.com".to_string(),
        },
        rate_limit: RateLimitConfig {
            client_id_cookie_name: "dr_client_id".to_string(),
            general_enquiry_limit: 3,
            general_enquiry_window_seconds: 60,
            password_access_limit: 3,
            password_access_window_seconds: 3600,
            password_check_limit: 8,
            password_check_window_seconds: 60,
        },
    }
}

pub fn test_catalog() -> Vec<CatalogCategory> {
    vec![
        CatalogCategory {
            id: "overview".to_string(),
            label: "Overview".to_string(),
            position: 1,
            required_tier: None,
            documents: vec![CatalogDocument {
                id: "deck-1".to_string(),
                name: "Investor deck".to_string(),
                extension: "pdf".to_string(),
                url: Some("https://cdn.example/deck-1.pdf".to_string()),
            }],
        },
        CatalogCategory {
            id: "financials".to_string(),
            label: "Financials".to_string(),
            position: 2,
            required_tier: Some(Tier::Silver),
            documents: vec![CatalogDocument {
                id: "cap-table".to_string(),
                name: "Cap table".to_string(),
                extension: "xlsx".to_string(),
                url: Some("https://cdn.example/cap-table.xlsx".to_string()),
            }],
        },
    ]
}

/// Mint a session token the auth middleware will accept.
pub fn session_token(user_id: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        email: format!("{}@example.com", user_id),
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SESSION_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.10")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn authed_json_request(
    method: &str,
    uri: &str,
    user_id: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", session_token(user_id)))
        .header("x-forwarded-for", "203.0.113.10")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn authed_get(uri: &str, user_id: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", session_token(user_id)))
        .header("x-forwarded-for", "203.0.113.10")
        .body(Body::empty())
        .unwrap()
}

pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
