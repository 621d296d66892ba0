//! Fixed-window rate limiting keyed by a stable per-client identifier.
//!
//! The key prefers a long-lived opaque cookie; clients without one fall back
//! to their forwarded/real IP, and a cookie is minted on the response so the
//! next request is attributable. A request yielding no key at all is
//! rejected. Counter-store failures deny the request: these endpoints are the
//! abuse-prone ones, so the limiter fails closed.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::metrics::RATE_LIMITED_TOTAL;
use crate::services::rate_limit::RateLimitStore;

/// Per-route limiter configuration. One instance per bucket.
#[derive(Clone)]
pub struct RateLimitState {
    pub bucket: &'static str,
    pub limit: u32,
    pub window: Duration,
    pub store: Arc<dyn RateLimitStore>,
    pub cookie_name: String,
    pub secure_cookies: bool,
}

impl RateLimitState {
    pub fn new(
        bucket: &'static str,
        limit: u32,
        window_seconds: u64,
        store: Arc<dyn RateLimitStore>,
        cookie_name: String,
        secure_cookies: bool,
    ) -> Self {
        Self {
            bucket,
            limit,
            window: Duration::from_secs(window_seconds),
            store,
            cookie_name,
            secure_cookies,
        }
    }
}

/// Derived rate-limit key plus whether a client-id cookie must be minted.
#[derive(Debug, PartialEq)]
pub(crate) enum RateLimitKey {
    Cookie(String),
    Ip(IpAddr),
}

impl RateLimitKey {
    fn as_key(&self) -> String {
        match self {
            RateLimitKey::Cookie(id) => format!("cid:{}", id),
            RateLimitKey::Ip(ip) => format!("ip:{}", ip),
        }
    }
}

pub(crate) fn derive_key(
    client_cookie: Option<&str>,
    headers: &HeaderMap,
    peer: Option<IpAddr>,
) -> Option<RateLimitKey> {
    if let Some(id) = client_cookie {
        if !id.is_empty() {
            return Some(RateLimitKey::Cookie(id.to_string()));
        }
    }

    let forwarded_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    forwarded_ip.or(real_ip).or(peer).map(RateLimitKey::Ip)
}

pub async fn fixed_window_rate_limit(
    State(state): State<RateLimitState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let key = derive_key(
        jar.get(&state.cookie_name).map(|c| c.value()),
        request.headers(),
        peer,
    )
    .ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Request cannot be attributed to a client"
        ))
    })?;

    let count = state
        .store
        .increment(&format!("{}:{}", state.bucket, key.as_key()), state.window)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, bucket = %state.bucket, "Rate-limit store unavailable; denying");
            AppError::ServiceUnavailable
        })?;

    if count > state.limit as u64 {
        RATE_LIMITED_TOTAL.with_label_values(&[state.bucket]).inc();
        return Err(AppError::TooManyRequests(
            "Too many requests. Please try again later.".to_string(),
            Some(state.window.as_secs()),
        ));
    }

    let mint = matches!(key, RateLimitKey::Ip(_));
    let mut response = next.run(request).await;

    // First contact from a cookie-less client: mint its identifier so future
    // requests key on it instead of the shared IP.
    if mint {
        let cookie = Cookie::build((state.cookie_name.clone(), Uuid::new_v4().to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(state.secure_cookies)
            .max_age(time::Duration::days(365))
            .build();

        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to mint client-id cookie");
            }
        }
    }

    Ok(response)
}
