//! Password-gate endpoints: verify (issues the signed cookie), check
//! (bare yes/no), and the status probe used by protected pages.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use secrecy::{ExposeSecret, Secret};
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::dtos::{CheckPasswordRequest, VerifyPasswordRequest};
use crate::error::AppError;
use crate::services::metrics::GATE_CHECKS_TOTAL;
use crate::utils::{issue_gate_token, sanitize_return_path, ValidatedJson};
use crate::AppState;

fn password_matches(provided: &str, expected: &Secret<String>) -> bool {
    let expected = expected.expose_secret().as_bytes();
    let provided = provided.as_bytes();
    if expected.len() != provided.len() {
        return false;
    }
    expected.ct_eq(provided).into()
}

/// Check the password and, on success, set the gate cookie and echo a safe
/// return path.
pub async fn verify_password(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<VerifyPasswordRequest>,
) -> Result<Response, AppError> {
    if !password_matches(&req.password, &state.config.gate.password) {
        GATE_CHECKS_TOTAL.with_label_values(&["denied"]).inc();
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "ok": false, "message": "Incorrect password" })),
        )
            .into_response());
    }

    let from = sanitize_return_path(req.from.as_deref(), &state.config.gate.safe_redirect_path);

    let token = issue_gate_token(
        &state.config.gate.token_secret,
        state.config.gate.token_window_seconds,
    )
    .map_err(AppError::InternalError)?;

    let cookie = Cookie::build((state.config.gate.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.is_prod())
        .max_age(time::Duration::seconds(
            state.config.gate.token_window_seconds as i64,
        ))
        .build();

    GATE_CHECKS_TOTAL.with_label_values(&["granted"]).inc();

    Ok((jar.add(cookie), Json(json!({ "ok": true, "from": from }))).into_response())
}

/// Bare password check, no cookie side effect.
pub async fn check_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CheckPasswordRequest>,
) -> Result<Response, AppError> {
    if password_matches(&req.password, &state.config.gate.password) {
        GATE_CHECKS_TOTAL.with_label_values(&["granted"]).inc();
        Ok(Json(json!({ "valid": true })).into_response())
    } else {
        GATE_CHECKS_TOTAL.with_label_values(&["denied"]).inc();
        Ok((StatusCode::UNAUTHORIZED, Json(json!({ "valid": false }))).into_response())
    }
}

/// Reached only through the gate middleware; a 200 means the cookie verified.
pub async fn gate_status() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_compare_handles_length_mismatch() {
        let secret = Secret::new("open-sesame".to_string());
        assert!(password_matches("open-sesame", &secret));
        assert!(!password_matches("open-sesam", &secret));
        assert!(!password_matches("open-sesame!", &secret));
        assert!(!password_matches("", &secret));
    }
}
