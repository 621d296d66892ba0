//! Password-gate middleware: re-verifies the signed gate cookie on every
//! protected request. Stateless; the cookie is the only credential.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use crate::utils::verify_gate_token;
use crate::AppState;

pub async fn gate_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let valid = jar
        .get(&state.config.gate.cookie_name)
        .map(|cookie| verify_gate_token(cookie.value(), &state.config.gate.token_secret))
        .unwrap_or(false);

    if !valid {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "ok": false, "message": "Password required" })),
        ));
    }

    Ok(next.run(req).await)
}
