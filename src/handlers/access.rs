//! Access-upgrade request endpoint.

use axum::{extract::State, response::IntoResponse, Json};

use crate::dtos::{RequestAccessRequest, RequestAccessResponse};
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::SubscriptionState;
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn request_access(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<RequestAccessRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.hub_id != state.config.access.hub_id {
        return Err(AppError::BadRequest(anyhow::anyhow!("Unknown hub")));
    }

    let subscription_id = state
        .entitlements
        .request_access(&claims.sub, req.hub_id)
        .await?;

    tracing::info!(
        user_id = %claims.sub,
        subscription_id = %subscription_id,
        "Access request created"
    );

    Ok(Json(RequestAccessResponse {
        success: true,
        subscription_id,
        state: SubscriptionState::Requested.as_str().to_string(),
    }))
}
