//! General enquiry endpoint. Unlike the admin alert on access requests,
//! delivering the enquiry email is the primary operation here; a failure is
//! the request failing.

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::dtos::EnquiryRequest;
use crate::error::AppError;
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn submit_enquiry(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<EnquiryRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .notifier
        .send_enquiry(&req.name, &req.email, &req.message)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to deliver enquiry");
            e
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Thank you for your enquiry. We will be in touch shortly."
    })))
}
