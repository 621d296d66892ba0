//! Vault gateway endpoints: the tier-overlaid catalog view and one-time
//! secure download URLs.

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::dtos::{SecureUrlRequest, VaultData, VaultFilesResponse};
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::overlay_categories;
use crate::services::metrics::VAULT_REQUESTS_TOTAL;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Per-user view of the vault: categories ordered by position, each marked
/// accessible or not for the caller's tier, URLs stripped from restricted
/// documents.
pub async fn vault_files(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let hub_id = state.config.access.hub_id;
    let subscription = state.entitlements.resolve(&claims.sub, hub_id).await;

    let categories = state.catalog.categories(hub_id).await.map_err(|e| {
        VAULT_REQUESTS_TOTAL
            .with_label_values(&["list", "upstream_error"])
            .inc();
        e
    })?;

    let categories = overlay_categories(categories, state.entitlements.policy(), subscription.tier);

    VAULT_REQUESTS_TOTAL.with_label_values(&["list", "ok"]).inc();

    Ok(Json(VaultFilesResponse {
        success: true,
        data: VaultData {
            user_tier: subscription.tier,
            categories,
        },
    }))
}

/// Mint a time-limited download URL, authorizing against the category's tier
/// requirement first. An entitlement miss is a 403 and never yields a URL,
/// including under partial upstream failures.
pub async fn secure_url(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<SecureUrlRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hub_id = state.config.access.hub_id;
    let subscription = state.entitlements.resolve(&claims.sub, hub_id).await;

    let categories = state.catalog.categories(hub_id).await?;
    let category = categories
        .iter()
        .find(|c| c.id == req.category)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category not found")))?;

    if !state
        .entitlements
        .policy()
        .satisfies(subscription.tier, category.required_tier)
    {
        VAULT_REQUESTS_TOTAL
            .with_label_values(&["secure_url", "forbidden"])
            .inc();
        tracing::info!(
            user_id = %claims.sub,
            category = %req.category,
            "Secure URL denied: insufficient tier"
        );
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Your subscription tier does not grant access to this document"
        )));
    }

    if !category.documents.iter().any(|d| d.id == req.file_id) {
        return Err(AppError::NotFound(anyhow::anyhow!("File not found")));
    }

    let secure = state.catalog.secure_url(&req.file_id).await.map_err(|e| {
        VAULT_REQUESTS_TOTAL
            .with_label_values(&["secure_url", "upstream_error"])
            .inc();
        e
    })?;

    VAULT_REQUESTS_TOTAL
        .with_label_values(&["secure_url", "ok"])
        .inc();

    Ok(Json(json!({
        "success": true,
        "url": secure.url,
        "expiresAt": secure.expires_at,
    })))
}
