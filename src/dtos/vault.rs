use crate::models::{Tier, VaultCategory};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SecureUrlRequest {
    #[serde(rename = "fileId")]
    #[validate(length(min = 1, message = "fileId is required"))]
    pub file_id: String,
    #[validate(length(min = 1, message = "category is required"))]
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct VaultFilesResponse {
    pub success: bool,
    pub data: VaultData,
}

#[derive(Debug, Serialize)]
pub struct VaultData {
    #[serde(rename = "userTier")]
    pub user_tier: Option<Tier>,
    pub categories: Vec<VaultCategory>,
}
