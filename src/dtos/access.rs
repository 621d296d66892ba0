use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RequestAccessRequest {
    pub hub_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RequestAccessResponse {
    pub success: bool,
    pub subscription_id: Uuid,
    pub state: String,
}
