use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPasswordRequest {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Return path requested by the form; sanitized server-side before use.
    pub from: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckPasswordRequest {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}
