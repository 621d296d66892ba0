pub mod access;
pub mod enquiry;
pub mod gate;
pub mod vault;

pub use access::{RequestAccessRequest, RequestAccessResponse};
pub use enquiry::EnquiryRequest;
pub use gate::{CheckPasswordRequest, VerifyPasswordRequest};
pub use vault::{SecureUrlRequest, VaultData, VaultFilesResponse};
