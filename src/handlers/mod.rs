pub mod access;
pub mod enquiry;
pub mod gate;
pub mod metrics;
pub mod vault;

pub use access::request_access;
pub use enquiry::submit_enquiry;
pub use gate::{check_password, gate_status, verify_password};
pub use metrics::metrics;
pub use vault::{secure_url, vault_files};
