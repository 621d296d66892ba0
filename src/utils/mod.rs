pub mod redirect;
pub mod token;
pub mod validation;

pub use redirect::sanitize_return_path;
pub use token::{issue_gate_token, verify_gate_token};
pub use validation::ValidatedJson;
