pub mod auth;
pub mod gate;
pub mod rate_limit;

pub use auth::{auth_middleware, AuthUser, SessionClaims};
pub use gate::gate_middleware;
pub use rate_limit::{fixed_window_rate_limit, RateLimitState};
