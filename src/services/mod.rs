pub mod catalog;
pub mod database;
pub mod entitlements;
pub mod metrics;
pub mod notify;
pub mod rate_limit;

pub use catalog::{DocumentCatalog, HttpCatalog, MockCatalog};
pub use database::{MemoryStore, PostgresStore, SubscriptionStore};
pub use entitlements::EntitlementService;
pub use notify::{LogNotifier, MockNotifier, Notifier, SmtpNotifier};
pub use rate_limit::{MemoryRateLimitStore, RateLimitStore, RedisRateLimitStore};
