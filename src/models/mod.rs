pub mod subscription;
pub mod vault;

pub use subscription::{SubscriptionRecord, SubscriptionState, Tier, TierPolicy, UserSubscription};
pub use vault::{
    overlay_categories, CatalogCategory, CatalogDocument, SecureFileUrl, VaultCategory,
    VaultDocument,
};
