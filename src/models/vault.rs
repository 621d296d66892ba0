//! Vault view models and the catalog wire boundary.
//!
//! `CatalogCategory`/`CatalogDocument` are the strict serde boundary for
//! payloads entering from the external document catalog. `VaultCategory`/
//! `VaultDocument` are the per-user view after the tier overlay: a document in
//! an inaccessible category keeps its metadata but never carries a URL.

use super::subscription::{Tier, TierPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category as delivered by the external catalog. `required_tier` must parse
/// into a known [`Tier`]; an unknown tier fails the whole payload rather than
/// defaulting open.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogCategory {
    pub id: String,
    pub label: String,
    pub position: i32,
    #[serde(default)]
    pub required_tier: Option<Tier>,
    #[serde(default)]
    pub documents: Vec<CatalogDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDocument {
    pub id: String,
    pub name: String,
    pub extension: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Time-limited download URL minted by the catalog for a single file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecureFileUrl {
    pub url: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultCategory {
    pub id: String,
    pub label: String,
    pub position: i32,
    pub accessible: bool,
    #[serde(rename = "requiredTier")]
    pub required_tier: Option<Tier>,
    pub documents: Vec<VaultDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultDocument {
    pub id: String,
    pub name: String,
    pub extension: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Overlay access control onto the fetched catalog: categories ordered by
/// position, `accessible` derived from the user's tier, and URLs stripped from
/// every document the user is not entitled to.
pub fn overlay_categories(
    mut categories: Vec<CatalogCategory>,
    policy: &TierPolicy,
    tier: Option<Tier>,
) -> Vec<VaultCategory> {
    categories.sort_by_key(|c| c.position);

    categories
        .into_iter()
        .map(|category| {
            let accessible = policy.satisfies(tier, category.required_tier);
            let documents = category
                .documents
                .into_iter()
                .map(|doc| VaultDocument {
                    id: doc.id,
                    name: doc.name,
                    extension: doc.extension,
                    url: if accessible { doc.url } else { None },
                })
                .collect();

            VaultCategory {
                id: category.id,
                label: category.label,
                position: category.position,
                accessible,
                required_tier: category.required_tier,
                documents,
            }
        })
        .collect()
}
