//! Subscription tiers and entitlement records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription tier controlling content entitlement. Ordered: iron is the
/// free tier, silver the highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Iron => "iron",
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "iron" => Ok(Tier::Iron),
            "bronze" => Ok(Tier::Bronze),
            "silver" => Ok(Tier::Silver),
            other => Err(format!("Unknown tier: {}", other)),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    Requested,
    Active,
    Cancelled,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionState::Requested => "requested",
            SubscriptionState::Active => "active",
            SubscriptionState::Cancelled => "cancelled",
        }
    }
}

/// Row shape of the current-subscription lookup. `plan_code` is nullable
/// because the joined plan may have been removed; a missing plan resolves to
/// no tier.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRecord {
    pub subscription_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub plan_code: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Per-request entitlement view derived from the latest current subscription.
#[derive(Debug, Clone, Serialize)]
pub struct UserSubscription {
    pub tier: Option<Tier>,
    pub has_access: bool,
    pub plan_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
}

impl UserSubscription {
    /// The fail-closed default: no tier, no access.
    pub fn denied() -> Self {
        Self {
            tier: None,
            has_access: false,
            plan_id: None,
            subscription_id: None,
        }
    }
}

/// Allow-list of tiers granted premium access. Default: bronze and silver.
#[derive(Debug, Clone)]
pub struct TierPolicy {
    allowed: Vec<Tier>,
}

impl TierPolicy {
    pub fn new(allowed: Vec<Tier>) -> Self {
        Self { allowed }
    }

    /// Parse a configured tier list, rejecting unknown names outright.
    pub fn from_names(names: &[String]) -> Result<Self, String> {
        let allowed = names
            .iter()
            .map(|n| n.parse::<Tier>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { allowed })
    }

    pub fn is_allowed(&self, tier: Option<Tier>) -> bool {
        match tier {
            Some(t) => self.allowed.contains(&t),
            None => false,
        }
    }

    /// Whether `tier` satisfies a category's requirement: no requirement means
    /// open; otherwise the tier must be allow-listed and rank at least the
    /// required tier.
    pub fn satisfies(&self, tier: Option<Tier>, required: Option<Tier>) -> bool {
        match required {
            None => true,
            Some(req) => match tier {
                Some(t) => self.is_allowed(Some(t)) && t >= req,
                None => false,
            },
        }
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self::new(vec![Tier::Bronze, Tier::Silver])
    }
}
