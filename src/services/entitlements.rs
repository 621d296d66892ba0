//! Session-to-tier resolution and the access-request flow.

use crate::error::AppError;
use crate::models::{Tier, TierPolicy, UserSubscription};
use crate::services::database::SubscriptionStore;
use crate::services::metrics::ACCESS_REQUESTS_TOTAL;
use crate::services::notify::Notifier;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct EntitlementService {
    store: Arc<dyn SubscriptionStore>,
    notifier: Arc<dyn Notifier>,
    policy: TierPolicy,
}

impl EntitlementService {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        notifier: Arc<dyn Notifier>,
        policy: TierPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            policy,
        }
    }

    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    /// Resolve the user's current tier and premium eligibility from the store
    /// of record. Always consults the source of truth; nothing is cached
    /// across requests. Never fails to the caller: store errors are logged
    /// and coerced into the denial shape.
    pub async fn resolve(&self, user_id: &str, hub_id: Uuid) -> UserSubscription {
        let record = match self.store.current_subscription(user_id, hub_id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, user_id = %user_id, "Tier resolution failed; denying access");
                return UserSubscription::denied();
            }
        };

        let record = match record {
            Some(record) => record,
            None => return UserSubscription::denied(),
        };

        let tier = record
            .plan_code
            .as_deref()
            .and_then(|code| match code.parse::<Tier>() {
                Ok(t) => Some(t),
                Err(e) => {
                    tracing::error!(
                        subscription_id = %record.subscription_id,
                        "Subscription references unknown tier: {}", e
                    );
                    None
                }
            });

        UserSubscription {
            tier,
            has_access: self.policy.is_allowed(tier),
            plan_id: record.plan_id,
            subscription_id: Some(record.subscription_id),
        }
    }

    /// Idempotent access-request flow: rejected when the user already holds a
    /// qualifying tier or a prior request is still pending. The admin alert is
    /// best-effort; its failure never fails the request.
    pub async fn request_access(&self, user_id: &str, hub_id: Uuid) -> Result<Uuid, AppError> {
        let current = self.resolve(user_id, hub_id).await;
        if current.has_access {
            ACCESS_REQUESTS_TOTAL.with_label_values(&["already_entitled"]).inc();
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "You already have vault access"
            )));
        }

        if let Some(pending) = self.store.pending_access_request(user_id, hub_id).await? {
            ACCESS_REQUESTS_TOTAL.with_label_values(&["already_pending"]).inc();
            tracing::info!(
                user_id = %user_id,
                subscription_id = %pending,
                "Duplicate access request ignored"
            );
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "An access request is already pending"
            )));
        }

        let subscription_id = self.store.create_access_request(user_id, hub_id).await?;
        ACCESS_REQUESTS_TOTAL.with_label_values(&["created"]).inc();

        if let Err(e) = self
            .notifier
            .send_access_request_alert(user_id, hub_id, subscription_id)
            .await
        {
            tracing::warn!(error = %e, user_id = %user_id, "Admin alert failed; request still recorded");
        }

        Ok(subscription_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::MemoryStore;
    use crate::services::notify::MockNotifier;

    fn service(store: Arc<MemoryStore>, notifier: Arc<MockNotifier>) -> EntitlementService {
        EntitlementService::new(store, notifier, TierPolicy::default())
    }

    fn hub() -> Uuid {
        Uuid::new_v4()
    }

    #[tokio::test]
    async fn no_subscription_resolves_to_denial() {
        let svc = service(Arc::new(MemoryStore::new()), Arc::new(MockNotifier::new()));
        let sub = svc.resolve("u1", hub()).await;
        assert_eq!(sub.tier, None);
        assert!(!sub.has_access);
    }

    #[tokio::test]
    async fn bronze_has_access_iron_does_not() {
        let store = Arc::new(MemoryStore::new());
        let hub = hub();
        store.set_current("bronze-user", hub, "bronze");
        store.set_current("iron-user", hub, "iron");
        let svc = service(store, Arc::new(MockNotifier::new()));

        let bronze = svc.resolve("bronze-user", hub).await;
        assert_eq!(bronze.tier, Some(Tier::Bronze));
        assert!(bronze.has_access);

        let iron = svc.resolve("iron-user", hub).await;
        assert_eq!(iron.tier, Some(Tier::Iron));
        assert!(!iron.has_access);
    }

    #[tokio::test]
    async fn unknown_plan_code_resolves_to_denial() {
        let store = Arc::new(MemoryStore::new());
        let hub = hub();
        store.set_current("u1", hub, "platinum");
        let svc = service(store, Arc::new(MockNotifier::new()));

        let sub = svc.resolve("u1", hub).await;
        assert_eq!(sub.tier, None);
        assert!(!sub.has_access);
    }

    #[tokio::test]
    async fn request_access_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(MockNotifier::new());
        let hub = hub();
        let svc = service(store, notifier.clone());

        let first = svc.request_access("u1", hub).await;
        assert!(first.is_ok());
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);

        let second = svc.request_access("u1", hub).await;
        assert!(matches!(second, Err(AppError::BadRequest(_))));
        // No duplicate alert for the rejected request.
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn entitled_user_cannot_request_again() {
        let store = Arc::new(MemoryStore::new());
        let hub = hub();
        store.set_current("u1", hub, "silver");
        let svc = service(store, Arc::new(MockNotifier::new()));

        assert!(matches!(
            svc.request_access("u1", hub).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn alert_failure_does_not_fail_the_request() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(MockNotifier::new());
        notifier.fail.store(true, std::sync::atomic::Ordering::Relaxed);
        let svc = service(store, notifier);

        assert!(svc.request_access("u1", hub()).await.is_ok());
    }
}
