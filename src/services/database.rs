//! Subscription persistence.

use crate::error::AppError;
use crate::models::SubscriptionRecord;
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// The most recently created subscription marked current for this user
    /// within the hub, joined to its plan. `plan_code` is `None` when the
    /// plan row no longer exists.
    async fn current_subscription(
        &self,
        user_id: &str,
        hub_id: Uuid,
    ) -> Result<Option<SubscriptionRecord>, AppError>;

    /// An access request already sitting in the `requested` state, if any.
    async fn pending_access_request(
        &self,
        user_id: &str,
        hub_id: Uuid,
    ) -> Result<Option<Uuid>, AppError>;

    /// Record a new pending access request and return its id.
    async fn create_access_request(&self, user_id: &str, hub_id: Uuid)
        -> Result<Uuid, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SubscriptionStore for PostgresStore {
    #[instrument(skip(self))]
    async fn current_subscription(
        &self,
        user_id: &str,
        hub_id: Uuid,
    ) -> Result<Option<SubscriptionRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["current_subscription"])
            .start_timer();

        let record = sqlx::query_as::<_, SubscriptionRecord>(
            r#"
            SELECT s.subscription_id, s.plan_id, p.code AS plan_code, s.created_utc
            FROM subscriptions s
            LEFT JOIN plans p ON p.plan_id = s.plan_id
            WHERE s.user_id = $1 AND s.hub_id = $2
              AND s.state = 'active' AND s.is_current
            ORDER BY s.created_utc DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(hub_id)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn pending_access_request(
        &self,
        user_id: &str,
        hub_id: Uuid,
    ) -> Result<Option<Uuid>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["pending_access_request"])
            .start_timer();

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT subscription_id
            FROM subscriptions
            WHERE user_id = $1 AND hub_id = $2 AND state = 'requested'
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(hub_id)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn create_access_request(
        &self,
        user_id: &str,
        hub_id: Uuid,
    ) -> Result<Uuid, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_access_request"])
            .start_timer();

        let subscription_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO subscriptions (subscription_id, user_id, hub_id, plan_id, state, is_current)
            VALUES ($1, $2, $3, NULL, 'requested', false)
            "#,
        )
        .bind(subscription_id)
        .bind(user_id)
        .bind(hub_id)
        .execute(&self.pool)
        .await?;

        timer.observe_duration();
        info!(subscription_id = %subscription_id, "Access request recorded");

        Ok(subscription_id)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    current: std::sync::Mutex<std::collections::HashMap<(String, Uuid), SubscriptionRecord>>,
    pending: std::sync::Mutex<std::collections::HashMap<(String, Uuid), Uuid>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a current subscription with the given plan code.
    pub fn set_current(&self, user_id: &str, hub_id: Uuid, plan_code: &str) {
        self.current.lock().unwrap().insert(
            (user_id.to_string(), hub_id),
            SubscriptionRecord {
                subscription_id: Uuid::new_v4(),
                plan_id: Some(Uuid::new_v4()),
                plan_code: Some(plan_code.to_string()),
                created_utc: Utc::now(),
            },
        );
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn current_subscription(
        &self,
        user_id: &str,
        hub_id: Uuid,
    ) -> Result<Option<SubscriptionRecord>, AppError> {
        Ok(self
            .current
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), hub_id))
            .cloned())
    }

    async fn pending_access_request(
        &self,
        user_id: &str,
        hub_id: Uuid,
    ) -> Result<Option<Uuid>, AppError> {
        Ok(self
            .pending
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), hub_id))
            .copied())
    }

    async fn create_access_request(
        &self,
        user_id: &str,
        hub_id: Uuid,
    ) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        self.pending
            .lock()
            .unwrap()
            .insert((user_id.to_string(), hub_id), id);
        Ok(id)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
