use crate::config::PortalConfig;
use crate::db;
use crate::error::AppError;
use crate::models::TierPolicy;
use crate::services::{
    EntitlementService, HttpCatalog, LogNotifier, Notifier, PostgresStore, RedisRateLimitStore,
    SmtpNotifier,
};
use crate::{build_router, AppState};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: PortalConfig) -> Result<Self, AppError> {
        let pool = db::create_pool(&config.database).await.map_err(|e| {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            AppError::DatabaseError(anyhow::Error::new(e))
        })?;
        db::run_migrations(&pool).await.map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            AppError::DatabaseError(anyhow::Error::new(e))
        })?;

        let store = Arc::new(PostgresStore::new(pool));

        let rate_limits = Arc::new(
            RedisRateLimitStore::new(&config.redis)
                .await
                .map_err(AppError::InternalError)?,
        );

        let notifier: Arc<dyn Notifier> = if config.smtp.enabled {
            Arc::new(SmtpNotifier::new(
                &config.smtp,
                config.access.admin_email.clone(),
            )?)
        } else {
            tracing::warn!("SMTP disabled; notifications will be logged, not delivered");
            Arc::new(LogNotifier)
        };

        let policy = TierPolicy::from_names(&config.access.allowed_tiers)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let entitlements = EntitlementService::new(store.clone(), notifier.clone(), policy);

        let catalog = Arc::new(HttpCatalog::new(config.catalog.clone()));

        let state = AppState {
            config: config.clone(),
            store,
            entitlements,
            catalog,
            notifier,
            rate_limits,
        };

        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        );

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
