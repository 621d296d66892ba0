//! Client for the external document catalog.

use crate::config::CatalogConfig;
use crate::error::AppError;
use crate::models::{CatalogCategory, SecureFileUrl};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use uuid::Uuid;

#[async_trait]
pub trait DocumentCatalog: Send + Sync {
    /// Fetch a hub's categories with their documents.
    async fn categories(&self, hub_id: Uuid) -> Result<Vec<CatalogCategory>, AppError>;

    /// Mint a time-limited download URL for a single file.
    async fn secure_url(&self, file_id: &str) -> Result<SecureFileUrl, AppError>;
}

pub struct HttpCatalog {
    client: Client,
    config: CatalogConfig,
}

impl HttpCatalog {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl DocumentCatalog for HttpCatalog {
    async fn categories(&self, hub_id: Uuid) -> Result<Vec<CatalogCategory>, AppError> {
        let url = format!("{}/hubs/{}/categories", self.config.base_url, hub_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch catalog categories from {}: {}", url, e);
                AppError::BadGateway(format!("catalog request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::BadGateway(format!(
                "catalog returned {} for {}",
                response.status(),
                url
            )));
        }

        // Strict boundary: a payload that does not match the expected shape
        // (including an unknown required tier) is an upstream failure, not a
        // best-effort category.
        response.json::<Vec<CatalogCategory>>().await.map_err(|e| {
            tracing::error!("Malformed catalog payload from {}: {}", url, e);
            AppError::BadGateway(format!("malformed catalog payload: {}", e))
        })
    }

    async fn secure_url(&self, file_id: &str) -> Result<SecureFileUrl, AppError> {
        let url = format!("{}/files/{}/secure-url", self.config.base_url, file_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to mint secure URL via {}: {}", url, e);
                AppError::BadGateway(format!("catalog request failed: {}", e))
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(anyhow::anyhow!("File not found")));
        }

        if !response.status().is_success() {
            return Err(AppError::BadGateway(format!(
                "catalog returned {} for {}",
                response.status(),
                url
            )));
        }

        response.json::<SecureFileUrl>().await.map_err(|e| {
            tracing::error!("Malformed secure-url payload from {}: {}", url, e);
            AppError::BadGateway(format!("malformed secure-url payload: {}", e))
        })
    }
}

/// Fixed-content catalog for tests.
#[derive(Default)]
pub struct MockCatalog {
    categories: Vec<CatalogCategory>,
    pub fail: std::sync::atomic::AtomicBool,
}

impl MockCatalog {
    pub fn new(categories: Vec<CatalogCategory>) -> Self {
        Self {
            categories,
            fail: std::sync::atomic::AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl DocumentCatalog for MockCatalog {
    async fn categories(&self, _hub_id: Uuid) -> Result<Vec<CatalogCategory>, AppError> {
        if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(AppError::BadGateway("catalog unavailable".to_string()));
        }
        Ok(self.categories.clone())
    }

    async fn secure_url(&self, file_id: &str) -> Result<SecureFileUrl, AppError> {
        if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(AppError::BadGateway("catalog unavailable".to_string()));
        }

        let known = self
            .categories
            .iter()
            .flat_map(|c| c.documents.iter())
            .any(|d| d.id == file_id);
        if !known {
            return Err(AppError::NotFound(anyhow::anyhow!("File not found")));
        }

        Ok(SecureFileUrl {
            url: format!("https://files.example/{}?sig=test", file_id),
            expires_at: chrono::Utc::now() + chrono::Duration::minutes(5),
        })
    }
}
