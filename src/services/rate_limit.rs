//! Fixed-window rate-limit counters.
//!
//! Counters live in an external key-value store with a TTL equal to the
//! window, so limits hold across restarts and replicas and need no cleanup
//! beyond expiry.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::{aio::ConnectionManager, Client, Script};
use std::time::Duration;

/// Increments the counter and arms the window TTL in one server-side script,
/// so a counter can never exist without its expiry. A split INCR/EXPIRE pair
/// would leave an immortal counter if the connection died between the two
/// commands, permanently denying that key once it passed the quota.
const FIXED_WINDOW_LUA: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

static FIXED_WINDOW_SCRIPT: Lazy<Script> = Lazy::new(|| Script::new(FIXED_WINDOW_LUA));

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Increment the counter for `key`, starting a fresh window on first hit.
    /// Returns the count within the current window, this request included.
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, anyhow::Error>;

    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct RedisRateLimitStore {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisRateLimitStore {
    pub async fn new(config: &crate::config::RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!(url = %config.url, "Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        // ConnectionManager reconnects automatically.
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
        })
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, anyhow::Error> {
        let mut conn = self.manager.clone();
        let key = format!("rl:{}", key);

        let count: u64 = FIXED_WINDOW_SCRIPT
            .key(&key)
            .arg(window.as_secs())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to increment rate-limit counter: {}", e))?;

        Ok(count)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// In-process store for tests and local development without Redis.
#[derive(Default)]
pub struct MemoryRateLimitStore {
    windows: std::sync::Mutex<std::collections::HashMap<String, (u64, std::time::Instant)>>,
    pub fail: std::sync::atomic::AtomicBool,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, anyhow::Error> {
        if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(anyhow::anyhow!("rate-limit store unavailable"));
        }

        let now = std::time::Instant::now();
        let mut windows = self.windows.lock().expect("rate-limit lock poisoned");
        let entry = windows.entry(key.to_string()).or_insert((0, now + window));

        if now >= entry.1 {
            *entry = (0, now + window);
        }
        entry.0 += 1;
        Ok(entry.0)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(anyhow::anyhow!("rate-limit store unavailable"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_within_a_window() {
        let store = MemoryRateLimitStore::new();
        let window = Duration::from_secs(60);

        assert_eq!(store.increment("k", window).await.unwrap(), 1);
        assert_eq!(store.increment("k", window).await.unwrap(), 2);
        assert_eq!(store.increment("other", window).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn window_resets_after_elapsing() {
        let store = MemoryRateLimitStore::new();
        let window = Duration::from_millis(20);

        assert_eq!(store.increment("k", window).await.unwrap(), 1);
        assert_eq!(store.increment("k", window).await.unwrap(), 2);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.increment("k", window).await.unwrap(), 1);
    }

    #[test]
    fn counter_and_expiry_are_armed_in_one_script() {
        // Splitting these into separate round trips can strand a counter
        // without a TTL, locking the key out forever once it passes the
        // quota.
        let statements: Vec<&str> = FIXED_WINDOW_LUA
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        assert!(statements[0].contains("redis.call('INCR'"));
        assert!(FIXED_WINDOW_LUA.contains("redis.call('EXPIRE', KEYS[1], ARGV[1])"));
        // The expiry is owned by the first hit of the window.
        assert!(FIXED_WINDOW_LUA.contains("if count == 1"));
    }
}
