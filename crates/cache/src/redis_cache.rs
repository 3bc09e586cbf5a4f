use crate::error::{CacheError, Result};
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub url: String,
    pub connect_timeout: Duration,
}

impl CacheConfig {
    /// `None` when `REDIS_URL` is unset; rate limiting is then disabled.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("REDIS_URL").ok().filter(|v| !v.is_empty())?;
        Some(Self {
            url,
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3),
            ),
        })
    }
}

/// Fixed-window request budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: i64,
    pub window_secs: u64,
}

impl RateLimit {
    pub const fn new(max_requests: i64, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }

    pub fn allows(&self, count: i64) -> bool {
        count <= self.max_requests
    }
}

pub fn rate_limit_key(scope: &str, client: &str) -> String {
    format!("ratelimit:{}:{}", scope, client)
}

#[derive(Clone)]
pub struct Cache {
    manager: ConnectionManager,
}

impl Cache {
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let client = Client::open(config.url)?;
        let manager = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Other("timed out connecting to Redis".to_string()))??;

        Ok(Self { manager })
    }

    /// Increment a counter; the TTL is set when the window opens so the
    /// window does not slide with every hit.
    pub async fn incr_with_ttl(&self, key: &str, ttl_seconds: u64) -> Result<i64> {
        let mut conn = self.manager.clone();
        let value: i64 = conn.incr(key, 1).await?;
        if value == 1 {
            conn.expire::<_, ()>(key, ttl_seconds as i64).await?;
        }
        Ok(value)
    }

    /// Count one request against `limit`; returns whether it is allowed.
    pub async fn hit(&self, key: &str, limit: RateLimit) -> Result<bool> {
        let count = self.incr_with_ttl(key, limit.window_secs).await?;
        if !limit.allows(count) {
            tracing::debug!(key, count, "rate limit exceeded");
        }
        Ok(limit.allows(count))
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }
}
