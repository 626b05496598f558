//! Redis-backed session store

use super::SessionStore;
use crate::config::SessionConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use std::time::Duration;

/// Session store for one session id, sharing a Redis connection with every
/// other session handed out via [`RedisSessionStore::for_session`].
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    key_prefix: String,
    session_id: String,
    ttl: Duration,
}

fn session_key(prefix: &str, session_id: &str, key: &str) -> String {
    format!("{}:{}:{}", prefix, session_id, key)
}

impl RedisSessionStore {
    /// Connect to Redis and open the store for `session_id`
    pub async fn connect(config: &SessionConfig, session_id: impl Into<String>) -> Result<Self> {
        // SETEX refuses a zero expiry
        if config.ttl_secs == 0 {
            return Err(AppError::Config(
                "Session TTL must be at least one second".to_string(),
            ));
        }

        let url = config
            .redis_url
            .as_deref()
            .ok_or_else(|| AppError::Config("REDIS_URL is not set".to_string()))?;

        let client = redis::Client::open(url).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create Redis client: {}", e))
        })?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
            session_id: session_id.into(),
            ttl: Duration::from_secs(config.ttl_secs),
        })
    }

    /// Same connection, different session
    pub fn for_session(&self, session_id: impl Into<String>) -> Self {
        Self {
            conn: self.conn.clone(),
            key_prefix: self.key_prefix.clone(),
            session_id: session_id.into(),
            ttl: self.ttl,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn key(&self, key: &str) -> String {
        session_key(&self.key_prefix, &self.session_id, key)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.key(key)).await?;
        metrics::counter!("zendesk_session_operations_total", "operation" => "get").increment(1);
        Ok(value)
    }

    /// Writes refresh the TTL of the entry
    async fn put(&self, key: &str, value: String) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(self.key(key), value, self.ttl.as_secs()).await?;
        metrics::counter!("zendesk_session_operations_total", "operation" => "put").increment(1);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.key(key)).await?;
        metrics::counter!("zendesk_session_operations_total", "operation" => "forget").increment(1);
        Ok(())
    }
}
