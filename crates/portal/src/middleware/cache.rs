//! Redis connection used for session storage.

use redis::{aio::ConnectionManager, AsyncCommands, RedisError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use common::{AppError, AppResult};

/// Redis cache wrapper.
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
}

impl Cache {
    /// Connect to Redis.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        debug!("Connecting to Redis at {}", url);
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Get a value from cache.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let mut conn = self.conn.clone();
        let result: Option<String> = conn.get(key).await.map_err(|e| {
            warn!("Redis get error for key {}: {}", key, e);
            AppError::from(e)
        })?;

        match result {
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    // Treat unreadable payloads as a miss
                    warn!("Failed to deserialize cached value for key {}: {}", key, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Set a value with TTL only if the key does not exist yet (`SET NX`).
    /// Returns whether the write happened.
    pub async fn set_if_absent<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> AppResult<bool> {
        self.set_conditional(key, value, ttl_seconds, "NX").await
    }

    /// Replace a value with TTL only if the key still exists (`SET XX`).
    /// Returns whether the write happened.
    pub async fn set_if_present<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> AppResult<bool> {
        self.set_conditional(key, value, ttl_seconds, "XX").await
    }

    async fn set_conditional<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
        condition: &str,
    ) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Serialization error: {}", e)))?;

        // Nil reply means the condition did not hold
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(json)
            .arg(condition)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                warn!("Redis set error for key {}: {}", key, e);
                AppError::from(e)
            })?;
        Ok(reply.is_some())
    }

    /// Delete a value from cache.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(|e| {
            warn!("Redis delete error for key {}: {}", key, e);
            AppError::from(e)
        })?;
        Ok(())
    }

    /// Round-trip a PING.
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
