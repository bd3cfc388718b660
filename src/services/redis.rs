//! Redis-backed session storage

use async_trait::async_trait;
use redis::Client;

use super::sessions::SessionStore;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct RedisService {
    client: Client,
    ttl_seconds: u64,
}

impl RedisService {
    /// Create a new Redis service; session keys expire `ttl_seconds` after the last visit
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client, ttl_seconds })
    }

    /// Get a Redis connection
    pub async fn get_connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }
}

fn visits_key(session_id: &str) -> String {
    format!("session:{}:visits", session_id)
}

#[async_trait]
impl SessionStore for RedisService {
    async fn record_visit(&self, session_id: &str) -> AppResult<u64> {
        let mut conn = self.get_connection().await?;
        let key = visits_key(session_id);

        let (count,): (u64,) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&key)
            .cmd("EXPIRE")
            .arg(&key)
            .arg(self.ttl_seconds)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to count visit in Redis: {}", e)))?;

        Ok(count.saturating_sub(1))
    }
}
