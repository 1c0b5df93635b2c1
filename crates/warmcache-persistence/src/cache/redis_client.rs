//! # Redis Cache Layer
//!
//! Redis client wrapper used to write the rating entries.

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use std::time::Duration;

use super::sink::CacheSink;
use crate::error::{PersistenceError, Result, Store};

/// Redis cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub url: String,
    /// Reconnect attempts made by the connection manager when the first
    /// connection fails.
    pub connect_retries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connect_retries: 6,
        }
    }
}

/// Redis cache client
pub struct CacheClient {
    conn: ConnectionManager,
}

impl CacheClient {
    /// Open the client and establish the connection.
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| PersistenceError::connection(Store::Cache, e))?;
        let manager_config =
            ConnectionManagerConfig::new().set_number_of_retries(config.connect_retries);
        let conn = ConnectionManager::new_with_config(client, manager_config)
            .await
            .map_err(|e| PersistenceError::connection(Store::Cache, e))?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheSink for CacheClient {
    async fn set_with_expiry(&mut self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let _: () = self
            .conn
            .set_ex(key, value, ttl.as_secs())
            .await
            .map_err(|e| PersistenceError::write(key, e))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        // Commands are awaited one by one, so nothing is in flight by now.
        let _: () = redis::cmd("QUIT")
            .query_async(&mut self.conn)
            .await
            .map_err(|e| PersistenceError::connection(Store::Cache, e))?;
        Ok(())
    }
}
