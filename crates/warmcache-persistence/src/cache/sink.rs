//! Write side of the warm-up.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::error::Result;

/// A key-value store accepting expiring string values.
#[async_trait]
pub trait CacheSink: Send {
    /// Overwrite `key` with `value`, expiring `ttl` from now.
    async fn set_with_expiry(&mut self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Serialize `value` as JSON and store it under `key`.
    async fn set_json<T: Serialize + Sync>(&mut self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.set_with_expiry(key, &json, ttl).await
    }

    /// Terminate the connection.
    async fn close(&mut self) -> Result<()>;
}

/// Sink that writes nothing, used to rehearse a warm-up without touching the cache.
#[derive(Debug, Default)]
pub struct DryRunSink {
    writes: u64,
}

impl DryRunSink {
    pub const fn new() -> Self {
        Self { writes: 0 }
    }

    /// Number of writes that would have been issued.
    #[cfg(test)]
    pub const fn writes(&self) -> u64 {
        self.writes
    }
}

#[async_trait]
impl CacheSink for DryRunSink {
    async fn set_with_expiry(&mut self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        tracing::trace!(key, value, ttl_secs = ttl.as_secs(), "dry run: skipping write");
        self.writes += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        tracing::debug!(writes = self.writes, "dry run sink closed");
        Ok(())
    }
}
