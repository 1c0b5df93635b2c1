//! # Job Configuration
//!
//! Environment-based connection settings for the warm-up job.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use warmcache_persistence::{CacheConfig, SourceConfig};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Connection settings for both stores
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis configuration
    pub cache: CacheConfig,

    /// MySQL configuration
    pub source: SourceConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.is_empty());
        let cache_defaults = CacheConfig::default();
        let defaults = SourceConfig::default();

        Ok(Self {
            cache: CacheConfig {
                url: get("REDIS_URL").unwrap_or(cache_defaults.url),
                connect_retries: parse_var(
                    get("REDIS_CONNECT_RETRIES"),
                    "REDIS_CONNECT_RETRIES",
                    cache_defaults.connect_retries,
                )?,
            },

            source: SourceConfig {
                host: get("DB_HOST").unwrap_or(defaults.host),
                port: parse_var(get("DB_PORT"), "DB_PORT", defaults.port)?,
                user: get("DB_USER").unwrap_or(defaults.user),
                password: get("DB_PASS"),
                database: get("DB_NAME").unwrap_or(defaults.database),
                pool_size: parse_var(get("DB_POOL_SIZE"), "DB_POOL_SIZE", defaults.pool_size)?,
                acquire_timeout: parse_var(
                    get("DB_ACQUIRE_TIMEOUT_SECS"),
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    defaults.acquire_timeout.as_secs(),
                )
                .map(Duration::from_secs)?,
            },
        })
    }
}

fn parse_var<T: FromStr>(raw: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
