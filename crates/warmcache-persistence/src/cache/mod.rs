//! # Cache Module
//!
//! Redis cache layer receiving the warmed entries.

#[cfg(feature = "redis")]
pub mod redis_client;
pub mod sink;

#[cfg(feature = "redis")]
pub use redis_client::{CacheClient, CacheConfig};
pub use sink::{CacheSink, DryRunSink};
