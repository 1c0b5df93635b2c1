//! # Warm-Cache Persistence Library
//!
//! Client wrappers for the two stores the rating cache warm-up talks to.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐           ┌──────────────────────────┐
//! │   MySQL / MariaDB        │           │         Redis            │
//! │   (Scrape table)         │           │  (goodreads:<isbn> keys) │
//! └──────────────────────────┘           └──────────────────────────┘
//!              │                                      ▲
//!              ▼                                      │
//! ┌──────────────────────────┐           ┌──────────────────────────┐
//! │      RatingSource        │ ────────▶ │        CacheSink         │
//! │  (MySqlRatingSource)     │  warm-up  │  (CacheClient, DryRun)   │
//! └──────────────────────────┘           └──────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `mysql`: Enable the MySQL rating source (default)
//! - `redis`: Enable the Redis cache client (default)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warmcache_persistence::{
//!     CacheClient, CacheConfig, CacheSink, MySqlRatingSource, PopularityQuery,
//!     RatingSource, SourceConfig,
//! };
//!
//! let mut cache = CacheClient::connect(&CacheConfig::default()).await?;
//! let mut source = MySqlRatingSource::connect(&SourceConfig::default()).await?;
//!
//! let records = source.top_popular(&PopularityQuery::default()).await?;
//! cache.set_with_expiry("goodreads:1111", "{}", ttl).await?;
//!
//! source.shutdown().await?;
//! cache.close().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod repository;

// Re-export commonly used types
#[cfg(feature = "redis")]
pub use cache::{CacheClient, CacheConfig};
pub use cache::{CacheSink, DryRunSink};
pub use error::{PersistenceError, Result, Store};
#[cfg(feature = "mysql")]
pub use repository::{MySqlRatingSource, SourceConfig};
pub use repository::{PopularityQuery, RatingSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
