//! # Goodreads Cache Warm-Up
//!
//! Populates Redis with rating records for the most-rated books of the
//! Goodreads `Scrape` table, so consumers can look ratings up by ISBN without
//! querying MySQL.
//!
//! ## Flow
//!
//! 1. Connect to Redis, then acquire a MySQL connection
//! 2. Fetch up to 150 000 books with more than 1000 ratings, most-rated first
//! 3. Write `goodreads:<isbn>` for every book with an ISBN, 90 day TTL
//! 4. Release the MySQL connection, close the pool, close Redis

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod driver;
pub mod progress;

pub use config::{Config, ConfigError};
pub use driver::{WarmUpPlan, WarmUpReport, populate, run, warm_cache};
pub use progress::{LogProgress, ProgressObserver};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
