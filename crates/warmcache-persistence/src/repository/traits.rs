//! # Repository Traits
//!
//! Abstract source of rating records. Implementations can be swapped for
//! different backends (MySQL, in-memory fixtures, etc.)

use async_trait::async_trait;
use warmcache_domain::{POPULARITY_THRESHOLD, QUERY_LIMIT, SourceRecord};

use crate::error::Result;

/// Bounds of the popularity query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopularityQuery {
    /// Rows must have strictly more ratings than this.
    pub threshold: i64,
    /// Maximum number of rows returned.
    pub limit: i64,
}

impl Default for PopularityQuery {
    fn default() -> Self {
        Self {
            threshold: POPULARITY_THRESHOLD,
            limit: QUERY_LIMIT,
        }
    }
}

/// Read side of the warm-up: a relational source of rating rows.
#[async_trait]
pub trait RatingSource: Send {
    /// Fetch rows above the threshold, most-rated first, at most `limit` of them.
    async fn top_popular(&mut self, query: &PopularityQuery) -> Result<Vec<SourceRecord>>;

    /// Release the held connection and close the underlying pool.
    async fn shutdown(&mut self) -> Result<()>;
}
