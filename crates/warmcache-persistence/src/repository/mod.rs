//! # Repository Module
//!
//! Relational source of rating records.

#[cfg(feature = "mysql")]
pub mod mysql_impl;
pub mod traits;

#[cfg(feature = "mysql")]
pub use mysql_impl::{MySqlRatingSource, SourceConfig};
pub use traits::{PopularityQuery, RatingSource};
