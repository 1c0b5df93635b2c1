//! # Goodreads Rating Cache - Domain Model
//!
//! Records read from the `Scrape` table and the cache entries built from them.
//! These types are shared by the persistence layer and the warm-up job.
//!
//! Numeric columns arrive as raw text. Coercion to numbers happens here, through
//! [`parse_rating`] and [`parse_ratings_count`], which never fail: anything that
//! does not parse becomes `0`.

use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;
use std::time::Duration;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Prefix of every cache key written by the warm-up.
pub const KEY_NAMESPACE: &str = "goodreads:";

/// Value of the `source` field of every cached payload.
pub const SOURCE_NAME: &str = "goodreads";

/// Entry lifetime: 90 days.
pub const ENTRY_TTL_SECS: u64 = 86_400 * 90;

/// Minimum `num_ratings` (exclusive) for a book to be cached.
pub const POPULARITY_THRESHOLD: i64 = 1000;

/// Maximum number of rows pulled from the source table.
pub const QUERY_LIMIT: i64 = 150_000;

/// Successful writes between two progress notifications.
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// Default entry lifetime as a [`Duration`].
#[must_use]
pub const fn entry_ttl() -> Duration {
    Duration::from_secs(ENTRY_TTL_SECS)
}

// =============================================================================
// SOURCE RECORD
// =============================================================================

/// One row of the popularity query.
///
/// All columns are kept as the text the database returned; `None` means SQL
/// `NULL`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub isbn: Option<String>,
    pub star_rating: Option<String>,
    pub num_ratings: Option<String>,
}

impl SourceRecord {
    pub fn new(
        isbn: impl Into<String>,
        star_rating: impl Into<String>,
        num_ratings: impl Into<String>,
    ) -> Self {
        Self {
            isbn: Some(isbn.into()),
            star_rating: Some(star_rating.into()),
            num_ratings: Some(num_ratings.into()),
        }
    }

    /// The identifier, if present and non-empty.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.isbn.as_deref().filter(|isbn| !isbn.is_empty())
    }
}

// =============================================================================
// CACHE VALUE
// =============================================================================

/// JSON payload stored under `goodreads:<isbn>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingPayload {
    pub rating: f64,
    pub ratings_count: i64,
    pub source: String,
}

impl RatingPayload {
    /// Build the payload from a record, defaulting unparseable fields to zero.
    #[must_use]
    pub fn from_record(record: &SourceRecord) -> Self {
        Self {
            rating: parse_rating(record.star_rating.as_deref()),
            ratings_count: parse_ratings_count(record.num_ratings.as_deref()),
            source: SOURCE_NAME.to_string(),
        }
    }
}

/// Parse a star rating from the longest numeric prefix of `raw`.
///
/// Leading whitespace is skipped and trailing text ignored, so `"4.25 stars"`
/// reads as `4.25`. Missing input, input without a leading number, zero and
/// non-finite values all give `0.0`.
#[must_use]
pub fn parse_rating(raw: Option<&str>) -> f64 {
    raw.map(|s| float_prefix(s.trim_start()))
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_normal() || v.is_subnormal())
        .unwrap_or(0.0)
}

/// Parse a ratings count from the leading decimal digits of `raw`.
///
/// Leading whitespace is skipped and parsing stops at the first non-digit, so
/// `"12,345"` reads as `12` and `"5000.00"` as `5000`. Counts beyond `i64`
/// saturate. Input without a leading digit gives `0`.
#[must_use]
pub fn parse_ratings_count(raw: Option<&str>) -> i64 {
    let Some(s) = raw.map(str::trim_start) else {
        return 0;
    };

    let sign = usize::from(matches!(s.as_bytes().first(), Some(b'+' | b'-')));
    let digits = count_digits(&s.as_bytes()[sign..]);
    if digits == 0 {
        return 0;
    }

    match s[..sign + digits].parse::<i64>() {
        Ok(count) => count,
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => 0,
        },
    }
}

/// Longest prefix of `s` shaped like `[sign] digits [. digits] [e [sign] digits]`.
fn float_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits + frac_digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    &s[..end]
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

// =============================================================================
// CACHE ENTRY
// =============================================================================

/// A key, payload and lifetime ready to be written to the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: RatingPayload,
    pub ttl: Duration,
}

impl CacheEntry {
    /// Build the entry for a record, or `None` when the record has no identifier.
    #[must_use]
    pub fn from_record(record: &SourceRecord, ttl: Duration) -> Option<Self> {
        let isbn = record.identifier()?;
        Some(Self {
            key: cache_key(isbn),
            value: RatingPayload::from_record(record),
            ttl,
        })
    }
}

/// Cache key for an identifier.
#[must_use]
pub fn cache_key(isbn: &str) -> String {
    format!("{KEY_NAMESPACE}{isbn}")
}
