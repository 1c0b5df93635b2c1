//! # Warm-Up Driver
//!
//! Fetches the most-rated books from the source and writes one expiring cache
//! entry per book, strictly one write at a time.

use std::fmt;
use std::time::{Duration, Instant};

use warmcache_domain::{CacheEntry, PROGRESS_INTERVAL, SourceRecord, entry_ttl};
use warmcache_persistence::{
    CacheClient, CacheSink, DryRunSink, MySqlRatingSource, PopularityQuery, RatingSource, Result,
};

use crate::config::Config;
use crate::progress::{LogProgress, ProgressObserver};

/// What to fetch and how to write it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmUpPlan {
    pub query: PopularityQuery,
    pub ttl: Duration,
    /// Successful writes between progress notifications; `0` disables them.
    pub progress_every: u64,
}

impl Default for WarmUpPlan {
    fn default() -> Self {
        Self {
            query: PopularityQuery::default(),
            ttl: entry_ttl(),
            progress_every: PROGRESS_INTERVAL,
        }
    }
}

/// Outcome of a completed warm-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmUpReport {
    /// Rows returned by the source query.
    pub fetched: usize,
    /// Entries written to the cache.
    pub cached: u64,
    /// Rows without an identifier.
    pub skipped: u64,
    pub elapsed: Duration,
}

impl fmt::Display for WarmUpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cached {} of {} books ({} skipped) in {:.1}s",
            self.cached,
            self.fetched,
            self.skipped,
            self.elapsed.as_secs_f64()
        )
    }
}

// =============================================================================
// WRITE LOOP
// =============================================================================

/// Write one entry per record that has an identifier, in record order.
///
/// Each write is awaited before the next one starts. The first failed write
/// aborts the loop; entries already written stay in the cache.
pub async fn populate<C, O>(
    sink: &mut C,
    records: &[SourceRecord],
    plan: &WarmUpPlan,
    observer: &mut O,
) -> Result<WarmUpReport>
where
    C: CacheSink,
    O: ProgressObserver,
{
    let started = Instant::now();
    let total = records.len();
    let mut report = WarmUpReport {
        fetched: total,
        ..WarmUpReport::default()
    };

    observer.on_start(total);

    for record in records {
        let Some(entry) = CacheEntry::from_record(record, plan.ttl) else {
            tracing::debug!(?record, "Skipping record without identifier");
            report.skipped += 1;
            continue;
        };

        sink.set_json(&entry.key, &entry.value, entry.ttl).await?;
        report.cached += 1;

        if plan.progress_every > 0 && report.cached % plan.progress_every == 0 {
            observer.on_progress(report.cached, total);
        }
    }

    report.elapsed = started.elapsed();
    Ok(report)
}

// =============================================================================
// JOB
// =============================================================================

/// Run a warm-up over already-connected handles.
///
/// Both handles are consumed. Whatever the outcome, the source is shut down and
/// then the sink is closed. The first error is returned; cleanup failures that
/// follow an earlier error are only logged.
pub async fn run<S, C, O>(
    mut source: S,
    mut sink: C,
    plan: &WarmUpPlan,
    mut observer: O,
) -> Result<WarmUpReport>
where
    S: RatingSource,
    C: CacheSink,
    O: ProgressObserver,
{
    let started = Instant::now();
    let outcome = warm(&mut source, &mut sink, plan, &mut observer).await;

    let shutdown = source.shutdown().await;
    let closed = sink.close().await;

    match outcome {
        Ok(mut report) => {
            shutdown?;
            closed?;
            report.elapsed = started.elapsed();
            Ok(report)
        }
        Err(err) => {
            if let Err(e) = shutdown {
                tracing::warn!(error = %e, "Source shutdown failed after an earlier error");
            }
            if let Err(e) = closed {
                tracing::warn!(error = %e, "Cache close failed after an earlier error");
            }
            Err(err)
        }
    }
}

async fn warm<S, C, O>(
    source: &mut S,
    sink: &mut C,
    plan: &WarmUpPlan,
    observer: &mut O,
) -> Result<WarmUpReport>
where
    S: RatingSource,
    C: CacheSink,
    O: ProgressObserver,
{
    tracing::info!(
        threshold = plan.query.threshold,
        limit = plan.query.limit,
        "Fetching popular books"
    );
    let records = source.top_popular(&plan.query).await?;
    populate(sink, &records, plan, observer).await
}

/// Connect to Redis, then MySQL, and run the warm-up.
///
/// With `dry_run` no cache connection is opened and no entries are written.
pub async fn warm_cache(config: &Config, plan: &WarmUpPlan, dry_run: bool) -> Result<WarmUpReport> {
    if dry_run {
        tracing::info!("Dry run: no cache writes will be issued");
        return warm_into(DryRunSink::new(), config, plan).await;
    }

    tracing::info!("Connecting to Redis");
    let cache = CacheClient::connect(&config.cache).await?;
    tracing::info!("Redis connected");

    warm_into(cache, config, plan).await
}

async fn warm_into<C: CacheSink>(mut sink: C, config: &Config, plan: &WarmUpPlan) -> Result<WarmUpReport> {
    tracing::info!(
        host = %config.source.host,
        port = config.source.port,
        database = %config.source.database,
        "Connecting to MySQL"
    );

    let source = match MySqlRatingSource::connect(&config.source).await {
        Ok(source) => source,
        Err(err) => {
            if let Err(e) = sink.close().await {
                tracing::warn!(error = %e, "Cache close failed after MySQL connection error");
            }
            return Err(err);
        }
    };
    tracing::info!("MySQL connected");

    run(source, sink, plan, LogProgress).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use warmcache_domain::parse_ratings_count;
    use warmcache_persistence::{PersistenceError, Store};

    type Events = Arc<Mutex<Vec<&'static str>>>;
    type Entries = Arc<Mutex<Vec<(String, String, Duration)>>>;

    /// In-memory stand-in for the `Scrape` table.
    struct FakeSource {
        rows: Vec<SourceRecord>,
        fail_query: bool,
        events: Events,
    }

    #[async_trait]
    impl RatingSource for FakeSource {
        async fn top_popular(&mut self, query: &PopularityQuery) -> Result<Vec<SourceRecord>> {
            self.events.lock().unwrap().push("query");
            if self.fail_query {
                return Err(PersistenceError::Query("Table 'Scrape' doesn't exist".to_string()));
            }

            let mut rows: Vec<SourceRecord> = self
                .rows
                .iter()
                .filter(|r| parse_ratings_count(r.num_ratings.as_deref()) > query.threshold)
                .cloned()
                .collect();
            rows.sort_by_key(|r| std::cmp::Reverse(parse_ratings_count(r.num_ratings.as_deref())));
            rows.truncate(usize::try_from(query.limit).unwrap());
            Ok(rows)
        }

        async fn shutdown(&mut self) -> Result<()> {
            self.events.lock().unwrap().push("shutdown");
            Ok(())
        }
    }

    /// In-memory cache failing on the n-th write when asked to.
    struct MemoryCache {
        entries: Entries,
        fail_on: Option<usize>,
        events: Events,
    }

    #[async_trait]
    impl CacheSink for MemoryCache {
        async fn set_with_expiry(&mut self, key: &str, value: &str, ttl: Duration) -> Result<()> {
            let mut entries = self.entries.lock().unwrap();
            if self.fail_on == Some(entries.len()) {
                return Err(PersistenceError::write(key, "connection reset by peer"));
            }
            entries.retain(|(k, _, _)| k != key);
            entries.push((key.to_string(), value.to_string(), ttl));
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            self.events.lock().unwrap().push("close");
            Ok(())
        }
    }

    fn harness(rows: Vec<SourceRecord>) -> (FakeSource, MemoryCache, Events, Entries) {
        let events = Events::default();
        let entries = Entries::default();
        let source = FakeSource {
            rows,
            fail_query: false,
            events: events.clone(),
        };
        let cache = MemoryCache {
            entries: entries.clone(),
            fail_on: None,
            events: events.clone(),
        };
        (source, cache, events, entries)
    }

    fn numbered_rows(n: usize) -> Vec<SourceRecord> {
        (0..n)
            .map(|i| SourceRecord::new(format!("{:04}", i + 1), "4.0", (100_000 - i).to_string()))
            .collect()
    }

    fn decode(value: &str) -> serde_json::Value {
        serde_json::from_str(value).unwrap()
    }

    #[tokio::test]
    async fn test_three_row_scenario() {
        let (source, cache, events, entries) = harness(vec![
            SourceRecord::new("1111", "4.5", "2000"),
            SourceRecord::new("", "3.0", "5000"),
            SourceRecord::new("2222", "abc", "1500"),
        ]);

        let report = run(source, cache, &WarmUpPlan::default(), LogProgress)
            .await
            .unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.cached, 2);
        assert_eq!(report.skipped, 1);

        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 2);

        let (key, value, ttl) = &entries[0];
        assert_eq!(key, "goodreads:1111");
        assert_eq!(
            decode(value),
            serde_json::json!({ "rating": 4.5, "ratingsCount": 2000, "source": "goodreads" })
        );
        assert_eq!(ttl.as_secs(), 7_776_000);

        let (key, value, _) = &entries[1];
        assert_eq!(key, "goodreads:2222");
        let value = decode(value);
        assert_eq!(value["rating"].as_f64(), Some(0.0));
        assert_eq!(value["ratingsCount"], 1500);
        assert_eq!(value["source"], "goodreads");

        assert_eq!(*events.lock().unwrap(), vec!["query", "shutdown", "close"]);
    }

    #[tokio::test]
    async fn test_writes_follow_result_order() {
        let (source, cache, _, entries) = harness(vec![
            SourceRecord::new("low", "3.1", "1200"),
            SourceRecord::new("high", "4.1", "90000"),
            SourceRecord::new("mid", "3.8", "5000"),
            SourceRecord::new("unpopular", "5.0", "999"),
        ]);

        let report = run(source, cache, &WarmUpPlan::default(), LogProgress)
            .await
            .unwrap();

        assert_eq!(report.cached, 3);
        let keys: Vec<String> = entries.lock().unwrap().iter().map(|(k, _, _)| k.clone()).collect();
        assert_eq!(keys, ["goodreads:high", "goodreads:mid", "goodreads:low"]);
    }

    #[tokio::test]
    async fn test_writes_never_exceed_limit() {
        let (source, cache, _, entries) = harness(numbered_rows(20));
        let plan = WarmUpPlan {
            query: PopularityQuery {
                threshold: 1000,
                limit: 5,
            },
            ..WarmUpPlan::default()
        };

        let report = run(source, cache, &plan, LogProgress).await.unwrap();

        assert_eq!(report.fetched, 5);
        assert_eq!(report.cached, 5);
        assert_eq!(entries.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_write_failure_aborts_and_cleans_up() {
        let (source, mut cache, events, entries) = harness(numbered_rows(5));
        cache.fail_on = Some(2);

        let err = run(source, cache, &WarmUpPlan::default(), LogProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, PersistenceError::Write { ref key, .. } if key == "goodreads:0003"));
        // Entries written before the failure stay.
        assert_eq!(entries.lock().unwrap().len(), 2);
        assert_eq!(*events.lock().unwrap(), vec!["query", "shutdown", "close"]);
    }

    #[tokio::test]
    async fn test_query_failure_writes_nothing() {
        let (mut source, cache, events, entries) = harness(numbered_rows(3));
        source.fail_query = true;

        let err = run(source, cache, &WarmUpPlan::default(), LogProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, PersistenceError::Query(_)));
        assert!(entries.lock().unwrap().is_empty());
        assert_eq!(*events.lock().unwrap(), vec!["query", "shutdown", "close"]);
    }

    #[tokio::test]
    async fn test_progress_every_n_writes() {
        let (_, mut cache, _, _) = harness(Vec::new());
        let mut records = numbered_rows(25);
        records.insert(3, SourceRecord::new("", "4.0", "5000"));
        let plan = WarmUpPlan {
            progress_every: 10,
            ..WarmUpPlan::default()
        };

        let mut calls = Vec::new();
        let mut observer = |cached: u64, total: usize| calls.push((cached, total));
        let report = populate(&mut cache, &records, &plan, &mut observer)
            .await
            .unwrap();

        assert_eq!(report.cached, 25);
        assert_eq!(report.skipped, 1);
        assert_eq!(calls, vec![(10, 26), (20, 26)]);
    }

    #[tokio::test]
    async fn test_zero_interval_disables_progress() {
        let (_, mut cache, _, _) = harness(Vec::new());
        let plan = WarmUpPlan {
            progress_every: 0,
            ..WarmUpPlan::default()
        };

        let mut calls = 0_u32;
        let mut observer = |_: u64, _: usize| calls += 1;
        populate(&mut cache, &numbered_rows(12), &plan, &mut observer)
            .await
            .unwrap();

        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_unreachable_cache_fails_before_touching_database() {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.cache.url = "redis://127.0.0.1:1".to_string();
        config.cache.connect_retries = 0;

        let err = warm_cache(&config, &WarmUpPlan::default(), false)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PersistenceError::Connection {
                store: Store::Cache,
                ..
            }
        ));
    }

    #[test]
    fn test_report_display() {
        let report = WarmUpReport {
            fetched: 3,
            cached: 2,
            skipped: 1,
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(report.to_string(), "cached 2 of 3 books (1 skipped) in 1.5s");
    }
}
