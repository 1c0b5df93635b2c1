//! Goodreads rating cache warm-up CLI
//!
//! Exits with status 0 when every entry was written, 1 on any error.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use warmcache_domain::{POPULARITY_THRESHOLD, PROGRESS_INTERVAL, QUERY_LIMIT};
use warmcache_job::{Config, WarmUpPlan, WarmUpReport, warm_cache};
use warmcache_persistence::PopularityQuery;

const SECS_PER_DAY: u64 = 86_400;
const MAX_TTL_DAYS: u64 = 36_500;

#[derive(Parser, Debug)]
#[command(name = "warm-cache")]
#[command(about = "Warm the Redis rating cache from the Goodreads Scrape table")]
struct Args {
    /// Maximum number of books to fetch
    #[arg(long, default_value_t = QUERY_LIMIT, value_parser = clap::value_parser!(i64).range(1..))]
    limit: i64,

    /// Only books with more ratings than this are cached
    #[arg(long, default_value_t = POPULARITY_THRESHOLD)]
    threshold: i64,

    /// Log progress every N cached books (0 disables)
    #[arg(long, default_value_t = PROGRESS_INTERVAL)]
    progress_every: u64,

    /// Lifetime of each cache entry, in days
    #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u64).range(1..=MAX_TTL_DAYS))]
    ttl_days: u64,

    /// Query the database but write nothing to Redis
    #[arg(long)]
    dry_run: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    const fn plan(&self) -> WarmUpPlan {
        WarmUpPlan {
            query: PopularityQuery {
                threshold: self.threshold,
                limit: self.limit,
            },
            ttl: Duration::from_secs(self.ttl_days * SECS_PER_DAY),
            progress_every: self.progress_every,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.json_logs);

    tracing::info!(version = warmcache_job::VERSION, "Starting cache warm-up");

    match execute(&args).await {
        Ok(report) => {
            tracing::info!(
                cached = report.cached,
                fetched = report.fetched,
                skipped = report.skipped,
                elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
                "Cache warm-up complete: {report}"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = format!("{err:#}"), "Cache warm-up failed");
            ExitCode::FAILURE
        }
    }
}

async fn execute(args: &Args) -> Result<WarmUpReport> {
    let config = Config::from_env().context("invalid configuration")?;
    let report = warm_cache(&config, &args.plan(), args.dry_run)
        .await
        .context("warm-up aborted")?;
    Ok(report)
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
    });
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
