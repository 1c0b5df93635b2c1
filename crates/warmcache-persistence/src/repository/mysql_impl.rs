//! MySQL / MariaDB rating source.

use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::pool::PoolConnection;
use sqlx::Row;
use std::time::Duration;
use warmcache_domain::SourceRecord;

use super::traits::{PopularityQuery, RatingSource};
use crate::error::{PersistenceError, Result, Store};

// =============================================================================
// SOURCE CONFIGURATION
// =============================================================================

/// MySQL connection configuration.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub pool_size: u32,
    pub acquire_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: None,
            database: "Goodreads".to_string(),
            pool_size: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl SourceConfig {
    fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database);

        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

// =============================================================================
// MYSQL RATING SOURCE
// =============================================================================

// Columns are cast to text so numeric coercion stays in the domain parsers,
// whatever the column types of a given `Scrape` table are.
const TOP_POPULAR_SQL: &str = r"
    SELECT CAST(isbn AS CHAR)        AS isbn,
           CAST(star_rating AS CHAR) AS star_rating,
           CAST(num_ratings AS CHAR) AS num_ratings
    FROM Scrape
    WHERE num_ratings > ?
    ORDER BY num_ratings DESC
    LIMIT ?
";

/// Pool plus the single connection the warm-up works on.
///
/// The connection goes back to the pool on [`RatingSource::shutdown`], or on
/// drop if the source is abandoned.
pub struct MySqlRatingSource {
    pool: MySqlPool,
    conn: Option<PoolConnection<MySql>>,
}

impl MySqlRatingSource {
    /// Build the pool and acquire one connection from it.
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(config.connect_options());

        let conn = match pool.acquire().await {
            Ok(conn) => conn,
            Err(err) => {
                pool.close().await;
                return Err(PersistenceError::connection(Store::Database, err));
            }
        };

        tracing::debug!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            pool_size = config.pool_size,
            "MySQL connection acquired"
        );

        Ok(Self {
            pool,
            conn: Some(conn),
        })
    }
}

#[async_trait]
impl RatingSource for MySqlRatingSource {
    async fn top_popular(&mut self, query: &PopularityQuery) -> Result<Vec<SourceRecord>> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| PersistenceError::Query("connection already released".to_string()))?;

        let rows = sqlx::query(TOP_POPULAR_SQL)
            .bind(query.threshold)
            .bind(query.limit)
            .fetch_all(&mut **conn)
            .await
            .map_err(|e| PersistenceError::Query(e.to_string()))?;

        rows.iter()
            .map(record_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PersistenceError::Query(e.to_string()))
    }

    async fn shutdown(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            drop(conn);
            tracing::debug!("MySQL connection released");
        }
        self.pool.close().await;
        Ok(())
    }
}

fn record_from_row(row: &MySqlRow) -> std::result::Result<SourceRecord, sqlx::Error> {
    Ok(SourceRecord {
        isbn: row.try_get("isbn")?,
        star_rating: row.try_get("star_rating")?,
        num_ratings: row.try_get("num_ratings")?,
    })
}
