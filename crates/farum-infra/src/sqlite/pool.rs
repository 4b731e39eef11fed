//! Connection pools for the SQLite backend.
//!
//! Writes go through a single connection so they never contend for the
//! database lock; reads fan out over a small read-only pool. WAL mode lets
//! the two proceed side by side.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

const DB_FILE: &str = "farum.db";

/// Tuning knobs for [`DatabasePool::connect`].
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub readers: u32,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            readers: 8,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open `database_url` with default settings and bring the schema up to
    /// date.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        Self::connect(database_url, PoolSettings::default()).await
    }

    pub async fn connect(database_url: &str, settings: PoolSettings) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(settings.busy_timeout);

        // The writer runs migrations, so it must exist before any reader
        // opens the file read-only.
        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(settings.readers.max(1))
            .connect_with(options.read_only(true))
            .await?;

        info!(url = %database_url, readers = settings.readers, "sqlite storage opened");
        Ok(Self { reader, writer })
    }

    /// Close both pools, waiting for in-flight queries.
    pub async fn close(&self) {
        self.writer.close().await;
        self.reader.close().await;
    }
}

/// Where the database lives when the config names no URL.
pub fn default_database_url(data_dir: &Path) -> String {
    format!("sqlite://{}", data_dir.join(DB_FILE).display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::test_pool;

    #[tokio::test]
    async fn migrations_create_the_three_tables() {
        let pool = test_pool().await;

        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' \
             ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        assert_eq!(names, ["journal_entries", "messages", "sessions"]);
    }

    #[tokio::test]
    async fn writer_runs_in_wal_mode() {
        let pool = test_pool().await;
        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert!(mode.eq_ignore_ascii_case("wal"));
    }

    #[tokio::test]
    async fn reader_rejects_writes() {
        let pool = test_pool().await;
        let result = sqlx::query("DELETE FROM sessions").execute(&pool.reader).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn close_shuts_both_pools() {
        let pool = test_pool().await;
        pool.close().await;
        assert!(pool.reader.is_closed());
        assert!(pool.writer.is_closed());
    }

    #[test]
    fn default_url_points_into_data_dir() {
        assert_eq!(
            default_database_url(Path::new("/tmp/farum")),
            "sqlite:///tmp/farum/farum.db"
        );
    }
}
