//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools. Raw queries, private row structs and
//! RFC 3339 timestamp strings throughout.

pub mod journal;
pub mod message;
pub mod pool;
pub mod session;

pub use journal::SqliteJournalRepository;
pub use message::SqliteMessageRepository;
pub use pool::DatabasePool;
pub use session::SqliteSessionRepository;

use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use farum_core::request_context::RequestContext;
use farum_types::error::RepositoryError;

// ---------------------------------------------------------------------------
// Helpers shared by the repositories
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width so that string comparison in SQL orders chronologically.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn map_sqlx_error(e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Connection
        }
        _ => RepositoryError::Query(e.to_string()),
    }
}

/// Run a query unless the request is cancelled first.
async fn guarded<T, F>(ctx: &RequestContext, query: F) -> Result<T, RepositoryError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    ctx.guard(query)
        .await
        .ok_or(RepositoryError::Cancelled)?
        .map_err(map_sqlx_error)
}

/// `None` maps to SQLite's "no limit".
fn sql_limit(limit: Option<usize>) -> i64 {
    limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX))
}
