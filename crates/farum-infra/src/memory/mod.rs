//! In-memory repository implementations.
//!
//! Volatile stores for local mode and tests. Each repository is a cheap
//! `Clone` handle over shared state guarded by a tokio `RwLock`, so one
//! instance can be handed to several services. Lock acquisition races
//! the request context, so a call fails with `RepositoryError::Cancelled`
//! once it is cancelled or its deadline passes, even while waiting on a
//! contended lock.

pub mod journal;
pub mod message;
pub mod session;

pub use journal::InMemoryJournalRepository;
pub use message::InMemoryMessageRepository;
pub use session::InMemorySessionRepository;

use farum_core::request_context::RequestContext;
use farum_types::error::RepositoryError;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

async fn read<'a, T>(
    ctx: &RequestContext,
    lock: &'a RwLock<T>,
) -> Result<RwLockReadGuard<'a, T>, RepositoryError> {
    ctx.guard(lock.read()).await.ok_or(RepositoryError::Cancelled)
}

async fn write<'a, T>(
    ctx: &RequestContext,
    lock: &'a RwLock<T>,
) -> Result<RwLockWriteGuard<'a, T>, RepositoryError> {
    ctx.guard(lock.write()).await.ok_or(RepositoryError::Cancelled)
}

/// Keep only the last `limit` items, preserving order.
fn keep_last<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(n) = limit {
        let skip = items.len().saturating_sub(n);
        items.drain(..skip);
    }
    items
}
