//! In-memory `JournalRepository`.

use std::collections::HashMap;
use std::sync::Arc;

use farum_core::repository::JournalRepository;
use farum_core::request_context::RequestContext;
use farum_types::error::RepositoryError;
use farum_types::journal::JournalEntry;
use farum_types::session::UserId;
use tokio::sync::RwLock;

use super::{keep_last, read, write};

/// Per-user journal entries in append order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJournalRepository {
    entries: Arc<RwLock<HashMap<UserId, Vec<JournalEntry>>>>,
}

impl InMemoryJournalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JournalRepository for InMemoryJournalRepository {
    async fn append_journal_entry(
        &self,
        ctx: &RequestContext,
        entry: &JournalEntry,
    ) -> Result<(), RepositoryError> {
        write(ctx, &self.entries)
            .await?
            .entry(entry.user_id.clone())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn list_journal_entries_by_user(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<JournalEntry>, RepositoryError> {
        let entries = read(ctx, &self.entries)
            .await?
            .get(user_id)
            .cloned()
            .unwrap_or_default();
        Ok(keep_last(entries, limit))
    }
}
