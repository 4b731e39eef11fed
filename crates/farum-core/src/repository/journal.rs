//! JournalRepository trait definition.

use farum_types::error::RepositoryError;
use farum_types::journal::JournalEntry;
use farum_types::session::UserId;

use crate::request_context::RequestContext;

/// Repository trait for journal entries.
///
/// Written only by the journal tool and read by the journal service.
pub trait JournalRepository: Send + Sync {
    /// Append one journal entry.
    fn append_journal_entry(
        &self,
        ctx: &RequestContext,
        entry: &JournalEntry,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List a user's entries in insertion order (newest last).
    ///
    /// `Some(n)` returns only the last `n` entries.
    fn list_journal_entries_by_user(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> impl std::future::Future<Output = Result<Vec<JournalEntry>, RepositoryError>> + Send;
}
