//! Journal read service.

use farum_types::error::ConversationError;
use farum_types::journal::JournalEntry;
use farum_types::session::UserId;
use tracing::{Instrument, debug};

use crate::repository::JournalRepository;
use crate::request_context::RequestContext;

/// Entries returned when the caller does not ask for a specific count.
pub const DEFAULT_JOURNAL_LIMIT: usize = 20;

/// Reads journal entries written by the reflector's journal tool.
pub struct JournalService<J: JournalRepository> {
    repo: J,
}

impl<J: JournalRepository> JournalService<J> {
    pub fn new(repo: J) -> Self {
        Self { repo }
    }

    /// The last `limit` entries for a user, in insertion order.
    ///
    /// `limit <= 0` uses [`DEFAULT_JOURNAL_LIMIT`].
    pub async fn get_user_journal(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<JournalEntry>, ConversationError> {
        async move {
            if user_id.is_empty() {
                return Err(ConversationError::Validation("user_id is required".to_string()));
            }
            let limit = usize::try_from(limit)
                .ok()
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_JOURNAL_LIMIT);

            let entries = self
                .repo
                .list_journal_entries_by_user(ctx, user_id, Some(limit))
                .await
                .map_err(|e| ConversationError::storage("list_journal_entries_by_user", e))?;
            debug!(user_id = %user_id, count = entries.len(), "loaded journal");
            Ok(entries)
        }
        .instrument(ctx.span())
        .await
    }
}
