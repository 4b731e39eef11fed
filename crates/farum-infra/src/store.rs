//! Storage backend selection.
//!
//! The services in farum-core are generic over the repository traits. These
//! enums give the application one concrete type per repository whatever
//! backend `FarumConfig::storage_backend` names, dispatching each call to the
//! in-memory or SQLite implementation.

use std::path::Path;

use farum_core::repository::{JournalRepository, MessageRepository, SessionRepository};
use farum_core::request_context::RequestContext;
use farum_types::config::{FarumConfig, StorageBackend};
use farum_types::error::RepositoryError;
use farum_types::journal::JournalEntry;
use farum_types::message::Message;
use farum_types::session::{Session, SessionId, UserId};
use tracing::info;

use crate::config::database_url;
use crate::memory::{InMemoryJournalRepository, InMemoryMessageRepository, InMemorySessionRepository};
use crate::sqlite::{
    DatabasePool, SqliteJournalRepository, SqliteMessageRepository, SqliteSessionRepository,
};

#[derive(Clone)]
pub enum SessionStore {
    Memory(InMemorySessionRepository),
    Sqlite(SqliteSessionRepository),
}

#[derive(Clone)]
pub enum MessageStore {
    Memory(InMemoryMessageRepository),
    Sqlite(SqliteMessageRepository),
}

#[derive(Clone)]
pub enum JournalStore {
    Memory(InMemoryJournalRepository),
    Sqlite(SqliteJournalRepository),
}

/// One handle per repository, all on the same backend.
#[derive(Clone)]
pub struct Stores {
    pub sessions: SessionStore,
    pub messages: MessageStore,
    pub journal: JournalStore,
    /// The shared pool behind the SQLite stores, kept for shutdown.
    pub database: Option<DatabasePool>,
}

impl Stores {
    /// Fresh, empty in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            sessions: SessionStore::Memory(InMemorySessionRepository::new()),
            messages: MessageStore::Memory(InMemoryMessageRepository::new()),
            journal: JournalStore::Memory(InMemoryJournalRepository::new()),
            database: None,
        }
    }

    /// SQLite stores sharing one pool.
    pub fn sqlite(pool: DatabasePool) -> Self {
        Self {
            sessions: SessionStore::Sqlite(SqliteSessionRepository::new(pool.clone())),
            messages: MessageStore::Sqlite(SqliteMessageRepository::new(pool.clone())),
            journal: JournalStore::Sqlite(SqliteJournalRepository::new(pool.clone())),
            database: Some(pool),
        }
    }

    /// Open the backend selected by `config`.
    ///
    /// SQLite databases default to `{data_dir}/farum.db`; the directory is
    /// created if needed and migrations are applied.
    pub async fn open(config: &FarumConfig, data_dir: &Path) -> Result<Self, sqlx::Error> {
        match config.storage_backend {
            StorageBackend::Memory => {
                info!("using in-memory storage");
                Ok(Self::in_memory())
            }
            StorageBackend::Sqlite => {
                if config.database_url.is_none() {
                    tokio::fs::create_dir_all(data_dir).await?;
                }
                let url = database_url(config, data_dir);
                info!(url = %url, "using sqlite storage");
                Ok(Self::sqlite(DatabasePool::new(&url).await?))
            }
        }
    }
}

impl SessionRepository for SessionStore {
    async fn create_session(
        &self,
        ctx: &RequestContext,
        session: &Session,
    ) -> Result<(), RepositoryError> {
        match self {
            Self::Memory(repo) => repo.create_session(ctx, session).await,
            Self::Sqlite(repo) => repo.create_session(ctx, session).await,
        }
    }

    async fn update_session(
        &self,
        ctx: &RequestContext,
        session: &Session,
    ) -> Result<(), RepositoryError> {
        match self {
            Self::Memory(repo) => repo.update_session(ctx, session).await,
            Self::Sqlite(repo) => repo.update_session(ctx, session).await,
        }
    }

    async fn get_session(
        &self,
        ctx: &RequestContext,
        id: &SessionId,
    ) -> Result<Option<Session>, RepositoryError> {
        match self {
            Self::Memory(repo) => repo.get_session(ctx, id).await,
            Self::Sqlite(repo) => repo.get_session(ctx, id).await,
        }
    }

    async fn list_sessions_by_user(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Session>, RepositoryError> {
        match self {
            Self::Memory(repo) => repo.list_sessions_by_user(ctx, user_id, limit).await,
            Self::Sqlite(repo) => repo.list_sessions_by_user(ctx, user_id, limit).await,
        }
    }
}

impl MessageRepository for MessageStore {
    async fn append_message(
        &self,
        ctx: &RequestContext,
        message: &Message,
    ) -> Result<(), RepositoryError> {
        match self {
            Self::Memory(repo) => repo.append_message(ctx, message).await,
            Self::Sqlite(repo) => repo.append_message(ctx, message).await,
        }
    }

    async fn get_messages_by_session(
        &self,
        ctx: &RequestContext,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, RepositoryError> {
        match self {
            Self::Memory(repo) => repo.get_messages_by_session(ctx, session_id, limit).await,
            Self::Sqlite(repo) => repo.get_messages_by_session(ctx, session_id, limit).await,
        }
    }
}

impl JournalRepository for JournalStore {
    async fn append_journal_entry(
        &self,
        ctx: &RequestContext,
        entry: &JournalEntry,
    ) -> Result<(), RepositoryError> {
        match self {
            Self::Memory(repo) => repo.append_journal_entry(ctx, entry).await,
            Self::Sqlite(repo) => repo.append_journal_entry(ctx, entry).await,
        }
    }

    async fn list_journal_entries_by_user(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<JournalEntry>, RepositoryError> {
        match self {
            Self::Memory(repo) => repo.list_journal_entries_by_user(ctx, user_id, limit).await,
            Self::Sqlite(repo) => repo.list_journal_entries_by_user(ctx, user_id, limit).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn open_memory_backend() {
        let tmp = TempDir::new().unwrap();
        let stores = Stores::open(&FarumConfig::default(), tmp.path()).await.unwrap();
        assert!(matches!(stores.sessions, SessionStore::Memory(_)));
        assert!(matches!(stores.journal, JournalStore::Memory(_)));
    }

    #[tokio::test]
    async fn open_sqlite_backend_creates_database() {
        let tmp = TempDir::new().unwrap();
        let data_dir = tmp.path().join("nested");
        let config = FarumConfig {
            storage_backend: StorageBackend::Sqlite,
            ..FarumConfig::default()
        };

        let stores = Stores::open(&config, &data_dir).await.unwrap();
        assert!(matches!(stores.messages, MessageStore::Sqlite(_)));
        assert!(data_dir.join("farum.db").exists());
    }
}
