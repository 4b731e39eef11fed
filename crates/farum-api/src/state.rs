//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over the repository traits, but AppState pins them to
//! the backend enums from farum-infra so the storage choice stays a config
//! value.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use farum_core::agent::Orchestrator;
use farum_core::conversation::ConversationService;
use farum_core::event::EventBus;
use farum_core::journal::JournalService;
use farum_core::llm::BoxReplyGenerator;
use farum_core::request_context::RequestContext;
use farum_core::tool::BoxTool;
use farum_core::tool::journal::JournalTool;
use farum_infra::config::api_key_from_env;
use farum_infra::llm::build_reply_generator;
use farum_infra::sqlite::DatabasePool;
use farum_infra::store::{JournalStore, MessageStore, SessionStore, Stores};
use farum_types::config::FarumConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteConversationService = ConversationService<SessionStore, MessageStore>;

pub type ConcreteJournalService = JournalService<JournalStore>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<ConcreteConversationService>,
    pub journal: Arc<ConcreteJournalService>,
    pub events: EventBus,
    pub config: Arc<FarumConfig>,
    pub data_dir: PathBuf,
    database: Option<DatabasePool>,
}

impl AppState {
    /// Initialize the application state: validate config, open storage, wire services.
    pub async fn init(config: FarumConfig, data_dir: PathBuf) -> anyhow::Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

        let stores = Stores::open(&config, &data_dir)
            .await
            .context("failed to open storage")?;

        let api_key = api_key_from_env(&config.llm);
        let generator = build_reply_generator(&config.llm, api_key).with_context(|| {
            format!(
                "failed to configure the {} provider (is {} set?)",
                config.llm.provider, config.llm.api_key_env
            )
        })?;

        Ok(Self::from_parts(config, stores, generator, data_dir))
    }

    /// Wire services over already-opened stores and generator.
    pub fn from_parts(
        config: FarumConfig,
        stores: Stores,
        generator: BoxReplyGenerator,
        data_dir: PathBuf,
    ) -> Self {
        let events = EventBus::default();

        // The reflector only records journal entries when enabled
        let journal_tool = config
            .journal_enabled
            .then(|| BoxTool::new(JournalTool::new(stores.journal.clone())));
        let orchestrator = Orchestrator::default_pipeline(generator, journal_tool, events.clone());

        let conversation =
            ConversationService::new(stores.sessions, stores.messages, orchestrator)
                .with_history_window(config.history_window);
        let journal = JournalService::new(stores.journal);
        let database = stores.database;

        Self {
            conversation: Arc::new(conversation),
            journal: Arc::new(journal),
            events,
            config: Arc::new(config),
            data_dir,
            database,
        }
    }

    /// Release storage resources. Safe to call on in-memory state.
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.database {
            pool.close().await;
        }
    }

    /// A fresh root context bounded by the configured request timeout.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::new().with_timeout(Duration::from_secs(self.config.request_timeout_secs))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use farum_types::config::LlmSettings;

    /// In-memory state backed by the offline mock provider.
    pub fn memory_state() -> AppState {
        let generator = build_reply_generator(&LlmSettings::default(), None).unwrap();
        AppState::from_parts(
            FarumConfig::default(),
            Stores::in_memory(),
            generator,
            PathBuf::from("."),
        )
    }
}
