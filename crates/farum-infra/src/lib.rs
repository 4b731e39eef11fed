//! Infrastructure layer for Farum.
//!
//! Contains implementations of the ports defined in `farum-core`: in-memory
//! and SQLite repositories, the Anthropic and mock LLM providers, the
//! configuration loader and the storage backend selection.

pub mod config;
pub mod llm;
pub mod memory;
pub mod sqlite;
pub mod store;
