//! Shared domain types for Farum.
//!
//! This crate contains the core domain types used across the Farum service:
//! Session, Message, JournalEntry, the conversation context handed to the
//! reply pipeline, LLM request shapes, events, configuration, and the error
//! types shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod event;
pub mod journal;
pub mod llm;
pub mod message;
pub mod session;
