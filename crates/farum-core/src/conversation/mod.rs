//! Session and message lifecycle for Farum.
//!
//! `ConversationService` starts sessions, runs the reply pipeline for each
//! user message and serves session timelines.

pub mod service;

pub use service::{ConversationService, SendMessageOutput, StartSessionOutput};
