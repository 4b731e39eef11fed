//! Model access for the reply pipeline.
//!
//! Stages depend on [`ReplyGenerator`]; [`LlmReplyGenerator`] implements it
//! over any [`LlmProvider`] using the prompt layout in [`prompt`].

pub mod generator;
pub mod prompt;
pub mod provider;

pub use generator::{BoxReplyGenerator, LlmReplyGenerator, ReplyGenerator};
pub use provider::{BoxLlmProvider, LlmProvider};
