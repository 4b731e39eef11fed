//! Conversation engine and repository trait definitions for Farum.
//!
//! This crate defines the "ports" (repository traits, LLM provider, tools)
//! that the infrastructure layer implements, plus the services and the reply
//! pipeline built on top of them. It depends only on `farum-types` -- never
//! on `farum-infra` or any database/IO crate.

pub mod agent;
pub mod conversation;
pub mod event;
pub mod journal;
pub mod llm;
pub mod repository;
pub mod request_context;
pub mod tool;

#[cfg(test)]
mod testing;
