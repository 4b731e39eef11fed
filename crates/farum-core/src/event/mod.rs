//! Pipeline observation.
//!
//! Stages and the orchestrator publish `PipelineEvent`s on an [`EventBus`];
//! [`SessionEvents`] narrows a subscription to one session.

pub mod bus;

pub use bus::{EventBus, SessionEvents};
