//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (farum-infra) implements. The core crate never depends on any specific
//! storage technology.
//!
//! Every method takes the caller's [`RequestContext`](crate::request_context::RequestContext);
//! implementations abandon the call with `RepositoryError::Cancelled` once it
//! is cancelled or past its deadline.

pub mod journal;
pub mod message;
pub mod session;

pub use journal::JournalRepository;
pub use message::MessageRepository;
pub use session::SessionRepository;
