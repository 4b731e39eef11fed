//! Read access to users' journals.

pub mod service;

pub use service::JournalService;
