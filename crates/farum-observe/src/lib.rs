//! Observability for Farum: tracing subscriber setup and teardown.

pub mod tracing_setup;

pub use tracing_setup::{LogFormat, init_tracing, shutdown_tracing};
