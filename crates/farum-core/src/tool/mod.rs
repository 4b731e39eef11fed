//! Tool contract for side-effecting capabilities invoked by pipeline stages.
//!
//! A tool receives loosely typed JSON input plus a [`ToolContext`] naming
//! the user and session it acts for, and returns JSON output. `BoxTool`
//! erases the concrete tool so stages can hold any implementation.

pub mod journal;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use farum_types::error::ToolError;
use uuid::Uuid;

use crate::request_context::RequestContext;

pub use journal::{JournalTool, JournalToolOutput};

/// Identity metadata for a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContext {
    pub user_id: String,
    pub session_id: String,
    pub request_id: Uuid,
}

/// A capability a pipeline stage can invoke.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait Tool: Send + Sync {
    /// Stable tool name (e.g., "journal_store").
    fn name(&self) -> &str;

    fn call(
        &self,
        ctx: &RequestContext,
        tool_ctx: &ToolContext,
        input: serde_json::Value,
    ) -> impl Future<Output = Result<serde_json::Value, ToolError>> + Send;
}

/// Object-safe version of [`Tool`] with boxed futures.
pub trait ToolDyn: Send + Sync {
    fn name(&self) -> &str;

    fn call_boxed<'a>(
        &'a self,
        ctx: &'a RequestContext,
        tool_ctx: &'a ToolContext,
        input: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ToolError>> + Send + 'a>>;
}

impl<T: Tool> ToolDyn for T {
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn call_boxed<'a>(
        &'a self,
        ctx: &'a RequestContext,
        tool_ctx: &'a ToolContext,
        input: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ToolError>> + Send + 'a>> {
        Box::pin(self.call(ctx, tool_ctx, input))
    }
}

/// Type-erased, shareable tool.
#[derive(Clone)]
pub struct BoxTool {
    inner: Arc<dyn ToolDyn>,
}

impl BoxTool {
    pub fn new<T: Tool + 'static>(tool: T) -> Self {
        Self {
            inner: Arc::new(tool),
        }
    }
}

impl Tool for BoxTool {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn call(
        &self,
        ctx: &RequestContext,
        tool_ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        self.inner.call_boxed(ctx, tool_ctx, input).await
    }
}

impl std::fmt::Debug for BoxTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxTool")
            .field("name", &self.inner.name())
            .finish()
    }
}
