//! The model backend seam.
//!
//! [`LlmProvider`] is implemented in farum-infra (Anthropic, offline mock).
//! Its `complete` returns `impl Future`, so [`BoxLlmProvider`] erases the
//! concrete backend when the choice is made from configuration at startup.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use farum_types::llm::{Completion, CompletionRequest, LlmError, ModelLimits};

/// A backend that turns one [`CompletionRequest`] into a [`Completion`].
pub trait LlmProvider: Send + Sync {
    /// Short backend name, recorded as `gen_ai.provider.name`.
    fn name(&self) -> &'static str;

    fn limits(&self) -> ModelLimits;

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<Completion, LlmError>> + Send;
}

type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<Completion, LlmError>> + Send + 'a>>;

trait ErasedProvider: Send + Sync {
    fn erased_name(&self) -> &'static str;
    fn erased_limits(&self) -> ModelLimits;
    fn complete_erased<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a>;
}

impl<P: LlmProvider> ErasedProvider for P {
    fn erased_name(&self) -> &'static str {
        self.name()
    }

    fn erased_limits(&self) -> ModelLimits {
        self.limits()
    }

    fn complete_erased<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a> {
        Box::pin(self.complete(request))
    }
}

/// Runtime-selected provider. Clones share the backend.
#[derive(Clone)]
pub struct BoxLlmProvider {
    inner: Arc<dyn ErasedProvider>,
}

impl BoxLlmProvider {
    pub fn new<P: LlmProvider + 'static>(provider: P) -> Self {
        Self {
            inner: Arc::new(provider),
        }
    }
}

impl LlmProvider for BoxLlmProvider {
    fn name(&self) -> &'static str {
        self.inner.erased_name()
    }

    fn limits(&self) -> ModelLimits {
        self.inner.erased_limits()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        self.inner.complete_erased(request).await
    }
}

impl std::fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BoxLlmProvider({})", self.inner.erased_name())
    }
}
