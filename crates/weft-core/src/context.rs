//! Per-invocation context threaded through every operation.
//!
//! Carries the cancellation token and the ambient workflow storage. A
//! `Context` is cheap to clone and is passed by reference through the LLM,
//! tool, and task layers. Without an attached storage, workflow tasks run
//! in pass-through mode and nothing is persisted.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::workflows::Storage;

#[derive(Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
    storage: Option<Arc<dyn Storage>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a storage to this context, enabling task checkpointing.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn storage(&self) -> Option<Arc<dyn Storage>> {
        self.storage.clone()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the context is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}
