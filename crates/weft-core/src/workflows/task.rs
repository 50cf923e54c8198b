//! The composable unit of a workflow.
//!
//! A task is a named operation from an input history to an `LLMResponse`.
//! Tasks compose sequentially with `then` (forwarding the full resulting
//! history) and `pipe` (forwarding only the last message).

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::errors::Error;
use crate::llm::LLM;
use crate::messages::History;
use crate::request::LLMRequest;
use crate::response::LLMResponse;
use crate::workflows::ChainTask;

#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> String;

    async fn invoke(
        &self,
        ctx: &Context,
        llm: &Arc<dyn LLM>,
        history: History,
    ) -> Result<LLMResponse, Error>;

    fn clone_task(&self) -> Box<dyn Task>;

    fn with_name(&self, name: &str) -> Box<dyn Task>;

    /// Returns a copy with the given overrides applied to the embedded
    /// request template. Tasks without a request template return a plain
    /// clone.
    fn with_request(&self, overrides: &dyn Fn(&mut LLMRequest)) -> Box<dyn Task>;
}

#[async_trait]
impl Task for Box<dyn Task> {
    fn name(&self) -> String {
        (**self).name()
    }

    async fn invoke(
        &self,
        ctx: &Context,
        llm: &Arc<dyn LLM>,
        history: History,
    ) -> Result<LLMResponse, Error> {
        (**self).invoke(ctx, llm, history).await
    }

    fn clone_task(&self) -> Box<dyn Task> {
        (**self).clone_task()
    }

    fn with_name(&self, name: &str) -> Box<dyn Task> {
        (**self).with_name(name)
    }

    fn with_request(&self, overrides: &dyn Fn(&mut LLMRequest)) -> Box<dyn Task> {
        (**self).with_request(overrides)
    }
}

/// Sequential composition.
pub trait TaskExt: Task + Sized + 'static {
    /// Runs `self`, then `next` with the full resulting history.
    fn then(self, next: impl Task + 'static) -> ChainTask {
        ChainTask::new(Box::new(self), Box::new(next), false)
    }

    /// Runs `self`, then `next` with only the last resulting message.
    fn pipe(self, next: impl Task + 'static) -> ChainTask {
        ChainTask::new(Box::new(self), Box::new(next), true)
    }
}

impl<T: Task + Sized + 'static> TaskExt for T {}
