//! Callback-backed task.
//!
//! Defers work to a supplied async callback, which is handed the context,
//! the LLM, and the incoming history. The response's messages are the
//! incoming history followed by whatever the callback produced.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::context::Context;
use crate::errors::Error;
use crate::llm::LLM;
use crate::messages::History;
use crate::request::LLMRequest;
use crate::response::LLMResponse;
use crate::workflows::Task;

pub type LazyTaskCallback = Arc<
    dyn Fn(Context, Arc<dyn LLM>, History) -> BoxFuture<'static, Result<LLMResponse, Error>>
        + Send
        + Sync,
>;

pub struct LazyTask {
    name: String,
    callback: LazyTaskCallback,
}

impl LazyTask {
    pub fn new<F, Fut>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(Context, Arc<dyn LLM>, History) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<LLMResponse, Error>> + Send + 'static,
    {
        Self {
            name: name.into(),
            callback: Arc::new(move |ctx, llm, history| Box::pin(callback(ctx, llm, history))),
        }
    }
}

#[async_trait]
impl Task for LazyTask {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn invoke(
        &self,
        ctx: &Context,
        llm: &Arc<dyn LLM>,
        history: History,
    ) -> Result<LLMResponse, Error> {
        let mut response = (self.callback)(ctx.clone(), llm.clone(), history.clone()).await?;
        response.messages = history.append(response.messages);
        Ok(response)
    }

    fn clone_task(&self) -> Box<dyn Task> {
        Box::new(Self {
            name: self.name.clone(),
            callback: self.callback.clone(),
        })
    }

    fn with_name(&self, name: &str) -> Box<dyn Task> {
        Box::new(Self {
            name: name.to_string(),
            callback: self.callback.clone(),
        })
    }

    // Just a callback executor: request overrides do not apply.
    fn with_request(&self, _overrides: &dyn Fn(&mut LLMRequest)) -> Box<dyn Task> {
        self.clone_task()
    }
}
