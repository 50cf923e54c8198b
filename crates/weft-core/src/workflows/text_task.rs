//! Plain text-producing task.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::errors::Error;
use crate::llm::LLM;
use crate::messages::History;
use crate::request::LLMRequest;
use crate::response::LLMResponse;
use crate::workflows::persistence::{load_task, save_task};
use crate::workflows::Task;

/// Forwards the incoming history to the configured request and invokes the
/// LLM once. Checkpointed: a stored response short-circuits the call.
pub struct TextTask {
    name: String,
    request: LLMRequest,
}

impl TextTask {
    pub fn new(name: impl Into<String>, request: LLMRequest) -> Self {
        Self {
            name: name.into(),
            request,
        }
    }
}

#[async_trait]
impl Task for TextTask {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn invoke(
        &self,
        ctx: &Context,
        llm: &Arc<dyn LLM>,
        history: History,
    ) -> Result<LLMResponse, Error> {
        if let Some(response) = load_task(ctx, &self.name).await {
            return Ok(response);
        }

        let request = self.request.clone().with_history(history);
        let response = llm.invoke(ctx, &request).await?;

        save_task(ctx, &self.name, response).await
    }

    fn clone_task(&self) -> Box<dyn Task> {
        Box::new(Self {
            name: self.name.clone(),
            request: self.request.clone(),
        })
    }

    fn with_name(&self, name: &str) -> Box<dyn Task> {
        Box::new(Self {
            name: name.to_string(),
            request: self.request.clone(),
        })
    }

    fn with_request(&self, overrides: &dyn Fn(&mut LLMRequest)) -> Box<dyn Task> {
        let mut request = self.request.clone();
        overrides(&mut request);
        Box::new(Self {
            name: self.name.clone(),
            request,
        })
    }
}
