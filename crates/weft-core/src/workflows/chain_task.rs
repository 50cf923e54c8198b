//! Sequential composition of two tasks.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::errors::Error;
use crate::llm::LLM;
use crate::messages::History;
use crate::request::LLMRequest;
use crate::response::LLMResponse;
use crate::workflows::Task;

/// Invokes `before`, then `after` with either the full resulting history or
/// only its last message (`last_only`). Usage is additive across the chain.
pub struct ChainTask {
    before: Box<dyn Task>,
    after: Box<dyn Task>,
    last_only: bool,
    name: Option<String>,
}

impl ChainTask {
    pub fn new(before: Box<dyn Task>, after: Box<dyn Task>, last_only: bool) -> Self {
        Self {
            before,
            after,
            last_only,
            name: None,
        }
    }
}

#[async_trait]
impl Task for ChainTask {
    fn name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} > {}", self.before.name(), self.after.name()),
        }
    }

    async fn invoke(
        &self,
        ctx: &Context,
        llm: &Arc<dyn LLM>,
        history: History,
    ) -> Result<LLMResponse, Error> {
        let before = self.before.invoke(ctx, llm, history).await?;

        let forwarded = if self.last_only {
            match before.messages.last() {
                Some(last) => History::from(vec![last.clone()]),
                None => return Err(Error::Shape("last message is nil".to_string())),
            }
        } else {
            before.messages.clone()
        };

        let mut after = self.after.invoke(ctx, llm, forwarded).await?;
        after.usage.add(&before.usage);

        Ok(after)
    }

    fn clone_task(&self) -> Box<dyn Task> {
        Box::new(Self {
            before: self.before.clone_task(),
            after: self.after.clone_task(),
            last_only: self.last_only,
            name: self.name.clone(),
        })
    }

    fn with_name(&self, name: &str) -> Box<dyn Task> {
        Box::new(Self {
            before: self.before.clone_task(),
            after: self.after.clone_task(),
            last_only: self.last_only,
            name: Some(name.to_string()),
        })
    }

    fn with_request(&self, overrides: &dyn Fn(&mut LLMRequest)) -> Box<dyn Task> {
        Box::new(Self {
            before: self.before.with_request(overrides),
            after: self.after.with_request(overrides),
            last_only: self.last_only,
            name: self.name.clone(),
        })
    }
}
