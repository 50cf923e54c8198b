//! Agent-backed task.
//!
//! Instantiates a fresh agent per invocation; the agent keeps calling tools
//! until the model answers with text. Progress is checkpointed after every
//! turn, so an interrupted run resumes from the stored conversation and a
//! finished one returns the stored answer without touching the LLM.

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::Agent;
use crate::context::Context;
use crate::errors::Error;
use crate::events::{AgentEvents, MultiplexEvents};
use crate::llm::LLM;
use crate::messages::History;
use crate::request::LLMRequest;
use crate::response::LLMResponse;
use crate::structured::RetryConfig;
use crate::workflows::persistence::{load_agent_task, AgentStorageHook};
use crate::workflows::Task;

pub struct AgentTask {
    name: String,
    request: LLMRequest,
    retry_config: Option<RetryConfig>,
    events: Vec<Arc<dyn AgentEvents>>,
}

impl AgentTask {
    pub fn new(name: impl Into<String>, request: LLMRequest) -> Self {
        Self {
            name: name.into(),
            request,
            retry_config: None,
            events: Vec::new(),
        }
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = Some(retry_config);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn AgentEvents>) -> Self {
        self.events.push(events);
        self
    }

    fn clone_inner(&self) -> Self {
        Self {
            name: self.name.clone(),
            request: self.request.clone(),
            retry_config: self.retry_config.clone(),
            events: self.events.clone(),
        }
    }
}

#[async_trait]
impl Task for AgentTask {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn invoke(
        &self,
        ctx: &Context,
        llm: &Arc<dyn LLM>,
        history: History,
    ) -> Result<LLMResponse, Error> {
        let mut request = self.request.clone().with_added_history(history);

        if let Some(state) = load_agent_task(ctx, &self.name).await {
            if state.terminal {
                return Ok(state.response);
            }
            // Resume the stored conversation where it left off.
            request = self
                .request
                .clone()
                .with_history(state.response.messages.clone());
        }

        let mut sinks: Vec<Arc<dyn AgentEvents>> =
            vec![Arc::new(AgentStorageHook::new(self.name.clone()))];
        sinks.extend(self.events.iter().cloned());

        let mut agent = Agent::new(llm.clone()).with_events(Arc::new(MultiplexEvents::new(sinks)));
        if let Some(retry_config) = &self.retry_config {
            agent = agent.with_retry_config(retry_config.clone());
        }

        agent.invoke(ctx, &request).await
    }

    fn clone_task(&self) -> Box<dyn Task> {
        Box::new(self.clone_inner())
    }

    fn with_name(&self, name: &str) -> Box<dyn Task> {
        let mut cloned = self.clone_inner();
        cloned.name = name.to_string();
        Box::new(cloned)
    }

    fn with_request(&self, overrides: &dyn Fn(&mut LLMRequest)) -> Box<dyn Task> {
        let mut cloned = self.clone_inner();
        overrides(&mut cloned.request);
        Box::new(cloned)
    }
}
