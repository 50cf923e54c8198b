//! Multi-turn tool-executing agent loop.
//!
//! The agent drives a conversation until the model stops emitting tool
//! calls: each tool call is executed (with retry and LLM-backed parameter
//! correction), its result is appended to the conversation, and the model
//! is invoked again with the grown history. A tool call that keeps failing
//! becomes an error-bearing tool result rather than aborting the run, so
//! the model can observe and react. Provider errors are fatal.
//!
//! Agent instances are single-invocation: they accumulate usage across
//! turns and correction calls and are then discarded.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::context::Context;
use crate::errors::Error;
use crate::events::{AgentEvents, NoopAgentEvents};
use crate::llm::LLM;
use crate::messages::{History, Message, ToolCall};
use crate::request::LLMRequest;
use crate::response::LLMResponse;
use crate::structured::{Corrector, Retrier, RetryConfig, Retryable};
use crate::tools::Tool;
use crate::usage::Usage;

const CORRECTION_SYSTEM_PROMPT: &str =
    "You are a tool call corrector. You are given a tool call that failed and you need to correct it.";

pub struct Agent {
    llm: Arc<dyn LLM>,
    retry_config: RetryConfig,
    events: Arc<dyn AgentEvents>,
    total_usage: Arc<Mutex<Usage>>,
}

impl Agent {
    pub fn new(llm: Arc<dyn LLM>) -> Self {
        Self {
            llm,
            retry_config: RetryConfig::default(),
            events: Arc::new(NoopAgentEvents),
            total_usage: Arc::new(Mutex::new(Usage::zero())),
        }
    }

    /// Retry configuration for failing tool calls.
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn AgentEvents>) -> Self {
        self.events = events;
        self
    }
}

#[async_trait]
impl LLM for Agent {
    async fn invoke(&self, ctx: &Context, request: &LLMRequest) -> Result<LLMResponse, Error> {
        let mut request = request.clone();

        loop {
            self.events.on_request(ctx, &request).await;

            let mut response = match self.llm.invoke(ctx, &request).await {
                Ok(response) => response,
                Err(error) => {
                    self.events.on_request_error(ctx, &request, &error).await;
                    return Err(error);
                }
            };

            self.events.on_response(ctx, &request, &response).await;
            self.total_usage.lock().await.add(&response.usage);

            let tool_calls = response.tool_calls();
            if tool_calls.is_empty() {
                // Surface usage to-date rather than just this turn's.
                response.usage = self.total_usage.lock().await.clone();
                return Ok(response);
            }

            for tool_call in tool_calls {
                self.events.on_tool_call(ctx, &tool_call).await;

                let target_tool = request.tools.find(&tool_call.name)?;

                let operation = ToolCallOperation {
                    llm: self.llm.clone(),
                    tool_call: tool_call.clone(),
                    target_tool,
                    events: self.events.clone(),
                    config: self.retry_config.clone(),
                    usage: self.total_usage.clone(),
                };

                match Retrier::new(self.retry_config.clone(), operation)
                    .execute(ctx)
                    .await
                {
                    Ok(message) => {
                        self.total_usage.lock().await.record_tool_call(&tool_call, None);
                        response.add_message(message);
                    }
                    Err(Error::Cancelled) => return Err(Error::Cancelled),
                    Err(error) => {
                        log::warn!(
                            "tool call '{}' failed permanently: {}",
                            tool_call.name,
                            error
                        );
                        self.total_usage
                            .lock()
                            .await
                            .record_tool_call(&tool_call, Some(error.to_string()));
                        response.add_message(Message::tool_result_error(
                            tool_call.clone(),
                            error.to_string(),
                        ));
                    }
                }
            }

            let next_history = request.history.clone().append(response.messages.clone());
            request = request.with_history(next_history);
        }
    }
}

/// One tool call driven through the retrier: attempts execute the tool with
/// the current arguments; between attempts a corrector call replaces the
/// arguments with schema-conforming ones.
struct ToolCallOperation {
    llm: Arc<dyn LLM>,
    tool_call: ToolCall,
    target_tool: Arc<dyn Tool>,
    events: Arc<dyn AgentEvents>,
    config: RetryConfig,
    usage: Arc<Mutex<Usage>>,
}

#[async_trait]
impl Retryable for ToolCallOperation {
    type Output = Message;

    async fn attempt(&mut self, ctx: &Context, attempt: u32) -> Result<Message, Error> {
        match self
            .target_tool
            .execute(ctx, self.tool_call.args.clone())
            .await
        {
            Ok(result) => {
                self.events.on_tool_result(ctx, &self.tool_call, &result).await;
                Ok(Message::tool_result(self.tool_call.clone(), result))
            }
            Err(error) => {
                self.events
                    .on_tool_error(ctx, &self.tool_call, attempt, &error)
                    .await;
                Err(error)
            }
        }
    }

    async fn on_failure(
        &mut self,
        ctx: &Context,
        attempt: u32,
        error: &Error,
    ) -> Result<(), Error> {
        let corrector = Corrector::new(
            self.config.model.clone(),
            self.target_tool.input_schema(),
            CORRECTION_SYSTEM_PROMPT,
        );

        let prompt = format!(
            "Tool call to '{}' failed with error: {}\n\
             Failed parameters: {}\n\
             Use 'formatter' tool to generate corrected parameters that match the tool's input schema above.",
            self.tool_call.name,
            error,
            pretty_json(&self.tool_call.args),
        );

        let correction = corrector
            .execute(ctx, self.llm.clone(), History::from(vec![Message::user(prompt)]))
            .await?;

        log::info!(
            "corrected parameters for '{}' after attempt {}: {}",
            self.tool_call.name,
            attempt + 1,
            correction.args
        );

        self.usage.lock().await.add(&correction.usage);
        self.tool_call.args = correction.args;

        Ok(())
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
