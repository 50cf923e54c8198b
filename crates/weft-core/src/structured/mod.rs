//! Structured output enforcement.
//!
//! `StructuredLLM` wraps a plain LLM so its reply is guaranteed to conform
//! to a JSON Schema. It presents itself to the model as the only available
//! tool (`formatter` by default) with forced tool usage; the tool-call
//! arguments are the structured result. Validation failures feed a retry
//! loop that replays the request with the previous error appended.

use std::sync::Arc;

use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde_json::Value;

use crate::context::Context;
use crate::errors::Error;
use crate::events::{AgentEvents, NoopAgentEvents};
use crate::llm::LLM;
use crate::messages::{History, Message};
use crate::request::{LLMRequest, ToolUsage};
use crate::response::LLMResponse;
use crate::tools::{Tool, Toolbox};
use crate::usage::Usage;

pub mod correction;
pub mod retry;

pub use correction::{Correction, Corrector};
pub use retry::{Retrier, RetryConfig, Retryable};

pub const DEFAULT_FORMATTER_NAME: &str = "formatter";
pub const DEFAULT_FORMATTER_DESCRIPTION: &str = "Must be called to provide structured output";

/// LLM decorator that forces a single schema-validated tool call.
///
/// The value is simultaneously a [`Tool`] (presented to the model) and an
/// [`LLM`] (consumed by callers). On success the response's only message is
/// an assistant text whose content is the raw, schema-valid JSON.
#[derive(Clone)]
pub struct StructuredLLM {
    name: String,
    description: String,
    schema: Value,
    llm: Arc<dyn LLM>,
    retry_config: RetryConfig,
    events: Arc<dyn AgentEvents>,
}

impl StructuredLLM {
    pub fn new(schema: Value, llm: Arc<dyn LLM>) -> Self {
        Self {
            name: DEFAULT_FORMATTER_NAME.to_string(),
            description: DEFAULT_FORMATTER_DESCRIPTION.to_string(),
            schema,
            llm,
            retry_config: RetryConfig::default(),
            events: Arc::new(NoopAgentEvents),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn AgentEvents>) -> Self {
        self.events = events;
        self
    }
}

/// Validates a document against a schema, collecting every error.
pub(crate) fn validate_against(schema: &Value, document: &Value) -> Result<(), Error> {
    let compiled = JSONSchema::compile(schema)
        .map_err(|err| Error::InvalidSchema(format!("failed to compile schema: {}", err)))?;

    if let Err(errors) = compiled.validate(document) {
        let messages: Vec<String> = errors.map(|err| err.to_string()).collect();
        return Err(Error::SchemaValidation(messages.join("; ")));
    }

    Ok(())
}

#[async_trait]
impl Tool for StructuredLLM {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.schema.clone()
    }

    /// Validates the arguments and echoes them back. This is how the value
    /// participates in the forced-tool handshake.
    async fn execute(&self, _ctx: &Context, args: Value) -> Result<Value, Error> {
        validate_against(&self.schema, &args)?;
        Ok(args)
    }
}

#[async_trait]
impl LLM for StructuredLLM {
    async fn invoke(&self, ctx: &Context, request: &LLMRequest) -> Result<LLMResponse, Error> {
        let formatter: Arc<dyn Tool> = Arc::new(self.clone());

        // The formatter is the only tool the model gets to see.
        let forced = request
            .clone()
            .with_toolbox(Toolbox::from(vec![formatter]))
            .with_tool_usage(ToolUsage::forced(self.name.clone()));

        self.events.on_request(ctx, &forced).await;

        let operation = StructuredOperation {
            llm: self.llm.clone(),
            request: forced,
            formatter: self.clone(),
            events: self.events.clone(),
            usage: Usage::zero(),
            previous_error: None,
        };

        Retrier::new(self.retry_config.clone(), operation)
            .execute(ctx)
            .await
    }
}

struct StructuredOperation {
    llm: Arc<dyn LLM>,
    request: LLMRequest,
    formatter: StructuredLLM,
    events: Arc<dyn AgentEvents>,
    usage: Usage,
    previous_error: Option<String>,
}

#[async_trait]
impl Retryable for StructuredOperation {
    type Output = LLMResponse;

    async fn attempt(&mut self, ctx: &Context, attempt: u32) -> Result<LLMResponse, Error> {
        if let Some(previous) = self.previous_error.take() {
            self.request = self
                .request
                .clone()
                .with_added_history(History::from(vec![Message::user(previous)]));
        }

        let response = self.llm.invoke(ctx, &self.request).await?;
        self.usage.add(&response.usage);

        let tool_calls = response.tool_calls();
        let tool_call = match tool_calls.as_slice() {
            [] => return Err(Error::NoToolCall),
            [tool_call] => tool_call,
            many => return Err(Error::TooManyToolCalls(many.len())),
        };

        let validated = match self.formatter.execute(ctx, tool_call.args.clone()).await {
            Ok(validated) => validated,
            Err(error) => {
                self.events
                    .on_tool_error(ctx, tool_call, attempt, &error)
                    .await;
                return Err(error);
            }
        };

        let content = serde_json::to_string(&validated)?;
        let payload =
            LLMResponse::new(vec![Message::assistant(content)]).with_usage(self.usage.clone());

        self.events.on_response(ctx, &self.request, &payload).await;

        Ok(payload)
    }

    async fn on_failure(
        &mut self,
        _ctx: &Context,
        _attempt: u32,
        error: &Error,
    ) -> Result<(), Error> {
        self.previous_error = Some(error.to_string());
        Ok(())
    }
}
