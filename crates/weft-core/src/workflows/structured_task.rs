//! Schema-enforced task.
//!
//! Wraps the invocation LLM in a `StructuredLLM` so the final message is
//! text whose content is schema-valid JSON. The response still carries the
//! full `LLMResponse` details for composition.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::Context;
use crate::errors::Error;
use crate::events::AgentEvents;
use crate::llm::LLM;
use crate::messages::History;
use crate::request::LLMRequest;
use crate::response::LLMResponse;
use crate::structured::{RetryConfig, StructuredLLM};
use crate::tools::schema_for;
use crate::workflows::persistence::{load_task, save_task};
use crate::workflows::Task;

pub struct StructuredTask {
    name: String,
    schema: Value,
    request: LLMRequest,
    formatter_name: Option<String>,
    formatter_description: Option<String>,
    retry_config: Option<RetryConfig>,
    events: Option<Arc<dyn AgentEvents>>,
}

impl StructuredTask {
    /// Builds a task around a pre-generated schema.
    pub fn new(name: impl Into<String>, schema: Value, request: LLMRequest) -> Self {
        Self {
            name: name.into(),
            schema,
            request,
            formatter_name: None,
            formatter_description: None,
            retry_config: None,
            events: None,
        }
    }

    /// Builds a task whose schema is derived from `T`.
    pub fn for_type<T: JsonSchema>(
        name: impl Into<String>,
        request: LLMRequest,
    ) -> Result<Self, Error> {
        Ok(Self::new(name, schema_for::<T>()?, request))
    }

    pub fn with_formatter_name(mut self, name: impl Into<String>) -> Self {
        self.formatter_name = Some(name.into());
        self
    }

    pub fn with_formatter_description(mut self, description: impl Into<String>) -> Self {
        self.formatter_description = Some(description.into());
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = Some(retry_config);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn AgentEvents>) -> Self {
        self.events = Some(events);
        self
    }

    /// Parses a structured response's final text into `T`.
    pub fn parse_result<T: DeserializeOwned>(response: &LLMResponse) -> Result<T, Error> {
        let text = response
            .last_text()
            .ok_or_else(|| Error::Shape("last message is not a text message".to_string()))?;

        serde_json::from_str(text)
            .map_err(|err| Error::Shape(format!("failed to parse structured response: {}", err)))
    }

    fn clone_inner(&self) -> Self {
        Self {
            name: self.name.clone(),
            schema: self.schema.clone(),
            request: self.request.clone(),
            formatter_name: self.formatter_name.clone(),
            formatter_description: self.formatter_description.clone(),
            retry_config: self.retry_config.clone(),
            events: self.events.clone(),
        }
    }
}

#[async_trait]
impl Task for StructuredTask {
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

        let mut structured = StructuredLLM::new(self.schema.clone(), llm.clone());
        if let Some(name) = &self.formatter_name {
            structured = structured.with_name(name.clone());
        }
        if let Some(description) = &self.formatter_description {
            structured = structured.with_description(description.clone());
        }
        if let Some(retry_config) = &self.retry_config {
            structured = structured.with_retry_config(retry_config.clone());
        }
        if let Some(events) = &self.events {
            structured = structured.with_events(events.clone());
        }

        let request = self.request.clone().with_added_history(history);
        let response = structured.invoke(ctx, &request).await?;

        if response.last_text().is_none() {
            return Err(Error::Shape("last message is not a text message".to_string()));
        }

        save_task(ctx, &self.name, response).await
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Message, ToolCall};
    use crate::structured::DEFAULT_FORMATTER_NAME;
    use crate::test_utils::ScriptedLLM;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq, JsonSchema)]
    struct Flight {
        flight_number: String,
        price: i64,
    }

    fn formatter_call(args: Value) -> LLMResponse {
        LLMResponse::new(vec![Message::tool_call(ToolCall::new(
            "1",
            DEFAULT_FORMATTER_NAME,
            args,
        ))])
    }

    #[tokio::test]
    async fn test_structured_output_parses_into_type() {
        let ctx = Context::new();
        let mock = Arc::new(
            ScriptedLLM::new()
                .push_response(formatter_call(json!({"flight_number": "US23", "price": 100}))),
        );
        let llm: Arc<dyn LLM> = mock;

        let task = StructuredTask::for_type::<Flight>("flight", LLMRequest::new()).unwrap();
        let response = task
            .invoke(&ctx, &llm, History::from(vec![Message::user("find a flight")]))
            .await
            .unwrap();

        let flight: Flight = StructuredTask::parse_result(&response).unwrap();
        assert_eq!(
            flight,
            Flight {
                flight_number: "US23".to_string(),
                price: 100
            }
        );
    }

    #[tokio::test]
    async fn test_template_history_is_kept() {
        let ctx = Context::new();
        let mock = Arc::new(
            ScriptedLLM::new().push_response(formatter_call(json!({"flight_number": "US23", "price": 1}))),
        );
        let llm: Arc<dyn LLM> = mock.clone();

        let template = LLMRequest::new()
            .with_history(History::from(vec![Message::system("format flights")]));
        let task = StructuredTask::for_type::<Flight>("flight", template).unwrap();

        task.invoke(&ctx, &llm, History::from(vec![Message::user("go")]))
            .await
            .unwrap();

        // Incoming history is appended after the template's.
        let seen = &mock.requests()[0];
        assert_eq!(seen.history.len(), 2);
        assert_eq!(seen.history.messages()[0], Message::system("format flights"));
        assert_eq!(seen.history.messages()[1], Message::user("go"));
    }
}
