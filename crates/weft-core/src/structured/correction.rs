//! Schema-constrained correction calls.
//!
//! A one-shot LLM roundtrip that repairs the parameters of a failing
//! operation: the failure description goes in as history, a fresh
//! `StructuredLLM` over the target schema enforces the output shape, and
//! the corrected JSON value comes back out.

use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::errors::Error;
use crate::llm::LLM;
use crate::messages::History;
use crate::request::{LLMRequest, ModelId};
use crate::structured::StructuredLLM;
use crate::usage::Usage;

/// A corrected JSON value plus the usage the correction roundtrips cost.
#[derive(Clone, Debug, PartialEq)]
pub struct Correction {
    pub args: Value,
    pub usage: Usage,
}

pub struct Corrector {
    model: ModelId,
    schema: Value,
    system: String,
}

impl Corrector {
    pub fn new(model: impl Into<ModelId>, schema: Value, system: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            schema,
            system: system.into(),
        }
    }

    pub async fn execute(
        &self,
        ctx: &Context,
        llm: Arc<dyn LLM>,
        history: History,
    ) -> Result<Correction, Error> {
        let request = LLMRequest::new()
            .with_system(&self.system)
            .with_history(history)
            .with_model(self.model.clone())
            .with_temperature(0.1);

        let structured = StructuredLLM::new(self.schema.clone(), llm);
        let response = structured.invoke(ctx, &request).await.map_err(|err| match err {
            Error::Cancelled => Error::Cancelled,
            other => Error::Correction(format!("failed to get corrected parameters: {}", other)),
        })?;

        if let Some(tool_call) = response.tool_calls().first() {
            return Ok(Correction {
                args: tool_call.args.clone(),
                usage: response.usage,
            });
        }

        // The structured LLM reports its result as a final schema-valid
        // text message; that text is the corrected value.
        if let Some(text) = response.last_text() {
            if let Ok(args) = serde_json::from_str::<Value>(text) {
                return Ok(Correction {
                    args,
                    usage: response.usage.clone(),
                });
            }
        }

        Err(Error::Correction(
            "structured LLM did not provide corrected parameters".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Message, ToolCall};
    use crate::request::models;
    use crate::response::LLMResponse;
    use crate::structured::DEFAULT_FORMATTER_NAME;
    use crate::test_utils::ScriptedLLM;
    use serde_json::json;

    fn greet_schema() -> Value {
        json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"]
        })
    }

    #[tokio::test]
    async fn test_returns_corrected_args() {
        let ctx = Context::new();
        let mock = Arc::new(
            ScriptedLLM::new().push_response(LLMResponse::new(vec![Message::tool_call(
                ToolCall::new("1", DEFAULT_FORMATTER_NAME, json!({"name": "John"})),
            )])),
        );

        let corrector = Corrector::new(
            models::CLAUDE_4_SONNET,
            greet_schema(),
            "You are a tool call corrector.",
        );
        let correction = corrector
            .execute(
                &ctx,
                mock.clone(),
                History::from(vec![Message::user("Tool call to 'greet' failed")]),
            )
            .await
            .unwrap();

        assert_eq!(correction.args, json!({"name": "John"}));
        assert_eq!(correction.usage.turns, 1);

        // The system prompt and low temperature travel with the request.
        let request = &mock.requests()[0];
        assert_eq!(request.system.as_deref(), Some("You are a tool call corrector."));
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.model, ModelId::from(models::CLAUDE_4_SONNET));
    }

    #[tokio::test]
    async fn test_wraps_structured_failure() {
        let ctx = Context::new();
        let mock = Arc::new(
            ScriptedLLM::new()
                .push_response(LLMResponse::new(vec![Message::assistant("no call")])),
        );

        let corrector = Corrector::new(models::CLAUDE_4_SONNET, greet_schema(), "system");
        let error = corrector
            .execute(&ctx, mock, History::new())
            .await
            .unwrap_err();

        match error {
            Error::Correction(message) => {
                assert!(message.contains("failed to get corrected parameters"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
