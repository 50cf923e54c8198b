//! Direct tool execution as a task.
//!
//! Runs a tool with fixed arguments and turns the result into a synthesized
//! user message carrying the output inside a titled markdown block.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::errors::Error;
use crate::llm::LLM;
use crate::messages::History;
use crate::prompts::PromptBuilder;
use crate::request::LLMRequest;
use crate::response::LLMResponse;
use crate::tools::Tool;
use crate::usage::Usage;
use crate::workflows::Task;
use serde_json::Value;

pub type ToolResultFormat = Arc<dyn Fn(&Value, &str) -> History + Send + Sync>;

pub struct ToolTask {
    name: String,
    tool: Arc<dyn Tool>,
    args: Value,
    format: ToolResultFormat,
}

impl ToolTask {
    pub fn new(name: impl Into<String>, tool: Arc<dyn Tool>, args: Value) -> Self {
        Self {
            name: name.into(),
            tool,
            args,
            format: Arc::new(default_format),
        }
    }

    pub fn with_format(
        mut self,
        format: impl Fn(&Value, &str) -> History + Send + Sync + 'static,
    ) -> Self {
        self.format = Arc::new(format);
        self
    }
}

fn default_format(result: &Value, title: &str) -> History {
    History::from(vec![PromptBuilder::new()
        .add_titled_block(title, result.to_string())
        .build_user_message()])
}

#[async_trait]
impl Task for ToolTask {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn invoke(
        &self,
        ctx: &Context,
        _llm: &Arc<dyn LLM>,
        history: History,
    ) -> Result<LLMResponse, Error> {
        let result = self.tool.execute(ctx, self.args.clone()).await?;
        let messages = (self.format)(&result, &self.name);

        let mut response = LLMResponse::new(messages).with_usage(Usage::zero());
        response.messages = history.append(response.messages);

        Ok(response)
    }

    fn clone_task(&self) -> Box<dyn Task> {
        Box::new(Self {
            name: self.name.clone(),
            tool: self.tool.clone(),
            args: self.args.clone(),
            format: self.format.clone(),
        })
    }

    fn with_name(&self, name: &str) -> Box<dyn Task> {
        Box::new(Self {
            name: name.to_string(),
            tool: self.tool.clone(),
            args: self.args.clone(),
            format: self.format.clone(),
        })
    }

    // Executes a tool, not a request: overrides do not apply.
    fn with_request(&self, _overrides: &dyn Fn(&mut LLMRequest)) -> Box<dyn Task> {
        self.clone_task()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Message;
    use crate::test_utils::ScriptedLLM;
    use crate::tools::MockTool;
    use serde_json::json;

    fn scripted() -> Arc<dyn LLM> {
        Arc::new(ScriptedLLM::new())
    }

    #[tokio::test]
    async fn test_result_rendered_as_titled_block() {
        let ctx = Context::new();
        let tool: Arc<dyn Tool> = Arc::new(
            MockTool::new("weather", "Weather lookup", json!({"type": "object"}))
                .respond_with(json!({"temp": 21})),
        );

        let task = ToolTask::new("forecast", tool, json!({"city": "Riga"}));
        let response = task.invoke(&ctx, &scripted(), History::new()).await.unwrap();

        assert_eq!(response.messages.len(), 1);
        let text = response.messages.messages()[0].as_text().unwrap();
        assert!(text.starts_with("# forecast"));
        assert!(text.contains("{\"temp\":21}"));
        assert_eq!(response.usage.turns, 0);
    }

    #[tokio::test]
    async fn test_custom_format() {
        let ctx = Context::new();
        let tool: Arc<dyn Tool> = Arc::new(
            MockTool::new("weather", "Weather lookup", json!({"type": "object"}))
                .respond_with(json!({"temp": 21})),
        );

        let task = ToolTask::new("forecast", tool, json!({}))
            .with_format(|result, _title| History::from(vec![Message::system(result.to_string())]));
        let response = task.invoke(&ctx, &scripted(), History::new()).await.unwrap();

        assert_eq!(
            response.messages.messages()[0],
            Message::system("{\"temp\":21}")
        );
    }

    #[tokio::test]
    async fn test_tool_failure_propagates() {
        let ctx = Context::new();
        let tool: Arc<dyn Tool> = Arc::new(
            MockTool::new("weather", "Weather lookup", json!({"type": "object"}))
                .errors_with("service down"),
        );

        let task = ToolTask::new("forecast", tool, json!({}));
        let error = task
            .invoke(&ctx, &scripted(), History::new())
            .await
            .unwrap_err();
        assert!(matches!(error, Error::ToolExecution { .. }));
    }
}
