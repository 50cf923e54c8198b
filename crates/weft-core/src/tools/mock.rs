//! Recording tool with scripted behavior, for tests and assertions.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::Context;
use crate::errors::Error;
use crate::tools::Tool;

#[derive(Clone, Debug, PartialEq)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub args: Value,
}

pub struct MockTool {
    name: String,
    description: String,
    input_schema: Value,
    output_schema: Option<Value>,
    response: Option<Value>,
    error: Option<String>,
    records: Mutex<Vec<ToolCallRecord>>,
}

impl MockTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            output_schema: None,
            response: None,
            error: None,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock mirroring an existing tool's surface.
    pub fn mirroring(original: &dyn Tool) -> Self {
        let mut mock = Self::new(
            original.name(),
            original.description(),
            original.input_schema(),
        );
        mock.output_schema = original.output_schema();
        mock
    }

    pub fn respond_with(mut self, response: Value) -> Self {
        self.error = None;
        self.response = Some(response);
        self
    }

    pub fn errors_with(mut self, error: impl Into<String>) -> Self {
        self.response = None;
        self.error = Some(error.into());
        self
    }

    pub fn calls(&self) -> Vec<ToolCallRecord> {
        self.records().clone()
    }

    pub fn last_call(&self) -> Option<ToolCallRecord> {
        self.records().last().cloned()
    }

    pub fn was_called(&self) -> bool {
        !self.records().is_empty()
    }

    pub fn clear(&self) {
        self.records().clear();
    }

    fn records(&self) -> std::sync::MutexGuard<'_, Vec<ToolCallRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }

    fn output_schema(&self) -> Option<Value> {
        self.output_schema.clone()
    }

    async fn execute(&self, _ctx: &Context, args: Value) -> Result<Value, Error> {
        self.records().push(ToolCallRecord {
            tool_name: self.name.clone(),
            args,
        });

        if let Some(error) = &self.error {
            return Err(Error::ToolExecution {
                tool_name: self.name.clone(),
                message: error.clone(),
            });
        }

        Ok(self.response.clone().unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_records_calls() {
        let tool = MockTool::new("greet", "Greet someone", json!({"type": "object"}))
            .respond_with(json!({"response": "Hello, John!"}));
        let ctx = Context::new();

        assert!(!tool.was_called());
        let result = tool.execute(&ctx, json!({"name": "John"})).await.unwrap();

        assert_eq!(result, json!({"response": "Hello, John!"}));
        assert!(tool.was_called());
        assert_eq!(tool.last_call().unwrap().args, json!({"name": "John"}));
    }

    #[tokio::test]
    async fn test_mock_scripted_error() {
        let tool = MockTool::new("greet", "Greet someone", json!({"type": "object"}))
            .errors_with("unavailable");
        let ctx = Context::new();

        let err = tool.execute(&ctx, json!({})).await.unwrap_err();
        assert!(matches!(err, Error::ToolExecution { .. }));
        assert_eq!(tool.calls().len(), 1);
    }
}
