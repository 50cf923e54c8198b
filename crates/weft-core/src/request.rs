//! Immutable configuration for one model turn.
//!
//! Requests are assembled with chainable `with_*` builders and cloned with
//! per-call overrides by the layers above (agent, structured output,
//! workflow tasks). The request itself performs no I/O.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::messages::History;
use crate::tools::{Tool, Toolbox};

/// Well-known model identifiers.
pub mod models {
    pub const CLAUDE_3_SONNET: &str = "claude-3-7-sonnet";
    pub const CLAUDE_4_SONNET: &str = "claude-4-sonnet";
    pub const CLAUDE_3_HAIKU: &str = "claude-3-5-haiku";
    pub const GEMINI_25_FLASH: &str = "gemini-2-5-flash";
    pub const GEMINI_25_PRO: &str = "gemini-2-5-pro";
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ModelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tool-choice policy for the next assistant turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ToolUsage {
    #[default]
    Auto,
    Forced {
        name: String,
    },
}

impl ToolUsage {
    pub fn forced(name: impl Into<String>) -> Self {
        ToolUsage::Forced { name: name.into() }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LLMRequest {
    pub model: ModelId,
    pub system: Option<String>,
    pub history: History,
    pub tools: Toolbox,
    pub tool_usage: ToolUsage,
    pub max_completion_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

impl LLMRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<ModelId>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    pub fn with_added_history(mut self, history: History) -> Self {
        self.history = self.history.append(history);
        self
    }

    /// Appends tools to the request toolbox.
    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools = self.tools.add_tools(tools);
        self
    }

    /// Replaces the request toolbox wholesale.
    pub fn with_toolbox(mut self, tools: Toolbox) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_usage(mut self, tool_usage: ToolUsage) -> Self {
        self.tool_usage = tool_usage;
        self
    }

    pub fn with_max_completion_tokens(mut self, max_completion_tokens: u32) -> Self {
        self.max_completion_tokens = Some(max_completion_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Message;

    #[test]
    fn test_builder_defaults() {
        let request = LLMRequest::new();
        assert_eq!(request.tool_usage, ToolUsage::Auto);
        assert!(request.history.is_empty());
        assert!(request.system.is_none());
    }

    #[test]
    fn test_added_history_appends() {
        let request = LLMRequest::new()
            .with_history(History::from(vec![Message::system("base")]))
            .with_added_history(History::from(vec![Message::user("task")]));

        assert_eq!(request.history.len(), 2);
        assert_eq!(request.history.last(), Some(&Message::user("task")));
    }

    #[test]
    fn test_clone_with_overrides_leaves_original_intact() {
        let request = LLMRequest::new()
            .with_model(models::CLAUDE_4_SONNET)
            .with_temperature(0.7);

        let cloned = request.clone().with_temperature(0.1);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(cloned.temperature, Some(0.1));
        assert_eq!(cloned.model, request.model);
    }
}
