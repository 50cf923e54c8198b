//! Response produced by one model turn.

use serde::{Deserialize, Serialize};

use crate::messages::{History, Message, MessageKind, ToolCall};
use crate::usage::Usage;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LLMResponse {
    pub messages: History,
    pub usage: Usage,
}

impl LLMResponse {
    /// A constructed response counts as one roundtrip; adapters stamp real
    /// token counts with [`LLMResponse::with_usage`].
    pub fn new(messages: impl Into<History>) -> Self {
        Self {
            messages: messages.into(),
            usage: Usage::new(0, 0, 0),
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn add_tool_call(&mut self, tool_call: ToolCall) {
        self.messages.push(Message::tool_call(tool_call));
    }

    /// Tool calls emitted in this turn, in provider order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.messages
            .iter()
            .filter_map(|message| message.as_tool_call().cloned())
            .collect()
    }

    /// Content of the final message, if it is text.
    pub fn last_text(&self) -> Option<&str> {
        self.messages.last().and_then(|message| message.as_text())
    }

    pub fn has_tool_calls(&self) -> bool {
        self.messages
            .iter()
            .any(|message| message.kind() == MessageKind::ToolCall)
    }
}
