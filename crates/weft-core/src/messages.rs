//! Conversation messages and history.
//!
//! Messages form a closed sum type so that provider adapters can handle
//! every variant exhaustively. `ToolError` is internal bookkeeping for the
//! agent loop and must never be forwarded to a provider.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    ToolCall,
    ToolResult,
    ToolError,
}

/// A model-emitted request to run a named tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    Text {
        content: String,
        role: Role,
    },
    ToolCall {
        tool_call: ToolCall,
    },
    ToolResult {
        tool_call: ToolCall,
        #[serde(default)]
        result: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    ToolError {
        tool_call: ToolCall,
        error: String,
    },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message::Text {
            content: content.into(),
            role: Role::User,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Text {
            content: content.into(),
            role: Role::Assistant,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Message::Text {
            content: content.into(),
            role: Role::System,
        }
    }

    pub fn tool_call(tool_call: ToolCall) -> Self {
        Message::ToolCall { tool_call }
    }

    pub fn tool_result(tool_call: ToolCall, result: Value) -> Self {
        Message::ToolResult {
            tool_call,
            result,
            error: None,
        }
    }

    pub fn tool_result_error(tool_call: ToolCall, error: impl Into<String>) -> Self {
        Message::ToolResult {
            tool_call,
            result: Value::Null,
            error: Some(error.into()),
        }
    }

    pub fn tool_error(tool_call: ToolCall, error: impl Into<String>) -> Self {
        Message::ToolError {
            tool_call,
            error: error.into(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Text { .. } => MessageKind::Text,
            Message::ToolCall { .. } => MessageKind::ToolCall,
            Message::ToolResult { .. } => MessageKind::ToolResult,
            Message::ToolError { .. } => MessageKind::ToolError,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::Text { role, .. } => *role,
            Message::ToolCall { .. } => Role::Assistant,
            Message::ToolResult { .. } => Role::Tool,
            Message::ToolError { .. } => Role::Assistant,
        }
    }

    /// Text content, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            Message::ToolCall { tool_call } => Some(tool_call),
            _ => None,
        }
    }
}

/// Ordered, append-only conversation log. Mutation always happens on a
/// clone owned by the caller; chained tasks never see each other's edits.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<Message>);

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.0.push(message);
    }

    pub fn append(mut self, other: History) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn last(&self) -> Option<&Message> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }
}

impl From<Vec<Message>> for History {
    fn from(messages: Vec<Message>) -> Self {
        Self(messages)
    }
}

impl FromIterator<Message> for History {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for History {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Extend<Message> for History {
    fn extend<I: IntoIterator<Item = Message>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_roles() {
        assert_eq!(Message::user("hi").role(), Role::User);
        assert_eq!(Message::assistant("hi").role(), Role::Assistant);
        assert_eq!(Message::system("hi").role(), Role::System);

        let call = ToolCall::new("1", "greet", json!({"name": "John"}));
        assert_eq!(Message::tool_call(call.clone()).role(), Role::Assistant);
        assert_eq!(
            Message::tool_result(call.clone(), json!({"ok": true})).role(),
            Role::Tool
        );
        assert_eq!(Message::tool_error(call, "boom").role(), Role::Assistant);
    }

    #[test]
    fn test_history_append_preserves_order() {
        let first = History::from(vec![Message::user("a"), Message::user("b")]);
        let second = History::from(vec![Message::assistant("c")]);

        let combined = first.append(second);
        assert_eq!(combined.len(), 3);
        assert_eq!(combined.last(), Some(&Message::assistant("c")));
    }

    #[test]
    fn test_message_round_trips_through_json() {
        let call = ToolCall::new("1", "greet", json!({"name": "John"}));
        let message = Message::tool_result(call, json!({"response": "Hello, John!"}));

        let payload = serde_json::to_string(&message).unwrap();
        let decoded: Message = serde_json::from_str(&payload).unwrap();
        assert_eq!(decoded, message);
    }
}
