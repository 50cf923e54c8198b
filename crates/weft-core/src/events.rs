//! Observer hooks for LLM and agent activity.
//!
//! All methods default to no-ops so sinks only override what they care
//! about. `LogAgentEvents` narrates conversations through the `log` facade;
//! `MultiplexEvents` fans events out to several sinks.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::Context;
use crate::errors::Error;
use crate::messages::{Message, ToolCall};
use crate::request::LLMRequest;
use crate::response::LLMResponse;

#[async_trait]
pub trait LLMEvents: Send + Sync {
    async fn on_request(&self, _ctx: &Context, _request: &LLMRequest) {}

    async fn on_response(&self, _ctx: &Context, _request: &LLMRequest, _response: &LLMResponse) {}

    async fn on_request_error(&self, _ctx: &Context, _request: &LLMRequest, _error: &Error) {}
}

#[async_trait]
pub trait AgentEvents: LLMEvents {
    async fn on_tool_call(&self, _ctx: &Context, _tool_call: &ToolCall) {}

    async fn on_tool_error(
        &self,
        _ctx: &Context,
        _tool_call: &ToolCall,
        _attempt: u32,
        _error: &Error,
    ) {
    }

    async fn on_tool_result(&self, _ctx: &Context, _tool_call: &ToolCall, _result: &Value) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAgentEvents;

impl NoopAgentEvents {
    pub fn new() -> Self {
        Self
    }
}

impl LLMEvents for NoopAgentEvents {}
impl AgentEvents for NoopAgentEvents {}

/// Narrates conversation traffic through `log`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAgentEvents;

impl LogAgentEvents {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LLMEvents for LogAgentEvents {
    async fn on_request(&self, _ctx: &Context, request: &LLMRequest) {
        if let Some(line) = request.history.last().and_then(|m| print_message(m, true)) {
            log::info!("{}", line);
        }
    }

    async fn on_response(&self, _ctx: &Context, _request: &LLMRequest, response: &LLMResponse) {
        for message in &response.messages {
            if let Some(line) = print_message(message, false) {
                log::info!("{}", line);
            }
        }
        log::info!("usage: {}", response.usage);
    }

    async fn on_request_error(&self, _ctx: &Context, _request: &LLMRequest, error: &Error) {
        log::error!("request error: {}", error);
    }
}

#[async_trait]
impl AgentEvents for LogAgentEvents {
    async fn on_tool_call(&self, _ctx: &Context, tool_call: &ToolCall) {
        log::info!(
            "tool call: calling {} with args: {}",
            tool_call.name,
            tool_call.args
        );
    }

    async fn on_tool_error(
        &self,
        _ctx: &Context,
        tool_call: &ToolCall,
        attempt: u32,
        error: &Error,
    ) {
        log::info!(
            "tool call failed: tool {} attempt {} error: {}",
            tool_call.name,
            attempt + 1,
            error
        );
    }

    async fn on_tool_result(&self, _ctx: &Context, tool_call: &ToolCall, result: &Value) {
        log::info!("tool call result: {} -> {}", tool_call.name, result);
    }
}

fn print_message(message: &Message, text_only: bool) -> Option<String> {
    match message {
        Message::Text { content, role } => Some(format!("{:?}: {}", role, content)),
        _ if text_only => None,
        Message::ToolCall { tool_call } => Some(format!(
            "tool call: calling {} with args: {}",
            tool_call.name, tool_call.args
        )),
        Message::ToolResult {
            tool_call,
            result,
            error,
        } => match error {
            Some(error) => Some(format!("tool error: {} -> {}", tool_call.name, error)),
            None => Some(format!("tool result: {} -> {}", tool_call.name, result)),
        },
        Message::ToolError { tool_call, error } => {
            Some(format!("tool error: {} -> {}", tool_call.name, error))
        }
    }
}

/// Fans events out to several sinks, in registration order.
#[derive(Clone, Default)]
pub struct MultiplexEvents {
    events: Vec<Arc<dyn AgentEvents>>,
}

impl MultiplexEvents {
    pub fn new(events: Vec<Arc<dyn AgentEvents>>) -> Self {
        Self { events }
    }

    pub fn add(&mut self, events: Arc<dyn AgentEvents>) {
        self.events.push(events);
    }
}

#[async_trait]
impl LLMEvents for MultiplexEvents {
    async fn on_request(&self, ctx: &Context, request: &LLMRequest) {
        for sink in &self.events {
            sink.on_request(ctx, request).await;
        }
    }

    async fn on_response(&self, ctx: &Context, request: &LLMRequest, response: &LLMResponse) {
        for sink in &self.events {
            sink.on_response(ctx, request, response).await;
        }
    }

    async fn on_request_error(&self, ctx: &Context, request: &LLMRequest, error: &Error) {
        for sink in &self.events {
            sink.on_request_error(ctx, request, error).await;
        }
    }
}

#[async_trait]
impl AgentEvents for MultiplexEvents {
    async fn on_tool_call(&self, ctx: &Context, tool_call: &ToolCall) {
        for sink in &self.events {
            sink.on_tool_call(ctx, tool_call).await;
        }
    }

    async fn on_tool_error(&self, ctx: &Context, tool_call: &ToolCall, attempt: u32, error: &Error) {
        for sink in &self.events {
            sink.on_tool_error(ctx, tool_call, attempt, error).await;
        }
    }

    async fn on_tool_result(&self, ctx: &Context, tool_call: &ToolCall, result: &Value) {
        for sink in &self.events {
            sink.on_tool_result(ctx, tool_call, result).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Captures event names in emission order.
    #[derive(Default)]
    pub struct RecordingEvents {
        seen: Mutex<Vec<String>>,
    }

    impl RecordingEvents {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seen(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        }

        fn record(&self, event: impl Into<String>) {
            self.seen
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(event.into());
        }
    }

    #[async_trait]
    impl LLMEvents for RecordingEvents {
        async fn on_request(&self, _ctx: &Context, _request: &LLMRequest) {
            self.record("request");
        }

        async fn on_response(&self, _ctx: &Context, _request: &LLMRequest, _response: &LLMResponse) {
            self.record("response");
        }

        async fn on_request_error(&self, _ctx: &Context, _request: &LLMRequest, _error: &Error) {
            self.record("request_error");
        }
    }

    #[async_trait]
    impl AgentEvents for RecordingEvents {
        async fn on_tool_call(&self, _ctx: &Context, tool_call: &ToolCall) {
            self.record(format!("tool_call:{}", tool_call.name));
        }

        async fn on_tool_error(
            &self,
            _ctx: &Context,
            tool_call: &ToolCall,
            attempt: u32,
            _error: &Error,
        ) {
            self.record(format!("tool_error:{}:{}", tool_call.name, attempt));
        }

        async fn on_tool_result(&self, _ctx: &Context, tool_call: &ToolCall, _result: &Value) {
            self.record(format!("tool_result:{}", tool_call.name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::RecordingEvents;
    use super::*;
    use crate::messages::{Message, ToolCall};
    use serde_json::json;

    #[tokio::test]
    async fn test_multiplex_forwards_in_registration_order() {
        let ctx = Context::new();
        let first = Arc::new(RecordingEvents::new());
        let second = Arc::new(RecordingEvents::new());

        let mut multiplex = MultiplexEvents::new(vec![first.clone()]);
        multiplex.add(second.clone());

        let request = LLMRequest::new();
        let response = LLMResponse::new(vec![Message::assistant("ok")]);
        let call = ToolCall::new("1", "greet", json!({}));

        multiplex.on_request(&ctx, &request).await;
        multiplex.on_response(&ctx, &request, &response).await;
        multiplex.on_tool_call(&ctx, &call).await;
        multiplex.on_tool_result(&ctx, &call, &json!({"ok": true})).await;

        let expected = vec![
            "request".to_string(),
            "response".to_string(),
            "tool_call:greet".to_string(),
            "tool_result:greet".to_string(),
        ];
        assert_eq!(first.seen(), expected);
        assert_eq!(second.seen(), expected);
    }

    #[test]
    fn test_print_message_skips_tool_traffic_in_text_only_mode() {
        let call = ToolCall::new("1", "greet", json!({}));

        assert!(print_message(&Message::user("hi"), true).is_some());
        assert!(print_message(&Message::tool_call(call.clone()), true).is_none());
        assert!(print_message(&Message::tool_call(call), false).is_some());
    }
}
