//! Token and tool-call usage accounting.
//!
//! `turns` counts distinct upstream LLM roundtrips, including correction
//! calls. Usage accumulates across recursive agent invocations and chained
//! tasks; each agent instance owns its counter and surfaces a snapshot in
//! the response.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::ToolCall;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub turns: u64,
    #[serde(default)]
    pub tool_calls: Vec<UsageToolCall>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageToolCall {
    pub name: String,
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Usage {
    /// Usage of a single completed roundtrip.
    pub fn new(prompt_tokens: u64, completion_tokens: u64, total_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
            turns: 1,
            tool_calls: Vec::new(),
        }
    }

    /// Empty accumulator: no roundtrips performed yet.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn add(&mut self, other: &Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
        self.turns += other.turns;
        self.tool_calls.extend(other.tool_calls.iter().cloned());
    }

    pub fn record_tool_call(&mut self, tool_call: &ToolCall, error: Option<String>) {
        self.tool_calls.push(UsageToolCall {
            name: tool_call.name.clone(),
            args: tool_call.args.clone(),
            error,
        });
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prompt: {}, completion: {}, total: {}, turns: {}, tools: {}",
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            self.turns,
            self.tool_calls.len()
        )?;

        for tool_call in &self.tool_calls {
            match &tool_call.error {
                Some(error) => write!(
                    f,
                    "\n  - [ERR] {}, {}, {}",
                    error, tool_call.name, tool_call.args
                )?,
                None => write!(f, "\n  - {}, {}", tool_call.name, tool_call.args)?,
            }
        }

        Ok(())
    }
}
