//! Agentic orchestration core for LLM-driven workflows.
//!
//! This crate turns high-level workflow descriptions into sequences of LLM
//! calls, tool invocations, retry/correction loops, and schema-validated
//! structured outputs, with optional checkpointing for resume-after-failure.
//!
//! # Architecture Overview
//!
//! The core is built from four tightly coupled subsystems:
//!
//! - **Agent loop**: multi-turn conversations where the model emits tool
//!   calls; the runtime executes them, feeds results back, and continues
//!   until a textual turn
//! - **Structured output**: an LLM decorator forcing a single tool call
//!   whose schema-validated arguments become the result
//! - **Retry/correction**: a generic exponential-backoff retrier whose
//!   failure hook round-trips through the LLM for corrected parameters
//! - **Workflow composition**: composable tasks (text, structured, agent,
//!   tool, lazy, chain) with context-scoped persistence for resume
//!
//! Provider adapters live outside this crate; everything here consumes the
//! single-method [`LLM`] capability.

pub mod agent;
pub mod context;
pub mod errors;
pub mod events;
pub mod llm;
pub mod messages;
pub mod prompts;
pub mod request;
pub mod response;
pub mod structured;
pub mod tools;
pub mod usage;
pub mod workflows;

pub use agent::Agent;
pub use context::Context;
pub use errors::Error;
pub use events::{AgentEvents, LLMEvents, LogAgentEvents, MultiplexEvents, NoopAgentEvents};
pub use llm::LLM;
pub use messages::{History, Message, MessageKind, Role, ToolCall};
pub use prompts::PromptBuilder;
pub use request::{models, LLMRequest, ModelId, ToolUsage};
pub use response::LLMResponse;
pub use structured::{Corrector, Retrier, RetryConfig, Retryable, StructuredLLM};
pub use tools::{SimpleTool, Tool, Toolbox};
pub use usage::{Usage, UsageToolCall};
pub use workflows::{Task, TaskExt};

#[cfg(test)]
pub mod test_utils;
