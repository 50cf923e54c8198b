//! Error types for failure handling across the orchestration core
//!
//! A single unified error hierarchy captures all failure modes in agent
//! execution. Errors are categorized by their source (provider, tools,
//! schema validation, retry machinery) so callers can route retryable
//! failures into correction loops and let fatal ones short-circuit.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM provider error: {0}")]
    Provider(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool execution failed for '{tool_name}': {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("validation errors: {0}")]
    SchemaValidation(String),

    #[error("no tool call found in response - LLM did not follow forced tool usage")]
    NoToolCall,

    #[error("expected a single tool call in response, got {0}")]
    TooManyToolCalls(usize),

    #[error("{0}")]
    Correction(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation failed after {retries} retries: {source}")]
    RetriesExhausted { retries: u32, source: Box<Error> },

    #[error("{0}")]
    Shape(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl Error {
    /// Unwraps retry exhaustion down to the underlying failure.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::RetriesExhausted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
