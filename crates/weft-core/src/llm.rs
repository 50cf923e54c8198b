//! The language model capability.
//!
//! One operation: `invoke(ctx, request) -> response`. Every higher layer
//! (agent, structured output, tasks) is itself an `LLM` or consumes one,
//! which is what makes the layers stackable.

use async_trait::async_trait;

use crate::context::Context;
use crate::errors::Error;
use crate::request::LLMRequest;
use crate::response::LLMResponse;

#[async_trait]
pub trait LLM: Send + Sync {
    async fn invoke(&self, ctx: &Context, request: &LLMRequest) -> Result<LLMResponse, Error>;
}
