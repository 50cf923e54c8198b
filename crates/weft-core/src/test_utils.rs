//! Shared test doubles.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::context::Context;
use crate::errors::Error;
use crate::llm::LLM;
use crate::request::LLMRequest;
use crate::response::LLMResponse;

/// LLM double that replays a scripted sequence of responses and records
/// every request it sees.
#[derive(Default)]
pub struct ScriptedLLM {
    responses: Mutex<VecDeque<Result<LLMResponse, Error>>>,
    requests: Mutex<Vec<LLMRequest>>,
}

impl ScriptedLLM {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(self, response: LLMResponse) -> Self {
        self.responses().push_back(Ok(response));
        self
    }

    pub fn push_error(self, error: Error) -> Self {
        self.responses().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<LLMResponse, Error>>> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LLM for ScriptedLLM {
    async fn invoke(&self, _ctx: &Context, request: &LLMRequest) -> Result<LLMResponse, Error> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        match self.responses().pop_front() {
            Some(result) => result,
            None => Err(Error::Provider(
                "scripted llm ran out of responses".to_string(),
            )),
        }
    }
}
