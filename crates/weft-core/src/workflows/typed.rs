//! Typed sidecar over a structured task.
//!
//! `Typed<T>` deserializes a task's final text into `T`. Its typed entry
//! point breaks the `Task` return shape, so it is a wrapper rather than a
//! replacement; the wrapper itself still delegates `Task` so it can sit in
//! wider workflows.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::errors::Error;
use crate::llm::LLM;
use crate::messages::History;
use crate::request::LLMRequest;
use crate::response::LLMResponse;
use crate::workflows::{StructuredTask, Task};

pub struct Typed<T> {
    inner: Box<dyn Task>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Typed<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Wraps an existing task, typically a structured task producing `T`.
    pub fn new(task: impl Task + 'static) -> Self {
        Self {
            inner: Box::new(task),
            _marker: PhantomData,
        }
    }

    pub fn inner(&self) -> &dyn Task {
        self.inner.as_ref()
    }

    pub async fn invoke_typed(
        &self,
        ctx: &Context,
        llm: &Arc<dyn LLM>,
        history: History,
    ) -> Result<T, Error> {
        let response = self.inner.invoke(ctx, llm, history).await?;

        let text = response
            .last_text()
            .ok_or_else(|| Error::Shape("last message is not a text message".to_string()))?;

        serde_json::from_str(text)
            .map_err(|err| Error::Shape(format!("failed to parse structured response: {}", err)))
    }
}

impl<T> Typed<T>
where
    T: DeserializeOwned + JsonSchema + Send + Sync + 'static,
{
    /// Builds a structured task for `T` and wraps it.
    pub fn structured(name: impl Into<String>, request: LLMRequest) -> Result<Self, Error> {
        Ok(Self::new(StructuredTask::for_type::<T>(name, request)?))
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Task for Typed<T> {
    fn name(&self) -> String {
        self.inner.name()
    }

    async fn invoke(
        &self,
        ctx: &Context,
        llm: &Arc<dyn LLM>,
        history: History,
    ) -> Result<LLMResponse, Error> {
        self.inner.invoke(ctx, llm, history).await
    }

    fn clone_task(&self) -> Box<dyn Task> {
        self.inner.clone_task()
    }

    fn with_name(&self, name: &str) -> Box<dyn Task> {
        self.inner.with_name(name)
    }

    fn with_request(&self, overrides: &dyn Fn(&mut LLMRequest)) -> Box<dyn Task> {
        self.inner.with_request(overrides)
    }
}
