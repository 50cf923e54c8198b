//! Persistable non-LLM-facing functions.
//!
//! `FunctionWork` carries the same resume semantics as a task: re-entry
//! with a stored name returns the stored output without running the
//! function.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::Context;
use crate::errors::Error;
use crate::llm::LLM;
use crate::workflows::persistence::{load_work, save_work};

type WorkFunc<I, O> =
    Arc<dyn Fn(Context, Arc<dyn LLM>, I) -> BoxFuture<'static, Result<O, Error>> + Send + Sync>;

pub struct FunctionWork<I, O> {
    name: String,
    func: WorkFunc<I, O>,
}

impl<I, O> FunctionWork<I, O>
where
    I: Send + 'static,
    O: Serialize + DeserializeOwned + Send + 'static,
{
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Context, Arc<dyn LLM>, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, Error>> + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(move |ctx, llm, input| Box::pin(func(ctx, llm, input))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn invoke(
        &self,
        ctx: &Context,
        llm: &Arc<dyn LLM>,
        input: I,
    ) -> Result<O, Error> {
        if let Some(stored) = load_work::<O>(ctx, &self.name).await {
            return Ok(stored);
        }

        let output = (self.func)(ctx.clone(), llm.clone(), input).await?;

        save_work(ctx, &self.name, output).await
    }
}
