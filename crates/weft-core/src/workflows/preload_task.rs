//! Preloading task: a lazy task whose callback produces an opening history,
//! typically retrieved context.

use std::future::Future;

use crate::context::Context;
use crate::errors::Error;
use crate::messages::History;
use crate::response::LLMResponse;
use crate::usage::Usage;
use crate::workflows::LazyTask;

pub fn preload<F, Fut>(name: impl Into<String>, callback: F) -> LazyTask
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<History, Error>> + Send + 'static,
{
    LazyTask::new(name, move |ctx, _llm, _history| {
        let loaded = callback(ctx);
        async move {
            let history = loaded.await?;
            Ok(LLMResponse::new(history).with_usage(Usage::zero()))
        }
    })
}
