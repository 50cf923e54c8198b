//! Closure-backed typed tool.
//!
//! Binds a strongly-typed async function as a tool: arguments are
//! deserialized into the input type, the function runs, and the output is
//! serialized back to JSON. Schemas are derived from the input and output
//! types.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::context::Context;
use crate::errors::Error;
use crate::tools::schema::SchemaGenerator;
use crate::tools::Tool;

type SimpleRunner<I, O> =
    Arc<dyn Fn(Context, I) -> BoxFuture<'static, Result<O, Error>> + Send + Sync>;

pub struct SimpleTool<I, O> {
    name: String,
    description: String,
    runner: SimpleRunner<I, O>,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O> SimpleTool<I, O>
where
    I: DeserializeOwned + JsonSchema + Send + Sync + 'static,
    O: Serialize + JsonSchema + Send + Sync + 'static,
{
    pub fn new<H, Fut>(name: impl Into<String>, description: impl Into<String>, handler: H) -> Self
    where
        H: Fn(Context, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, Error>> + Send + 'static,
    {
        let runner: SimpleRunner<I, O> =
            Arc::new(move |ctx, input| Box::pin(handler(ctx, input)));

        Self {
            name: name.into(),
            description: description.into(),
            runner,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<I, O> Tool for SimpleTool<I, O>
where
    I: DeserializeOwned + JsonSchema + Send + Sync + 'static,
    O: Serialize + JsonSchema + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        SchemaGenerator::new()
            .generate::<I>()
            .unwrap_or_else(|_| json!({"type": "object"}))
    }

    fn output_schema(&self) -> Option<Value> {
        SchemaGenerator::new().generate::<O>().ok()
    }

    async fn execute(&self, ctx: &Context, args: Value) -> Result<Value, Error> {
        let input: I = serde_json::from_value(args)
            .map_err(|err| Error::Shape(format!("failed to unmarshal input: {}", err)))?;

        let output = (self.runner)(ctx.clone(), input)
            .await
            .map_err(|err| Error::ToolExecution {
                tool_name: self.name.clone(),
                message: err.to_string(),
            })?;

        serde_json::to_value(output)
            .map_err(|err| Error::Shape(format!("failed to marshal output: {}", err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    struct GreetRequest {
        name: String,
    }

    #[derive(Serialize, JsonSchema)]
    struct GreetResponse {
        response: String,
    }

    fn greet_tool() -> SimpleTool<GreetRequest, GreetResponse> {
        SimpleTool::new("greet", "Greet someone", |_ctx, input: GreetRequest| async move {
            Ok(GreetResponse {
                response: format!("Hello, {}!", input.name),
            })
        })
    }

    #[tokio::test]
    async fn test_execute_round_trips_types() {
        let tool = greet_tool();
        let ctx = Context::new();

        let result = tool.execute(&ctx, json!({"name": "John"})).await.unwrap();
        assert_eq!(result, json!({"response": "Hello, John!"}));
    }

    #[tokio::test]
    async fn test_execute_rejects_malformed_args() {
        let tool = greet_tool();
        let ctx = Context::new();

        let err = tool.execute(&ctx, json!({"name": 42})).await.unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn test_schemas_come_from_types() {
        let tool = greet_tool();
        let schema = tool.input_schema();
        assert_eq!(schema["properties"]["name"]["type"], "string");
        assert!(tool.output_schema().is_some());
    }
}
