//! Adapter for arbitrary typed tool objects.
//!
//! `TypedTool` is the trait tool authors implement against their own
//! request/response types; `Adapter` marshals JSON in and out and derives
//! schemas through the generator supplied at construction.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::context::Context;
use crate::errors::Error;
use crate::tools::schema::SchemaGenerator;
use crate::tools::Tool;

#[async_trait]
pub trait TypedTool: Send + Sync {
    type Input: DeserializeOwned + JsonSchema + Send;
    type Output: Serialize + JsonSchema + Send;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn run(&self, ctx: &Context, input: Self::Input) -> Result<Self::Output, Error>;
}

pub struct Adapter<T: TypedTool> {
    tool: T,
    generator: SchemaGenerator,
}

impl<T: TypedTool> Adapter<T> {
    pub fn new(tool: T) -> Self {
        Self {
            tool,
            generator: SchemaGenerator::new(),
        }
    }

    pub fn with_generator(mut self, generator: SchemaGenerator) -> Self {
        self.generator = generator;
        self
    }
}

#[async_trait]
impl<T: TypedTool> Tool for Adapter<T> {
    fn name(&self) -> &str {
        self.tool.name()
    }

    fn description(&self) -> &str {
        self.tool.description()
    }

    fn input_schema(&self) -> Value {
        self.generator
            .generate::<T::Input>()
            .unwrap_or_else(|_| json!({"type": "object"}))
    }

    fn output_schema(&self) -> Option<Value> {
        self.generator.generate::<T::Output>().ok()
    }

    async fn execute(&self, ctx: &Context, args: Value) -> Result<Value, Error> {
        let input: T::Input = serde_json::from_value(args)
            .map_err(|err| Error::Shape(format!("failed to unmarshal input: {}", err)))?;

        let output = self
            .tool
            .run(ctx, input)
            .await
            .map_err(|err| Error::ToolExecution {
                tool_name: self.tool.name().to_string(),
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

    #[derive(Deserialize, JsonSchema)]
    struct BookRequest {
        flight_number: String,
    }

    #[derive(Serialize, JsonSchema)]
    struct Booking {
        confirmation_number: String,
    }

    struct BookFlightTool;

    #[async_trait]
    impl TypedTool for BookFlightTool {
        type Input = BookRequest;
        type Output = Booking;

        fn name(&self) -> &str {
            "book_flight"
        }

        fn description(&self) -> &str {
            "Books a flight for the user"
        }

        async fn run(&self, _ctx: &Context, input: BookRequest) -> Result<Booking, Error> {
            assert_eq!(input.flight_number, "US23456");
            Ok(Booking {
                confirmation_number: "#ARK495".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_adapter_marshals_both_ways() {
        let tool = Adapter::new(BookFlightTool);
        let ctx = Context::new();

        assert_eq!(tool.name(), "book_flight");
        assert_eq!(
            tool.input_schema()["properties"]["flight_number"]["type"],
            "string"
        );

        let result = tool
            .execute(&ctx, json!({"flight_number": "US23456"}))
            .await
            .unwrap();
        assert_eq!(result["confirmation_number"], "#ARK495");
    }
}
