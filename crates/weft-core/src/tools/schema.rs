//! JSON Schema generation for typed tool inputs and outputs.
//!
//! Schemas are derived statically with `schemars`, draft-07 with all
//! subschemas inlined so providers receive a self-contained document.

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde_json::Value;

use crate::errors::Error;

#[derive(Clone, Debug, Default)]
pub struct SchemaGenerator;

impl SchemaGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate<T: JsonSchema>(&self) -> Result<Value, Error> {
        let mut settings = SchemaSettings::draft07();
        settings.inline_subschemas = true;
        let schema = settings.into_generator().into_root_schema_for::<T>();

        serde_json::to_value(schema)
            .map_err(|err| Error::InvalidSchema(format!("failed to generate schema: {}", err)))
    }
}

/// Derives the draft-07 schema for `T`.
pub fn schema_for<T: JsonSchema>() -> Result<Value, Error> {
    SchemaGenerator::new().generate::<T>()
}
