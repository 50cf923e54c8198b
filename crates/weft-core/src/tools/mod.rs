//! Tool system: named, JSON-schema-typed callables the model can invoke.
//!
//! A tool exposes its name, description, and input schema to the model and
//! executes against opaque JSON arguments. The `Toolbox` is an ordered
//! collection with first-wins lookup and predicate-based filtering;
//! insertion order is preserved so providers see a stable tool list.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use crate::context::Context;
use crate::errors::Error;

pub mod adapter;
pub mod mock;
pub mod schema;
pub mod simple;

pub use adapter::{Adapter, TypedTool};
pub use mock::{MockTool, ToolCallRecord};
pub use schema::{schema_for, SchemaGenerator};
pub use simple::SimpleTool;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the tool's input. Unknown keywords are forwarded
    /// verbatim to the provider.
    fn input_schema(&self) -> Value;

    /// Advisory output schema; exposed by adapters that support it.
    fn output_schema(&self) -> Option<Value> {
        None
    }

    async fn execute(&self, ctx: &Context, args: Value) -> Result<Value, Error>;
}

/// Ordered collection of tools. Duplicate names are undefined behavior;
/// lookup returns the first match.
#[derive(Clone, Default)]
pub struct Toolbox {
    tools: Vec<Arc<dyn Tool>>,
}

impl Toolbox {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    pub fn find(&self, name: &str) -> Result<Arc<dyn Tool>, Error> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .cloned()
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))
    }

    pub fn add_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Replaces the first tool with a matching name, keeping its position.
    pub fn replace_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        if let Some(existing) = self
            .tools
            .iter_mut()
            .find(|existing| existing.name() == tool.name())
        {
            *existing = tool;
        }
        self
    }

    /// Keeps only tools matching the predicate.
    pub fn keep(&self, predicate: impl Fn(&dyn Tool) -> bool) -> Toolbox {
        Toolbox {
            tools: self
                .tools
                .iter()
                .filter(|tool| predicate(tool.as_ref()))
                .cloned()
                .collect(),
        }
    }

    /// Removes tools matching the predicate.
    pub fn remove(&self, predicate: impl Fn(&dyn Tool) -> bool) -> Toolbox {
        self.keep(|tool| !predicate(tool))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.name().to_string()).collect()
    }
}

impl fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Toolbox").field(&self.names()).finish()
    }
}

impl From<Vec<Arc<dyn Tool>>> for Toolbox {
    fn from(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }
}

impl FromIterator<Arc<dyn Tool>> for Toolbox {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Tool>>>(iter: I) -> Self {
        Self {
            tools: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Toolbox {
    type Item = &'a Arc<dyn Tool>;
    type IntoIter = std::slice::Iter<'a, Arc<dyn Tool>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.iter()
    }
}

pub type ToolPredicate = Box<dyn Fn(&dyn Tool) -> bool + Send + Sync>;

/// Matches tools whose name starts with the prefix.
pub fn by_prefix(prefix: impl Into<String>) -> ToolPredicate {
    let prefix = prefix.into();
    Box::new(move |tool| tool.name().starts_with(&prefix))
}

/// Matches tools whose name matches the regex.
pub fn by_regex(regex: Regex) -> ToolPredicate {
    Box::new(move |tool| regex.is_match(tool.name()))
}

/// Matches tools whose name contains the fragment.
pub fn contains(fragment: impl Into<String>) -> ToolPredicate {
    let fragment = fragment.into();
    Box::new(move |tool| tool.name().contains(&fragment))
}

/// Matches tools whose name appears in the list.
pub fn by_list<I, S>(names: I) -> ToolPredicate
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    Box::new(move |tool| names.iter().any(|name| name == tool.name()))
}

pub fn any_of(predicates: Vec<ToolPredicate>) -> ToolPredicate {
    Box::new(move |tool| predicates.iter().any(|predicate| predicate(tool)))
}

pub fn all_of(predicates: Vec<ToolPredicate>) -> ToolPredicate {
    Box::new(move |tool| predicates.iter().all(|predicate| predicate(tool)))
}
