//! Tool Registry
//!
//! Built once at startup from independently defined tool groups and never
//! mutated afterwards, so dispatch needs no locking. `dispatch` is the only
//! entry point the transport uses for calls; it always returns a
//! `ToolResponse`, whatever happens inside the handler.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{error, info};

use crate::error::{HandlerError, RegistryError, ToolError};
use crate::response::ToolResponse;
use crate::schema::{InputSchema, ValidatedArgs};
use crate::util::redact_arguments;

/// Type alias for tool handler function
pub type ToolHandler = Arc<
    dyn Fn(ValidatedArgs) -> BoxFuture<'static, Result<String, HandlerError>> + Send + Sync,
>;

/// A named tool: description, input schema and handler
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub schema: InputSchema,
    handler: ToolHandler,
}

impl ToolDefinition {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: impl Into<InputSchema>,
        handler: F,
    ) -> Self
    where
        F: Fn(ValidatedArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, HandlerError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema: schema.into(),
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Catalog projection of one tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    pub parameters: Map<String, Value>,
    pub required: Vec<String>,
}

impl CatalogEntry {
    /// MCP `inputSchema` object
    pub fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": self.parameters,
            "required": self.required,
        })
    }
}

/// Immutable name -> tool mapping, in registration order
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Merge tool groups. Duplicate names or malformed schemas are startup errors.
    pub fn from_groups<I>(groups: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Vec<ToolDefinition>>,
    {
        let mut tools = Vec::new();
        let mut index = HashMap::new();

        for tool in groups.into_iter().flatten() {
            if tool.name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if index.contains_key(&tool.name) {
                return Err(RegistryError::DuplicateTool(tool.name));
            }
            tool.schema.check(&tool.name)?;
            index.insert(tool.name.clone(), tools.len());
            tools.push(tool);
        }

        info!(tool_count = tools.len(), "Tools registered");
        Ok(Self { tools, index })
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    /// Catalog listing, in registration order
    pub fn list(&self) -> Vec<CatalogEntry> {
        self.tools
            .iter()
            .map(|t| CatalogEntry {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.schema.properties(),
                required: t.schema.required(),
            })
            .collect()
    }

    /// Look up, validate and run a tool
    pub async fn call(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let validated = tool
            .schema
            .validate(&args)
            .map_err(ToolError::InvalidArguments)?;

        let handler = Arc::clone(&tool.handler);
        let run = async move { handler(validated).await };

        match AssertUnwindSafe(run).catch_unwind().await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(source)) => Err(ToolError::Handler {
                tool: name.to_string(),
                source,
            }),
            Err(panic) => Err(ToolError::Handler {
                tool: name.to_string(),
                source: HandlerError::Panicked(panic_message(panic.as_ref())),
            }),
        }
    }

    /// Run a tool and wrap the outcome in the uniform envelope
    pub async fn dispatch(&self, name: &str, args: Value) -> ToolResponse {
        let start = Instant::now();
        info!(tool = %name, args = %redact_arguments(&args), "Tool called");

        let response = match self.call(name, args).await {
            Ok(text) => ToolResponse::success(text),
            Err(e) => {
                error!(tool = %name, kind = e.kind(), error = %e, "Tool execution failed");
                ToolResponse::failure(name, &e)
            }
        };

        let elapsed = start.elapsed();
        if elapsed > Duration::from_millis(100) {
            info!("Tool {} completed in {}ms", name, elapsed.as_millis());
        }

        response
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
