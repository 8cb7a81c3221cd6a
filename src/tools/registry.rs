//! Tool Registry
//!
//! Ordered list of tools handed to the MCP host at startup. Arguments are
//! validated against the tool's schema before its handler runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use super::schema::{ToolDefinition, ToolSchema};
use crate::error::ToolError;

const SLOW_CALL: Duration = Duration::from_millis(100);

/// Result from tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool name that was called
    pub tool_name: String,
    /// Text returned to the caller
    pub content: String,
    /// Structured result data
    pub data: Option<Value>,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl ToolResult {
    /// Create a plain text result
    pub fn text(tool_name: &str, content: String) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            content,
            data: None,
            duration_ms: 0,
        }
    }

    /// Create a result whose text is the JSON rendering of `data`
    pub fn structured(tool_name: &str, data: Value) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            content: data.to_string(),
            data: Some(data),
            duration_ms: 0,
        }
    }
}

/// Type alias for tool handler function
pub type ToolHandler = Arc<
    dyn Fn(Value) -> Pin<Box<dyn Future<Output = Result<ToolResult, ToolError>> + Send>>
        + Send
        + Sync,
>;

/// A registered tool with schema and handler
pub struct Tool {
    pub schema: ToolSchema,
    handler: ToolHandler,
}

impl Tool {
    /// Create a new tool
    pub fn new<F, Fut>(schema: ToolSchema, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolResult, ToolError>> + Send + 'static,
    {
        Self {
            schema,
            handler: Arc::new(move |params| Box::pin(handler(params))),
        }
    }

    /// Execute the tool
    pub async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let start = Instant::now();
        let params = strip_nulls(params);

        self.schema.validate(&params)?;

        let mut result = (self.handler)(params).await?;
        result.duration_ms = start.elapsed().as_millis() as u64;

        Ok(result)
    }
}

/// `null` means "not supplied" for optional parameters
fn strip_nulls(params: Value) -> Value {
    match params {
        Value::Object(map) => Value::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        other => other,
    }
}

/// Tool registry in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an explicit tool list
    pub fn with_tools(tools: impl IntoIterator<Item = Tool>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Register a tool, replacing any existing tool with the same name
    pub fn register(&mut self, tool: Tool) {
        info!("Registered tool: {}", tool.schema.name);
        self.tools.retain(|t| t.schema.name != tool.schema.name);
        self.tools.push(tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.schema.name == name)
    }

    /// List all tool names
    pub fn list(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.schema.name.as_str()).collect()
    }

    /// List all tool definitions
    pub fn list_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.schema.to_definition()).collect()
    }

    /// Call a tool by name
    pub async fn call(&self, name: &str, args: Value) -> Result<ToolResult, ToolError> {
        info!("Tool call: {} with args: {}", name, args);

        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let result = tool.execute(args).await?;

        if Duration::from_millis(result.duration_ms) > SLOW_CALL {
            info!("Tool {} completed in {}ms", name, result.duration_ms);
        }

        Ok(result)
    }
}
