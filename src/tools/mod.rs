//! MCP Tools
//!
//! Schema builder, registry and the web fetch tool handlers.

pub mod fetch;
pub mod registry;
pub mod schema;

use anyhow::Result;
use std::sync::Arc;

use crate::browser::{ChromeEngine, HumanizedClient};
use crate::config::Config;

pub use fetch::fetch_tools;
pub use registry::{Tool, ToolRegistry, ToolResult};
pub use schema::{ToolDefinition, ToolSchema};

/// Registry wired to headless Chrome and the humanized HTTP client
pub fn default_registry(config: &Config) -> Result<ToolRegistry> {
    let browser = Arc::new(ChromeEngine::new(config));
    let http = Arc::new(HumanizedClient::new()?);

    Ok(ToolRegistry::with_tools(fetch_tools(browser, http)))
}
