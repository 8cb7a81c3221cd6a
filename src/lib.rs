//! Web Fetch MCP Server
//!
//! Model Context Protocol server exposing web-content fetching tools for
//! LLM agents.
//!
//! # Tools
//!
//! - **fetch_page**: rendered HTML via headless Chrome, optional Cloudflare bypass
//! - **fetch_page_fast**: single humanized HTTP GET
//! - **google_fetch**: rendered HTML arriving with a Google referrer
//! - **extract_text**: text of the element matching a CSS selector
//! - **fetch_multiple_pages**: parallel rendered fetch, at most 5 sessions
//!
//! # Architecture
//!
//! ```text
//! Agent ──► MCP Protocol ──► ToolRegistry ──► handler ──► BrowserPool ──► Chrome (CDP)
//!             (stdio)                            │
//!                                                └──────► HumanizedClient (reqwest)
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod mcp;
pub mod tools;

pub use browser::{BrowserEngine, BrowserSession, ChromeEngine, HttpFetcher, HumanizedClient, Navigation, SessionOptions};
pub use config::Config;
pub use error::{EngineError, ToolError};
pub use mcp::{McpRequest, McpResponse, McpServer};
pub use tools::{default_registry, ToolRegistry, ToolResult};
