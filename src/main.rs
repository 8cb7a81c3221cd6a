//! Web Fetch MCP Server - Entry Point
//!
//! Serves MCP over stdio. Takes no arguments.

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use webfetch_mcp::{default_registry, Config, McpServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    // stdout carries the protocol, so logs go to stderr as JSON
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Web Fetch MCP Server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let registry = default_registry(&config)?;
    let server = McpServer::new(registry);
    server.run().await?;

    Ok(())
}
