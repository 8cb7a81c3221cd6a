//! Web Fetch Tools
//!
//! The five tools exposed over MCP. Each handler parses its typed request,
//! rejects empty required strings, and hands the request to the browser
//! executor or the HTTP fetcher.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::registry::{Tool, ToolResult};
use super::schema::ToolSchema;
use crate::browser::engine::{BrowserEngine, HttpFetcher, SessionOptions};
use crate::browser::pool::{self, BrowserPool, MAX_PARALLEL};
use crate::browser::tasks::{
    ExtractTextRequest, FetchFastRequest, FetchMultipleRequest, FetchPageRequest,
    GoogleFetchRequest,
};
use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::ToolError;

fn parse<T: DeserializeOwned>(params: Value) -> Result<T, ToolError> {
    serde_json::from_value(params).map_err(|e| ToolError::invalid(e.to_string()))
}

fn require_non_empty(name: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::invalid(format!("Parameter '{}' must not be empty", name)));
    }
    Ok(())
}

/// Fetch a page with full browser rendering
pub fn fetch_page_tool(browser: Arc<dyn BrowserEngine>) -> Tool {
    let schema = ToolSchema::new(
        "fetch_page",
        "Fetch a web page with a real headless browser and return the rendered HTML. \
         Handles JavaScript-heavy and bot-protected pages (Cloudflare, DataDome). Best for \
         protected pages but slower than fetch_page_fast. Set bypass_cloudflare for sites \
         behind an anti-bot challenge; set wait_for_selector when content loads late. \
         Examples: {\"url\": \"https://example.com\"}, \
         {\"url\": \"https://protected-site.com\", \"bypass_cloudflare\": true}, \
         {\"url\": \"https://example.com\", \"wait_for_selector\": \".content\"}",
    )
    .with_string_param("url", "The URL to fetch", true)
    .with_bool_param("bypass_cloudflare", "Enable Cloudflare bypass mode", false)
    .with_default("bypass_cloudflare", json!(false))
    .with_string_param(
        "wait_for_selector",
        "Optional CSS selector to wait for before capturing the page",
        false,
    )
    .with_int_param("timeout", "Maximum time to wait in seconds", false)
    .with_default("timeout", json!(DEFAULT_TIMEOUT_SECS));

    Tool::new(schema, move |params| {
        let browser = browser.clone();
        async move {
            let request: FetchPageRequest = parse(params)?;
            require_non_empty("url", &request.url)?;

            let html = pool::execute(browser.as_ref(), &SessionOptions::default(), &request).await?;
            Ok(ToolResult::text("fetch_page", html))
        }
    })
}

/// Fetch a page with a single humanized HTTP request
pub fn fetch_page_fast_tool(http: Arc<dyn HttpFetcher>) -> Tool {
    let schema = ToolSchema::new(
        "fetch_page_fast",
        "Fetch a web page with one humanized HTTP request, without a browser. Much faster \
         and lighter, but does not run JavaScript and fails on heavily protected sites. \
         Best for simple pages and APIs without anti-bot protection. \
         Examples: {\"url\": \"https://example.com\"}, \
         {\"url\": \"https://api.example.com/data\"}",
    )
    .with_string_param("url", "The URL to fetch", true)
    .with_string_param("user_agent", "Custom User-Agent header", false);

    Tool::new(schema, move |params| {
        let http = http.clone();
        async move {
            let request: FetchFastRequest = parse(params)?;
            require_non_empty("url", &request.url)?;

            let body = http.get(&request.url, request.user_agent()).await?;
            Ok(ToolResult::text("fetch_page_fast", body))
        }
    })
}

/// Fetch a page arriving from a Google search referrer
pub fn google_fetch_tool(browser: Arc<dyn BrowserEngine>) -> Tool {
    let schema = ToolSchema::new(
        "google_fetch",
        "Fetch a web page through the browser as if arriving from a Google search. Helps \
         with sites that let search-engine traffic through. Returns the rendered HTML. \
         Examples: {\"url\": \"https://example.com\"}, \
         {\"url\": \"https://news-site.com/article\", \"timeout\": 45}",
    )
    .with_string_param("url", "The URL to fetch", true)
    .with_int_param("timeout", "Maximum time to wait in seconds", false)
    .with_default("timeout", json!(DEFAULT_TIMEOUT_SECS));

    Tool::new(schema, move |params| {
        let browser = browser.clone();
        async move {
            let request: GoogleFetchRequest = parse(params)?;
            require_non_empty("url", &request.url)?;

            let html = pool::execute(browser.as_ref(), &SessionOptions::default(), &request).await?;
            Ok(ToolResult::text("google_fetch", html))
        }
    })
}

/// Extract the text of one element
pub fn extract_text_tool(browser: Arc<dyn BrowserEngine>) -> Tool {
    let schema = ToolSchema::new(
        "extract_text",
        "Open a page in the browser, wait for the element matching a CSS selector, and \
         return that element's text content (first match only, no markup). \
         Examples: {\"url\": \"https://example.com\", \"selector\": \"h1\"}, \
         {\"url\": \"https://example.com\", \"selector\": \".article-content\", \
         \"bypass_cloudflare\": true}",
    )
    .with_string_param("url", "The URL to fetch", true)
    .with_string_param("selector", "CSS selector of the element to read", true)
    .with_bool_param("bypass_cloudflare", "Enable Cloudflare bypass mode", false)
    .with_default("bypass_cloudflare", json!(false))
    .with_int_param("timeout", "Maximum time to wait in seconds", false)
    .with_default("timeout", json!(DEFAULT_TIMEOUT_SECS));

    Tool::new(schema, move |params| {
        let browser = browser.clone();
        async move {
            let request: ExtractTextRequest = parse(params)?;
            require_non_empty("url", &request.url)?;
            require_non_empty("selector", &request.selector)?;

            let text = pool::execute(browser.as_ref(), &SessionOptions::default(), &request).await?;
            Ok(ToolResult::text("extract_text", text))
        }
    })
}

/// Fetch several pages in parallel browser sessions
pub fn fetch_multiple_pages_tool(browser: Arc<dyn BrowserEngine>) -> Tool {
    let schema = ToolSchema::new(
        "fetch_multiple_pages",
        "Fetch several web pages in parallel browser sessions and return a JSON object \
         mapping each URL to its HTML. Duplicate URLs are fetched once. Runs 3 sessions at a \
         time by default and never more than 5. \
         Examples: {\"urls\": [\"https://example.com\", \"https://example.org\"]}, \
         {\"urls\": [\"https://site1.com\", \"https://site2.com\"], \"bypass_cloudflare\": true}",
    )
    .with_string_array_param("urls", "List of URLs to fetch", true)
    .with_bool_param(
        "bypass_cloudflare",
        "Enable Cloudflare bypass mode for every page",
        false,
    )
    .with_default("bypass_cloudflare", json!(false))
    .with_int_param(
        "max_parallel",
        &format!("Maximum parallel browser sessions (capped at {})", MAX_PARALLEL),
        false,
    )
    .with_default("max_parallel", json!(3));

    Tool::new(schema, move |params| {
        let browser = browser.clone();
        async move {
            let request: FetchMultipleRequest = parse(params)?;
            if request.urls.is_empty() {
                return Err(ToolError::invalid("Parameter 'urls' must not be empty"));
            }
            for url in &request.urls {
                require_non_empty("urls", url)?;
            }

            let pool = BrowserPool::new(browser, request.parallelism());
            let pages = pool
                .run_all(&SessionOptions::default(), request.page_tasks())
                .await?;

            let mapping: Map<String, Value> = pages
                .into_iter()
                .map(|(url, html)| (url, Value::String(html)))
                .collect();

            Ok(ToolResult::structured("fetch_multiple_pages", Value::Object(mapping)))
        }
    })
}

/// All five tools, in the order `tools/list` reports them
pub fn fetch_tools(browser: Arc<dyn BrowserEngine>, http: Arc<dyn HttpFetcher>) -> Vec<Tool> {
    vec![
        fetch_page_tool(browser.clone()),
        fetch_page_fast_tool(http),
        google_fetch_tool(browser.clone()),
        extract_text_tool(browser.clone()),
        fetch_multiple_pages_tool(browser),
    ]
}
