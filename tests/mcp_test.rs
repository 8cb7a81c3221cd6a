//! MCP Server Integration Tests
//!
//! Feeds newline-delimited JSON-RPC into the server and inspects what it
//! writes back.

mod common;

use common::{FakeEngine, FakeHttp, ARTICLE_HTML};
use serde_json::{json, Value};
use std::sync::Arc;
use webfetch_mcp::mcp::error_codes;
use webfetch_mcp::tools::fetch_tools;
use webfetch_mcp::{McpServer, ToolRegistry};

fn server(engine: &FakeEngine) -> McpServer {
    let tools = fetch_tools(Arc::new(engine.clone()), Arc::new(FakeHttp::default()));
    McpServer::new(ToolRegistry::with_tools(tools))
}

async fn exchange(server: &McpServer, requests: &[Value]) -> Vec<Value> {
    let input: String = requests
        .iter()
        .map(|r| format!("{}\n", r))
        .collect();
    let mut output = Vec::new();

    server.serve(input.as_bytes(), &mut output).await.unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_initialize_and_list() {
    let server = server(&FakeEngine::new());
    let responses = exchange(
        &server,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        ],
    )
    .await;

    assert_eq!(responses.len(), 2, "notifications get no response");

    let init = &responses[0];
    assert_eq!(init["id"], 1);
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(init["result"]["capabilities"]["tools"]["listChanged"], false);
    assert_eq!(init["result"]["serverInfo"]["name"], "webfetch-mcp");

    let tools = responses[1]["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 5);
    assert_eq!(tools[0]["name"], "fetch_page");
    assert_eq!(tools[0]["inputSchema"]["required"], json!(["url"]));
    assert!(tools[3]["description"].as_str().unwrap().contains("CSS selector"));
}

#[tokio::test]
async fn test_tools_call_text_result() {
    let engine = FakeEngine::new().with_page("https://a.test", ARTICLE_HTML);
    let server = server(&engine);

    let responses = exchange(
        &server,
        &[json!({
            "jsonrpc": "2.0",
            "id": "call-1",
            "method": "tools/call",
            "params": {
                "name": "extract_text",
                "arguments": {"url": "https://a.test", "selector": ".headline"}
            }
        })],
    )
    .await;

    let result = &responses[0]["result"];
    assert_eq!(responses[0]["id"], "call-1");
    assert_eq!(result["content"][0]["type"], "text");
    assert_eq!(result["content"][0]["text"], "Hello fixture");
    assert!(result.get("structuredContent").is_none());
}

#[tokio::test]
async fn test_tools_call_batch_has_structured_content() {
    let engine = FakeEngine::new()
        .with_page("https://a.test", "<html>a</html>")
        .with_page("https://b.test", "<html>b</html>");
    let server = server(&engine);

    let responses = exchange(
        &server,
        &[json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {
                "name": "fetch_multiple_pages",
                "arguments": {"urls": ["https://a.test", "https://b.test"]}
            }
        })],
    )
    .await;

    let result = &responses[0]["result"];
    assert_eq!(
        result["structuredContent"],
        json!({"https://a.test": "<html>a</html>", "https://b.test": "<html>b</html>"})
    );
    let text: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(text, result["structuredContent"]);
}

#[tokio::test]
async fn test_tools_call_error_codes() {
    let engine = FakeEngine::new();
    let server = server(&engine);

    let responses = exchange(
        &server,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {"arguments": {}}}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "nope"}}),
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {"name": "fetch_page", "arguments": {}}}),
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {"name": "fetch_page", "arguments": {"url": "https://down.test"}}}),
            json!({"jsonrpc": "2.0", "id": 5, "method": "resources/list"}),
        ],
    )
    .await;

    let codes: Vec<i64> = responses
        .iter()
        .map(|r| r["error"]["code"].as_i64().unwrap())
        .collect();
    assert_eq!(
        codes,
        vec![
            error_codes::INVALID_PARAMS as i64,
            error_codes::TOOL_NOT_FOUND as i64,
            error_codes::INVALID_PARAMS as i64,
            error_codes::TOOL_EXECUTION_ERROR as i64,
            error_codes::METHOD_NOT_FOUND as i64,
        ]
    );
    assert!(responses[3]["error"]["message"]
        .as_str()
        .unwrap()
        .contains("https://down.test"));

    // Only the call with valid arguments reached the engine
    assert_eq!(engine.sessions_opened(), 1);
}

#[tokio::test]
async fn test_parse_error_and_blank_lines() {
    let server = server(&FakeEngine::new());
    let mut output = Vec::new();
    let input = "\n{not json}\n\n{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"ping\"}\n";

    server.serve(input.as_bytes(), &mut output).await.unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], error_codes::PARSE_ERROR);
    assert!(responses[0]["id"].is_null());
    assert_eq!(responses[1]["id"], 9);
    assert_eq!(responses[1]["result"], json!({}));
}

#[tokio::test]
async fn test_invalid_utf8_line_keeps_serving() {
    let server = server(&FakeEngine::new());
    let mut output = Vec::new();
    let mut input = vec![0xff, 0xfe, b'{', b'\n'];
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n");

    server.serve(input.as_slice(), &mut output).await.unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], error_codes::PARSE_ERROR);
    assert_eq!(responses[1]["id"], 7);
}
