use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};
use toolmark_rs::api::router;
use toolmark_rs::config::AppConfig;
use toolmark_rs::state::AppState;

async fn spawn_app(config: AppConfig) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = router(Arc::new(AppState::new(config)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, server)
}

fn call(server: &str, tool: &str, args: &str) -> String {
    format!(
        "<use_mcp_tool><server_name>{server}</server_name>\
         <tool_name>{tool}</tool_name><arguments>{args}</arguments></use_mcp_tool>"
    )
}

#[tokio::test]
async fn test_health_reports_extraction_settings() {
    let (addr, server) = spawn_app(AppConfig::default()).await;

    let response = reqwest::get(format!("http://{addr}/health"))
        .await
        .expect("health request");
    assert_eq!(response.status(), StatusCode::OK);
    let payload: Value = response.json().await.expect("json payload");
    assert_eq!(payload["config"]["extraction"]["block_tag"], "use_mcp_tool");
    assert_eq!(payload["config"]["extraction"]["max_nesting_depth"], 16);

    server.abort();
}

#[tokio::test]
async fn test_extract_returns_requests_and_skipped() {
    let (addr, server) = spawn_app(AppConfig::default()).await;
    let text = format!(
        "Sure.\n{}\n{}\n{}",
        call("github", "list_issues", r#"{"repo": "a/b"}"#),
        call("github", "get_issue", "not json"),
        call("weather", "forecast", "<city>Oslo</city><days>2</days>"),
    );

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/v1/extract"))
        .json(&json!({ "text": text }))
        .send()
        .await
        .expect("extract request");
    assert_eq!(response.status(), StatusCode::OK);

    let payload: Value = response.json().await.expect("json payload");
    let requests = payload["requests"].as_array().expect("requests array");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["tool_name"], "list_issues");
    assert_eq!(requests[0]["arguments"], json!({"repo": "a/b"}));
    assert_eq!(requests[1]["arguments"], json!({"city": "Oslo", "days": 2}));

    let skipped = payload["skipped"].as_array().expect("skipped array");
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].as_str().unwrap_or_default().contains("malformed-json"));

    server.abort();
}

#[tokio::test]
async fn test_extract_honours_configured_block_tag() {
    let mut config = AppConfig::default();
    config.extraction.block_tag = "tool_call".to_string();
    let (addr, server) = spawn_app(config).await;

    let text = "<tool_call><server_name>fs</server_name><tool_name>ls</tool_name>\
                <arguments>{}</arguments></tool_call>";
    let payload: Value = reqwest::Client::new()
        .post(format!("http://{addr}/v1/extract"))
        .json(&json!({ "text": text }))
        .send()
        .await
        .expect("extract request")
        .json()
        .await
        .expect("json payload");
    assert_eq!(payload["requests"][0]["server_name"], "fs");

    server.abort();
}

#[tokio::test]
async fn test_extract_rejects_malformed_body() {
    let (addr, server) = spawn_app(AppConfig::default()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/v1/extract"))
        .body("{\"txt\": 1}")
        .send()
        .await
        .expect("extract request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload: Value = response.json().await.expect("json payload");
    assert_eq!(payload["error"]["code"], "invalid-body");

    server.abort();
}

#[tokio::test]
async fn test_extract_enforces_body_limit() {
    let mut config = AppConfig::default();
    config.server.max_body_bytes = 64;
    let (addr, server) = spawn_app(config).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/v1/extract"))
        .json(&json!({ "text": "x".repeat(1024) }))
        .send()
        .await
        .expect("extract request");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    server.abort();
}

#[tokio::test]
async fn test_validate_accepts_candidate() {
    let (addr, server) = spawn_app(AppConfig::default()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/v1/validate"))
        .json(&json!({
            "server_name": "file-system",
            "tool_name": "read_file",
            "arguments": {"path": "/tmp/a", "lines": 10}
        }))
        .send()
        .await
        .expect("validate request");
    assert_eq!(response.status(), StatusCode::OK);
    let payload: Value = response.json().await.expect("json payload");
    assert_eq!(payload["server_name"], "file-system");
    assert_eq!(payload["arguments"], json!({"path": "/tmp/a", "lines": 10}));

    server.abort();
}

#[tokio::test]
async fn test_validate_reports_first_failure() {
    let (addr, server) = spawn_app(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let cases = [
        (
            json!({"server_name": "srv", "tool_name": "", "arguments": {}}),
            "missing-field",
            "tool_name",
        ),
        (
            json!({"server_name": "srv", "tool_name": "t", "arguments": "nope"}),
            "invalid-structure",
            "arguments",
        ),
        (
            json!({"server_name": "Srv", "tool_name": "Tool", "arguments": {}}),
            "invalid-format",
            "server_name",
        ),
    ];

    for (candidate, code, field) in cases {
        let response = client
            .post(format!("http://{addr}/v1/validate"))
            .json(&candidate)
            .send()
            .await
            .expect("validate request");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{candidate}");
        let payload: Value = response.json().await.expect("json payload");
        assert_eq!(payload["error"]["code"], code, "{candidate}");
        assert_eq!(payload["error"]["field"], field, "{candidate}");
    }

    server.abort();
}
