//! End-to-end tests for the identity MCP server
//!
//! The server is driven in-process through `EmbeddableMcp` over a scripted
//! transport, so these tests need no network and assert exact upstream
//! call counts.
//!
//! ```bash
//! cargo test -p identity-mcp --test pipeline
//! ```

use std::sync::Arc;

use identity_mcp::api::mock::{json_response, with_header, MockTransport};
use identity_mcp::api::CREDITS_HEADER;
use identity_mcp::batch::BatchEvent;
use identity_mcp::config::{Config, Credentials};
use identity_mcp::notify::{HostEvent, Notifier};
use identity_mcp::payment::PAYMENT_HEADER;
use identity_mcp::resources::STATUS_URI;
use identity_mcp::IdentityMcpServer;
use mcp_common::{result_text, CallToolResult, EmbeddableError, EmbeddableMcp};
use rmcp::model::LoggingLevel;
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;

const SIGNING_KEY: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";
const WALLET: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";
const ADDRESS: &str = "0x1111111111111111111111111111111111111111";

fn config(api_key: Option<&str>, private_key: Option<&str>) -> Config {
    Config {
        credentials: Credentials {
            api_key: api_key.map(str::to_string),
            private_key: private_key.map(str::to_string),
        },
        ..Default::default()
    }
}

fn server(config: Config, mock: &Arc<MockTransport>) -> IdentityMcpServer {
    IdentityMcpServer::with_transport(&config, mock.clone()).unwrap()
}

fn is_error(result: &CallToolResult) -> bool {
    result.is_error == Some(true)
}

fn drain(rx: &mut UnboundedReceiver<HostEvent>) -> Vec<HostEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn challenge() -> Value {
    json!({
        "x402Version": 1,
        "error": "payment required",
        "accepts": [{
            "scheme": "exact",
            "network": "base",
            "maxAmountRequired": "10000",
            "payTo": "0x2222222222222222222222222222222222222222",
            "asset": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
            "maxTimeoutSeconds": 120
        }]
    })
}

fn addresses(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("0x{:040x}", i + 1)).collect()
}

// ============================================================================
// Catalog
// ============================================================================

#[test]
fn catalog_depends_on_auth_mode() {
    let mock = Arc::new(MockTransport::new());

    let none = server(config(None, None), &mock).tool_names();
    assert_eq!(none.len(), 8);
    assert!(!none.contains(&"check_credits".to_string()));
    assert!(!none.contains(&"purchase_credits".to_string()));

    let keyed = server(config(Some("k"), None), &mock).tool_names();
    assert_eq!(keyed.len(), 10);
    assert!(keyed.contains(&"check_credits".to_string()));
    assert!(keyed.contains(&"set_credit_alert".to_string()));
    assert!(!keyed.contains(&"purchase_credits".to_string()));

    let paying = server(config(None, Some(SIGNING_KEY)), &mock).tool_names();
    assert_eq!(paying.len(), 9);
    assert!(paying.contains(&"purchase_credits".to_string()));
}

#[test]
fn both_credentials_select_api_key() {
    let mock = Arc::new(MockTransport::new());
    let server = server(config(Some("k"), Some(SIGNING_KEY)), &mock);
    assert_eq!(server.auth_mode().to_string(), "API key");
}

#[tokio::test]
async fn hidden_tools_are_not_callable() {
    let mock = Arc::new(MockTransport::new());
    let server = server(config(Some("k"), None), &mock);

    let err = server
        .call_tool("purchase_credits", json!({ "package": "starter" }))
        .await
        .unwrap_err();
    assert!(matches!(err, EmbeddableError::ToolNotFound(_)));
    assert_eq!(mock.calls(), 0);
}

// ============================================================================
// Configuration errors
// ============================================================================

#[tokio::test]
async fn no_credentials_fails_fast_without_io() {
    let mock = Arc::new(MockTransport::new());
    let server = server(config(None, None), &mock);

    let calls = [
        ("check_address", json!({ "address": ADDRESS })),
        ("check_twitter", json!({ "handle": "@alice" })),
        ("get_address_data", json!({ "address": ADDRESS })),
        ("get_twitter_data", json!({ "handle": "alice" })),
        ("batch_check_addresses", json!({ "addresses": [ADDRESS] })),
        ("batch_check_twitters", json!({ "handles": ["@a"] })),
        ("batch_get_address_data", json!({ "addresses": [ADDRESS] })),
        ("batch_get_twitter_data", json!({ "handles": ["@a"] })),
    ];

    for (name, params) in calls {
        let result = server.call_tool(name, params).await.unwrap();
        assert!(is_error(&result), "{} should fail", name);
        let text = result_text(&result);
        assert!(text.starts_with("Error: no credentials configured"), "{}: {}", name, text);
        assert_eq!(text.lines().count(), 1);
    }
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_io() {
    let mock = Arc::new(MockTransport::new());
    let server = server(config(Some("k"), None), &mock);

    let result = server
        .call_tool("check_address", json!({ "address": "0x123" }))
        .await
        .unwrap();
    assert!(is_error(&result));
    assert!(result_text(&result).starts_with("Error: invalid input:"));

    let result = server
        .call_tool("batch_check_twitters", json!({ "handles": [] }))
        .await
        .unwrap();
    assert!(is_error(&result));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn missing_arguments_are_invalid_params() {
    let mock = Arc::new(MockTransport::new());
    let server = server(config(Some("k"), None), &mock);

    let err = server.call_tool("check_address", json!({})).await.unwrap_err();
    assert!(matches!(err, EmbeddableError::InvalidParams(_)));
}

// ============================================================================
// API key mode
// ============================================================================

#[tokio::test]
async fn api_key_lookup() {
    let mock = Arc::new(MockTransport::new());
    mock.push_json(200, json!({ "exists": true, "types": ["twitter"] }));
    let server = server(config(Some("key-1"), None), &mock);

    let result = server
        .call_tool("check_twitter", json!({ "handle": "alice" }))
        .await
        .unwrap();

    assert!(!is_error(&result));
    assert_eq!(
        result_text(&result),
        "@alice has a known identity (sources: twitter)."
    );
    let requests = mock.requests();
    assert_eq!(requests[0].header("X-API-Key"), Some("key-1"));
    assert_eq!(
        requests[0].request.query,
        vec![("identity".to_string(), "@alice".to_string())]
    );
}

#[tokio::test]
async fn upstream_error_is_a_single_line() {
    let mock = Arc::new(MockTransport::new());
    mock.push_json(429, json!({ "message": "slow down\nretry later" }));
    let server = server(config(Some("k"), None), &mock);

    let result = server
        .call_tool("get_address_data", json!({ "address": ADDRESS }))
        .await
        .unwrap();

    assert!(is_error(&result));
    assert_eq!(result_text(&result), "Error: API error (429): slow down");
}

#[tokio::test]
async fn credit_alerts_fire_once_per_crossing() {
    let mock = Arc::new(MockTransport::new());
    for credits in ["1500", "900", "900", "50"] {
        mock.push(with_header(
            json_response(200, json!({ "exists": false })),
            CREDITS_HEADER,
            credits,
        ));
    }
    let (notifier, mut rx) = Notifier::channel();
    let server = server(config(Some("k"), None), &mock).with_notifier(notifier);

    let mut alerts = Vec::new();
    for _ in 0..4 {
        server
            .call_tool("check_address", json!({ "address": ADDRESS }))
            .await
            .unwrap();
        alerts.extend(drain(&mut rx).into_iter().filter_map(|e| match e {
            HostEvent::CreditAlert(alert) => Some((alert.credits, alert.threshold)),
            _ => None,
        }));
    }

    assert_eq!(alerts, vec![(900, 1000), (50, 100)]);
}

#[tokio::test]
async fn check_credits_and_set_alert() {
    let mock = Arc::new(MockTransport::new());
    mock.push_json(200, json!({ "credits": 1200, "points": 4 }))
        .push_json(200, json!({ "credits": 1100, "points": 4 }));
    let (notifier, mut rx) = Notifier::channel();
    let server = server(config(Some("k"), None), &mock).with_notifier(notifier);

    let result = server.call_tool("check_credits", json!({})).await.unwrap();
    assert!(result_text(&result).starts_with("Credits: 1200"));

    let result = server
        .call_tool("set_credit_alert", json!({ "threshold": 1150 }))
        .await
        .unwrap();
    assert_eq!(
        result_text(&result),
        "Low-credit alert threshold set to 1150 (was 1000). Last known balance: 1200 credits."
    );
    assert_eq!(mock.calls(), 1);

    server.call_tool("check_credits", json!({})).await.unwrap();
    let alerts: Vec<HostEvent> = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, HostEvent::CreditAlert(_)))
        .collect();
    assert_eq!(alerts.len(), 1);
}

// ============================================================================
// Batches
// ============================================================================

#[tokio::test]
async fn batch_of_120_runs_in_three_chunks() {
    let mock = Arc::new(MockTransport::new());
    let items = addresses(120);
    for chunk in items.chunks(50) {
        let mut results = serde_json::Map::new();
        for (i, id) in chunk.iter().enumerate() {
            results.insert(id.clone(), json!({ "exists": i == 0, "twitter": i == 0 }));
        }
        mock.push_json(200, json!({ "results": { "addresses": results } }));
    }
    let (notifier, mut rx) = Notifier::channel();
    let server = server(config(Some("k"), None), &mock).with_notifier(notifier);

    let result = server
        .call_tool("batch_check_addresses", json!({ "addresses": items }))
        .await
        .unwrap();

    assert!(!is_error(&result));
    assert!(result_text(&result).starts_with("Checked 120 addresses: 3 found, 117 not found."));

    let sizes: Vec<usize> = mock
        .requests()
        .iter()
        .map(|r| r.request.body.as_ref().unwrap()["addresses"].as_array().unwrap().len())
        .collect();
    assert_eq!(sizes, vec![50, 50, 20]);

    let events = drain(&mut rx);
    let percentages: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            HostEvent::Batch(BatchEvent::Progress(p)) => Some(p.percentage),
            _ => None,
        })
        .collect();
    assert_eq!(percentages, vec![42, 83, 100]);

    let found = events
        .iter()
        .filter(|e| matches!(e, HostEvent::Batch(BatchEvent::Result(_))))
        .count();
    assert_eq!(found, 3);
}

#[tokio::test]
async fn requested_log_level_silences_progress() {
    let mock = Arc::new(MockTransport::new());
    let items = addresses(3);
    let mut results = serde_json::Map::new();
    for (i, id) in items.iter().enumerate() {
        results.insert(id.clone(), json!({ "exists": i == 0, "twitter": i == 0 }));
    }
    mock.push_json(200, json!({ "results": { "addresses": results } }));
    let (notifier, mut rx) = Notifier::channel();
    let server = server(config(Some("k"), None), &mock).with_notifier(notifier);

    server.set_log_level(LoggingLevel::Warning);
    let result = server
        .call_tool("batch_check_addresses", json!({ "addresses": items }))
        .await
        .unwrap();

    assert!(result_text(&result).starts_with("Checked 3 addresses: 1 found, 2 not found."));
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn batch_failure_discards_everything() {
    let mock = Arc::new(MockTransport::new());
    mock.push_json(200, json!({ "results": { "twitters": {} } }))
        .push_json(500, json!({ "error": "database unavailable" }));
    let server = server(config(Some("k"), None), &mock);

    let handles: Vec<String> = (0..60).map(|i| format!("user{}", i)).collect();
    let result = server
        .call_tool("batch_get_twitter_data", json!({ "handles": handles }))
        .await
        .unwrap();

    assert!(is_error(&result));
    assert_eq!(result_text(&result), "Error: API error (500): database unavailable");
    assert_eq!(mock.calls(), 2);
}

// ============================================================================
// x402 payment mode
// ============================================================================

#[tokio::test]
async fn payment_challenge_is_paid_once() {
    let mock = Arc::new(MockTransport::new());
    mock.push_json(402, challenge())
        .push_json(200, json!({ "found": false, "identities": [], "sources": [] }));
    let server = server(config(None, Some(SIGNING_KEY)), &mock);

    let result = server
        .call_tool("get_address_data", json!({ "address": ADDRESS }))
        .await
        .unwrap();

    assert!(!is_error(&result));
    assert_eq!(mock.calls(), 2);
    let requests = mock.requests();
    assert!(requests[0].header(PAYMENT_HEADER).is_none());
    assert!(requests[1].header(PAYMENT_HEADER).is_some());
}

#[tokio::test]
async fn rejected_payment_is_not_retried_again() {
    let mock = Arc::new(MockTransport::new());
    mock.push_json(402, challenge()).push_json(402, challenge());
    let server = server(config(None, Some(SIGNING_KEY)), &mock);

    let result = server
        .call_tool("check_address", json!({ "address": ADDRESS }))
        .await
        .unwrap();

    assert!(is_error(&result));
    assert_eq!(result_text(&result), "Error: API error (402): payment required");
    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn purchase_credits_pays_from_wallet() {
    let mock = Arc::new(MockTransport::new());
    mock.push_json(402, challenge()).push_json(
        200,
        json!({ "creditsAdded": 10000, "newCredits": 10000, "transactionHash": "0xfeed" }),
    );
    let (notifier, mut rx) = Notifier::channel();
    let server = server(config(None, Some(SIGNING_KEY)), &mock).with_notifier(notifier);

    let result = server
        .call_tool("purchase_credits", json!({ "package": "starter" }))
        .await
        .unwrap();

    assert!(!is_error(&result));
    assert!(result_text(&result).contains("10000 credits added"));

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].request.body, Some(json!({ "address": WALLET })));
    assert_eq!(
        requests[1].request.query,
        vec![("package".to_string(), "starter".to_string())]
    );
    assert!(drain(&mut rx)
        .iter()
        .any(|e| matches!(e, HostEvent::Info { .. })));
}

// ============================================================================
// Resources
// ============================================================================

#[test]
fn status_resource_reflects_session() {
    let mock = Arc::new(MockTransport::new());
    let server = server(config(None, Some(SIGNING_KEY)), &mock);

    let status = server.read_resource_text(STATUS_URI).unwrap();
    assert!(status.contains("x402 pay-per-call"));
    assert!(status.contains(WALLET));
    assert!(server.read_resource_text("identity://missing").is_none());
}
