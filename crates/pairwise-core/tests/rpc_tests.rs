use pairwise_core::rpc::{handle_request, is_notification, serve};
use serde_json::json;

fn make_request(method: &str, params: serde_json::Value) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    })
}

fn parse_tool_response(resp: &serde_json::Value) -> serde_json::Value {
    let content = &resp["result"]["content"][0];
    serde_json::from_str(content["text"].as_str().unwrap()).unwrap()
}

fn call_tool(name: &str, arguments: serde_json::Value) -> serde_json::Value {
    let req = make_request("tools/call", json!({ "name": name, "arguments": arguments }));
    parse_tool_response(&handle_request(&req))
}

fn display_settings() -> serde_json::Value {
    serde_json::from_str(include_str!("../../pairwise-ir/tests/fixtures/display_settings.json")).unwrap()
}

#[test]
fn test_initialize() {
    let req = make_request(
        "initialize",
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": { "name": "test", "version": "1.0" }
        }),
    );
    let resp = handle_request(&req);
    assert_eq!(resp["jsonrpc"], "2.0");
    assert_eq!(resp["id"], 1);
    assert_eq!(resp["result"]["serverInfo"]["name"], "pairwise");
    assert!(resp["result"]["capabilities"]["tools"].is_object());
}

#[test]
fn test_tools_list() {
    let resp = handle_request(&make_request("tools/list", json!({})));
    let tools = resp["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["pairwise_generate", "pairwise_pairs"]);
}

#[test]
fn test_unknown_method() {
    let resp = handle_request(&make_request("resources/list", json!({})));
    assert_eq!(resp["error"]["code"], -32601);
}

#[test]
fn test_unknown_tool() {
    let req = make_request("tools/call", json!({ "name": "nope", "arguments": {} }));
    let resp = handle_request(&req);
    assert_eq!(resp["result"]["isError"], true);
}

#[test]
fn test_generate_greedy_display_settings() {
    let body = call_tool(
        "pairwise_generate",
        json!({ "parameters": display_settings(), "strategy": "greedy" }),
    );
    assert_eq!(body["result"], "pass");
    assert_eq!(body["verdict"], "complete");
    // 3*4 + 3*3 + 3*4 + 3*3 + 4*3 + 4*4 + 4*3 + 3*4 + 3*3 + 4*3
    assert_eq!(body["total_pairs"], 115);
    let total = body["total_test_cases"].as_u64().unwrap();
    assert!(total >= 16);
    assert_eq!(body["suite"].as_array().unwrap().len() as u64, total);
    assert_eq!(body["analytics"]["parameters"][0], "Display Mode");
    assert!(body["uncovered"].as_array().unwrap().is_empty());
}

#[test]
fn test_generate_exact_small() {
    let body = call_tool(
        "pairwise_generate",
        json!({
            "parameters": { "P1": ["a", "b"], "P2": ["c", "d"], "P3": ["e", "f"] },
            "limits": { "time_budget_secs": 30, "workers": 2 }
        }),
    );
    assert_eq!(body["result"], "pass");
    assert_eq!(body["verdict"], "optimal");
    assert_eq!(body["total_test_cases"], 4);
    assert_eq!(body["analytics"]["rows"][0]["new_pairs"], 3);
}

#[test]
fn test_generate_with_unbounded_budget() {
    let body = call_tool(
        "pairwise_generate",
        json!({
            "parameters": { "X": ["x0", "x1", "x2"], "Y": ["y0", "y1"] },
            "limits": { "time_budget_secs": u64::MAX }
        }),
    );
    assert_eq!(body["result"], "pass");
    assert_eq!(body["verdict"], "optimal");
    assert_eq!(body["total_test_cases"], 6);
}

#[test]
fn test_generate_reports_all_validation_errors() {
    let body = call_tool(
        "pairwise_generate",
        json!({ "parameters": { "Only": ["x"] } }),
    );
    assert_eq!(body["result"], "errors");
    // Too few parameters and too few values.
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[test]
fn test_generate_rejects_bad_strategy() {
    let body = call_tool(
        "pairwise_generate",
        json!({ "parameters": { "A": ["1", "2"], "B": ["x", "y"] }, "strategy": "random" }),
    );
    assert_eq!(body["result"], "errors");
    assert!(body["errors"][0].as_str().unwrap().contains("random"));
}

#[test]
fn test_generate_enforces_candidate_limit() {
    let body = call_tool(
        "pairwise_generate",
        json!({
            "parameters": { "A": ["1", "2"], "B": ["x", "y"] },
            "limits": { "max_candidates": 3 }
        }),
    );
    assert_eq!(body["result"], "errors");
    assert!(body["errors"][0].as_str().unwrap().contains("max 3"));
}

#[test]
fn test_generate_requires_parameters() {
    let body = call_tool("pairwise_generate", json!({}));
    assert_eq!(body["result"], "errors");
}

#[test]
fn test_pairs_listing() {
    let body = call_tool(
        "pairwise_pairs",
        json!({ "parameters": { "B": ["x", "y"], "A": ["1", "2"] } }),
    );
    assert_eq!(body["total_pairs"], 4);
    let pairs = body["pairs"].as_array().unwrap();
    assert_eq!(pairs[0], "(A=1, B=x)");
}

#[test]
fn test_notification_detection() {
    assert!(is_notification(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"})));
    assert!(!is_notification(&make_request("tools/list", json!({}))));
}

#[tokio::test]
async fn test_serve_answers_each_line_in_order() {
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        "\n",
        "not json\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        "\n",
    );
    let mut output = Vec::new();
    serve(input.as_bytes(), &mut output).await.unwrap();

    let responses: Vec<serde_json::Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[1]["error"]["code"], -32700);
    assert_eq!(responses[2]["id"], 2);
}
