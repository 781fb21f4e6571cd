//! JSON-RPC tool surface.
//!
//! Each request is handled on its own: parameters and limits arrive in the
//! call arguments and nothing outlives the response.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use pairwise_explore::solver::build_pairs;
use pairwise_ir::parse::parameters_from_value;
use pairwise_ir::validate::validate_parameter_set;
use pairwise_ir::ParameterSet;

use crate::generate::{generate, GenerateRequest, Strategy};
use crate::limits::SolveLimits;

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INTERNAL_ERROR: i32 = -32603;

/// Handle a single JSON-RPC request and return a JSON-RPC response.
pub fn handle_request(req: &Value) -> Value {
    let id = req.get("id").cloned().unwrap_or(Value::Null);
    let method = req.get("method").and_then(|m| m.as_str()).unwrap_or("");

    match method {
        "initialize" => json_rpc_result(id, handle_initialize()),
        "tools/list" => json_rpc_result(id, handle_tools_list()),
        "tools/call" => {
            let params = req.get("params").cloned().unwrap_or(json!({}));
            json_rpc_result(id, handle_tools_call(&params))
        }
        _ => json_rpc_error(id, METHOD_NOT_FOUND, "Method not found"),
    }
}

/// Notifications get no response.
pub fn is_notification(req: &Value) -> bool {
    req.get("id").is_none()
        && req
            .get("method")
            .and_then(|m| m.as_str())
            .is_some_and(|m| m.starts_with("notifications/"))
}

/// Serve line-delimited JSON-RPC until `reader` is exhausted.
///
/// Requests are answered in order; each one runs on tokio's blocking pool.
pub async fn serve<R, W>(reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Ok(req) if is_notification(&req) => continue,
            Ok(req) => match tokio::task::spawn_blocking(move || handle_request(&req)).await {
                Ok(response) => response,
                Err(e) => json_rpc_error(Value::Null, INTERNAL_ERROR, &format!("Internal error: {e}")),
            },
            Err(e) => json_rpc_error(Value::Null, PARSE_ERROR, &format!("Parse error: {e}")),
        };

        writer.write_all(response.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

fn handle_initialize() -> Value {
    json!({
        "protocolVersion": "2024-11-05",
        "serverInfo": {
            "name": "pairwise",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {
            "tools": {}
        }
    })
}

fn handle_tools_list() -> Value {
    let parameters_schema = json!({
        "type": "object",
        "description": "Mapping of parameter name to its list of values, in column order",
        "additionalProperties": {
            "type": "array",
            "items": { "type": ["string", "number", "boolean"] }
        }
    });

    json!({
        "tools": [
            {
                "name": "pairwise_generate",
                "description": "Generate a test suite covering every pair of values across all parameter pairs",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "parameters": parameters_schema,
                        "strategy": {
                            "type": "string",
                            "enum": ["exact", "greedy"],
                            "description": "exact (default) proves a minimal suite within the time budget; greedy is fast"
                        },
                        "limits": {
                            "type": "object",
                            "properties": {
                                "time_budget_secs": { "type": "integer" },
                                "workers": { "type": "integer" },
                                "max_candidates": { "type": "integer" }
                            }
                        }
                    },
                    "required": ["parameters"]
                }
            },
            {
                "name": "pairwise_pairs",
                "description": "List every value pair that a covering suite must contain",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "parameters": parameters_schema
                    },
                    "required": ["parameters"]
                }
            }
        ]
    })
}

fn handle_tools_call(params: &Value) -> Value {
    let tool_name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    match tool_name {
        "pairwise_generate" => tool_pairwise_generate(&arguments),
        "pairwise_pairs" => tool_pairwise_pairs(&arguments),
        _ => json!({
            "isError": true,
            "content": [{
                "type": "text",
                "text": json!({"error": format!("Unknown tool: {tool_name}")}).to_string()
            }]
        }),
    }
}

fn tool_pairwise_generate(args: &Value) -> Value {
    let parameters = match checked_parameters(args) {
        Ok(parameters) => parameters,
        Err(errors) => return tool_errors(errors),
    };

    let strategy = match args.get("strategy").and_then(|s| s.as_str()) {
        Some(s) => match s.parse::<Strategy>() {
            Ok(strategy) => strategy,
            Err(e) => return tool_errors(vec![e.to_string()]),
        },
        None => Strategy::default(),
    };

    let limits = match args.get("limits") {
        Some(v) => match serde_json::from_value::<SolveLimits>(v.clone()) {
            Ok(limits) => limits,
            Err(e) => return tool_errors(vec![format!("invalid limits: {e}")]),
        },
        None => SolveLimits::default(),
    };

    let request = GenerateRequest {
        parameters,
        strategy,
        limits,
    };

    match generate(&request) {
        Ok(generation) => {
            let result = if generation.verdict.is_covering() {
                "pass"
            } else {
                "fail"
            };
            let uncovered: Vec<String> = generation.uncovered.iter().map(|p| p.to_string()).collect();

            tool_text(json!({
                "result": result,
                "verdict": generation.verdict,
                "message": generation.verdict.describe(),
                "strategy": generation.strategy,
                "total_pairs": generation.analytics.total_pairs,
                "total_test_cases": generation.analytics.total_test_cases,
                "suite": generation.suite,
                "uncovered": uncovered,
                "analytics": generation.analytics,
            }))
        }
        Err(e) => tool_errors(vec![e.to_string()]),
    }
}

fn tool_pairwise_pairs(args: &Value) -> Value {
    let parameters = match checked_parameters(args) {
        Ok(parameters) => parameters,
        Err(errors) => return tool_errors(errors),
    };

    match build_pairs(&parameters) {
        Ok(universe) => {
            let pairs: Vec<String> = universe.iter().map(|p| p.to_string()).collect();
            tool_text(json!({
                "result": "pass",
                "total_pairs": universe.len(),
                "pairs": pairs,
            }))
        }
        Err(e) => tool_errors(vec![e.to_string()]),
    }
}

/// Parse and validate the `parameters` argument, collecting every problem.
fn checked_parameters(args: &Value) -> Result<ParameterSet, Vec<String>> {
    let raw = args
        .get("parameters")
        .ok_or_else(|| vec!["missing 'parameters' argument".to_string()])?;
    let parameters = parameters_from_value(raw).map_err(|e| vec![e.to_string()])?;
    validate_parameter_set(&parameters)
        .map_err(|errors| errors.iter().map(|e| e.to_string()).collect::<Vec<_>>())?;
    Ok(parameters)
}

fn tool_text(body: Value) -> Value {
    json!({
        "content": [{
            "type": "text",
            "text": body.to_string()
        }]
    })
}

fn tool_errors(errors: Vec<String>) -> Value {
    tool_text(json!({
        "result": "errors",
        "errors": errors,
    }))
}

fn json_rpc_result(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

fn json_rpc_error(id: Value, code: i32, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message,
        }
    })
}
