//! Line-delimited JSON-RPC server on stdin/stdout exposing one tool, `get_daily_logs`

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use action_logger_core::pipeline::DEFAULT_LIMIT;
use action_logger_core::{AppConfig, LogQuery};

const TOOL_NAME: &str = "get_daily_logs";
const SERVER_NAME: &str = "daily-logs-server";
const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

const ERR_PARSE: i32 = -32700;
const ERR_INVALID_REQUEST: i32 = -32600;
const ERR_METHOD_NOT_FOUND: i32 = -32601;

pub async fn run(config: &AppConfig) -> Result<()> {
    LogsServer::new(LogQuery::from_config(config)).serve_stdio().await
}

pub struct LogsServer {
    query: LogQuery,
}

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

impl LogsServer {
    pub fn new(query: LogQuery) -> Self {
        Self { query }
    }

    pub async fn serve_stdio(&self) -> Result<()> {
        let mut reader = BufReader::new(io::stdin());
        let mut stdout = io::stdout();
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                debug!("Client disconnected (EOF)");
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Value>(trimmed) {
                Ok(request) => self.handle_message(request).await,
                Err(e) => {
                    warn!(error = %e, "Failed to parse JSON-RPC message");
                    Some(serde_json::to_value(JsonRpcResponse::error(
                        Value::Null,
                        ERR_PARSE,
                        "Parse error",
                    ))?)
                }
            };

            if let Some(response) = response {
                let out = serde_json::to_string(&response)? + "\n";
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle one JSON-RPC message; notifications produce no response
    pub async fn handle_message(&self, message: Value) -> Option<Value> {
        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                return serde_json::to_value(JsonRpcResponse::error(
                    Value::Null,
                    ERR_INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ))
                .ok();
            }
        };

        // No id means notification (e.g. notifications/initialized)
        let id = request.id?;
        debug!(method = %request.method, "Handling JSON-RPC request");

        let response = if request.jsonrpc != "2.0" {
            JsonRpcResponse::error(
                id,
                ERR_INVALID_REQUEST,
                format!("Unsupported JSON-RPC version: {}", request.jsonrpc),
            )
        } else {
            match request.method.as_str() {
                "initialize" => {
                    JsonRpcResponse::result(id, initialize_result(request.params.as_ref()))
                }
                "ping" => JsonRpcResponse::result(id, json!({})),
                "tools/list" => {
                    JsonRpcResponse::result(id, json!({ "tools": [tool_descriptor()] }))
                }
                "tools/call" => {
                    let text = self.call_tool(request.params.as_ref()).await;
                    let content = json!({ "content": [{ "type": "text", "text": text }] });
                    JsonRpcResponse::result(id, content)
                }
                other => JsonRpcResponse::error(
                    id,
                    ERR_METHOD_NOT_FOUND,
                    format!("Unknown method: {}", other),
                ),
            }
        };

        serde_json::to_value(response).ok()
    }

    async fn call_tool(&self, params: Option<&Value>) -> String {
        let name = params
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if name != TOOL_NAME {
            warn!(tool = name, "Unknown tool");
            return format!("Unknown tool: {}", name);
        }

        let limit = params
            .and_then(|p| p.get("arguments"))
            .and_then(|a| a.get("limit"))
            .and_then(|l| l.as_i64().or_else(|| l.as_f64().map(|f| f as i64)))
            .unwrap_or(DEFAULT_LIMIT);
        debug!(limit, "get_daily_logs called");

        let text = self.query.query(limit).await;
        debug!(len = text.len(), "get_daily_logs result");
        text
    }
}

fn initialize_result(params: Option<&Value>) -> Value {
    let protocol_version = params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);
    json!({
        "protocolVersion": protocol_version,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}

fn tool_descriptor() -> Value {
    json!({
        "name": TOOL_NAME,
        "description": "Get the user's activity log for today. Returns the most recent entries (5 by default), or every entry when limit is -1.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "limit": {
                    "type": "number",
                    "description": "Number of entries to return. 5 returns the latest five, -1 returns all. Defaults to 5."
                }
            },
            "required": []
        }
    })
}
