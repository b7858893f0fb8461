//! Line-delimited JSON-RPC over stdin/stdout. One request per line, one
//! response per line; notifications (no `id`) get no response.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, Write};

use crate::error::ToolError;
use crate::tools::Dispatcher;

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<ToolError> for RpcError {
    fn from(e: ToolError) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: e.to_string(),
            data: Some(json!({ "kind": e.kind() })),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ReadParams {
    uri: String,
}

pub(crate) fn serve<R: BufRead, W: Write>(
    dispatcher: &Dispatcher,
    input: R,
    mut output: W,
) -> Result<()> {
    info!("Serving requests on stdin");
    for line in input.lines() {
        let line = line.context("Failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = handle_line(dispatcher, &line) {
            serde_json::to_writer(&mut output, &response).context("Failed to write response")?;
            output.write_all(b"\n")?;
            output.flush()?;
        }
    }
    info!("Input closed, shutting down");
    Ok(())
}

fn handle_line(dispatcher: &Dispatcher, line: &str) -> Option<Response> {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            warn!("Unparseable request: {e}");
            return Some(failure(Value::Null, RpcError::new(PARSE_ERROR, e.to_string())));
        }
    };
    let request: Request = match serde_json::from_value(value.clone()) {
        Ok(r) => r,
        Err(e) => {
            let id = value.get("id").cloned().unwrap_or(Value::Null);
            return Some(failure(id, RpcError::new(INVALID_REQUEST, e.to_string())));
        }
    };

    debug!("Request {}: {}", request.method, request.params);
    let outcome = handle(dispatcher, &request.method, request.params);
    let id = request.id?;
    Some(match outcome {
        Ok(result) => Response {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        },
        Err(e) => failure(id, e),
    })
}

fn failure(id: Value, error: RpcError) -> Response {
    Response {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(error),
    }
}

fn params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError::new(INVALID_PARAMS, e.to_string()))
}

fn handle(dispatcher: &Dispatcher, method: &str, raw: Value) -> Result<Value, RpcError> {
    match method {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": { "tools": {}, "resources": {} },
        })),
        "ping" => Ok(json!({})),
        m if m.starts_with("notifications/") => Ok(Value::Null),
        "tools/list" => Ok(json!({ "tools": dispatcher.tools() })),
        "tools/call" => {
            let call: CallParams = params(raw)?;
            let envelope = dispatcher.call(&call.name, call.arguments);
            let text = serde_json::to_string_pretty(&envelope)
                .map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))?;
            Ok(json!({
                "content": [{ "type": "text", "text": text }],
                "isError": !envelope.success,
            }))
        }
        "resources/list" => Ok(json!({ "resources": dispatcher.resources() })),
        "resources/read" => {
            let read: ReadParams = params(raw)?;
            let text = dispatcher.read_resource(&read.uri)?;
            Ok(json!({
                "contents": [{ "uri": read.uri, "mimeType": "text/csv", "text": text }],
            }))
        }
        "ledger/stats" => Ok(json!(dispatcher.stats())),
        other => Err(RpcError::new(
            METHOD_NOT_FOUND,
            format!("Unknown method: {other}"),
        )),
    }
}

#[cfg(test)]
#[path = "stdio_tests.rs"]
mod tests;
