//! Tool bridge: the command-invocation channel to the SochDB engine.
//!
//! The engine is reached exclusively through an MCP server process speaking
//! JSON-RPC 2.0 over stdio. [`ToolBridge`] is the seam the interpreter and
//! session code program against; [`StdioBridge`] is the real implementation
//! that spawns the server and frames `tools/call` requests, and tests plug
//! in scripted bridges instead.

use std::future::Future;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::debug;

use soch_wire::ToolEnvelope;

const JSON_RPC_VERSION: &str = "2.0";
const MCP_PROTOCOL_VERSION: &str = "2025-11-25";

/// Tool names exposed by the SochDB MCP server.
pub mod tools {
    pub const LIST_TABLES: &str = "sochdb_list_tables";
    pub const GET: &str = "sochdb_get";
    pub const PUT: &str = "sochdb_put";
    pub const DELETE: &str = "sochdb_delete";
    pub const DESCRIBE: &str = "sochdb_describe";
    pub const QUERY: &str = "sochdb_query";
}

/// Failure of a bridge invocation.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The server rejected the call; its message is surfaced verbatim.
    #[error("{0}")]
    Rejected(String),
    /// The call never completed: I/O failure, closed pipe, malformed frame.
    #[error("tool bridge transport failure: {0}")]
    Transport(String),
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Transport(err.to_string())
    }
}

/// Named tool invocation against the engine.
///
/// `arguments` is always a JSON object. A returned [`ToolEnvelope`] may
/// still carry a tool-level `isError`; a `BridgeError` means the invocation
/// itself was rejected or the transport broke.
pub trait ToolBridge: Send + Sync {
    fn invoke(
        &self,
        tool: &str,
        arguments: Value,
    ) -> impl Future<Output = Result<ToolEnvelope, BridgeError>> + Send;
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

fn unwrap_response(response: RpcResponse) -> Result<Value, BridgeError> {
    if let Some(error) = response.error {
        debug!(code = error.code, "bridge rejected request");
        return Err(BridgeError::Rejected(error.message));
    }
    response
        .result
        .ok_or_else(|| BridgeError::Transport("response carries neither result nor error".into()))
}

/// JSON-RPC client over a spawned MCP server process.
///
/// Requests are serialized behind one lock: within a single caller the call
/// order is total, but no FIFO ordering is promised between concurrent
/// callers. There is no timeout or cancellation; a dispatched call runs to
/// completion or failure.
pub struct StdioBridge {
    io: Mutex<BridgeIo>,
    next_id: AtomicI64,
}

struct BridgeIo {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl StdioBridge {
    /// Spawn the server command and perform the MCP handshake
    /// (`initialize` + `notifications/initialized`).
    pub async fn spawn(program: &str, args: &[String]) -> Result<Self, BridgeError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::Transport("server stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::Transport("server stdout unavailable".into()))?;

        let bridge = Self {
            io: Mutex::new(BridgeIo {
                child,
                stdin,
                stdout: BufReader::new(stdout).lines(),
            }),
            next_id: AtomicI64::new(0),
        };

        let init = bridge
            .request(
                "initialize",
                json!({
                    "protocolVersion": MCP_PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": "soch-studio",
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            )
            .await?;
        debug!(server = ?init.get("serverInfo"), "bridge initialized");

        bridge.notify("notifications/initialized").await?;
        Ok(bridge)
    }

    /// Names of the tools the server advertises.
    pub async fn list_tools(&self) -> Result<Vec<String>, BridgeError> {
        let result = self.request("tools/list", json!({})).await?;
        let names = result
            .get("tools")
            .and_then(Value::as_array)
            .map(|tools| {
                tools
                    .iter()
                    .filter_map(|tool| tool.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(names)
    }

    /// Drop the server's stdin and reap the child.
    pub async fn shutdown(self) {
        let BridgeIo {
            mut child,
            stdin,
            stdout,
        } = self.io.into_inner();
        drop(stdin);
        drop(stdout);
        if let Err(err) = child.kill().await {
            debug!("bridge child already gone: {err}");
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let frame = encode_frame(&RpcRequest {
            jsonrpc: JSON_RPC_VERSION,
            id: Some(id),
            method,
            params,
        })?;

        let mut io = self.io.lock().await;
        io.stdin.write_all(frame.as_bytes()).await?;
        io.stdin.write_all(b"\n").await?;
        io.stdin.flush().await?;

        loop {
            let line = io
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| BridgeError::Transport("server closed the pipe".into()))?;
            if line.trim().is_empty() {
                continue;
            }
            let response: RpcResponse = serde_json::from_str(&line)
                .map_err(|err| BridgeError::Transport(format!("malformed frame: {err}")))?;
            match &response.id {
                Some(Value::Number(n)) if n.as_i64() == Some(id) => {
                    return unwrap_response(response);
                }
                // Server-initiated notifications and stale frames are not
                // ours to answer.
                _ => debug!(method, "skipping non-matching frame"),
            }
        }
    }

    async fn notify(&self, method: &str) -> Result<(), BridgeError> {
        let frame = encode_frame(&RpcRequest {
            jsonrpc: JSON_RPC_VERSION,
            id: None,
            method,
            params: json!({}),
        })?;
        let mut io = self.io.lock().await;
        io.stdin.write_all(frame.as_bytes()).await?;
        io.stdin.write_all(b"\n").await?;
        io.stdin.flush().await?;
        Ok(())
    }
}

fn encode_frame(request: &RpcRequest<'_>) -> Result<String, BridgeError> {
    serde_json::to_string(request)
        .map_err(|err| BridgeError::Transport(format!("failed to encode request: {err}")))
}

impl ToolBridge for StdioBridge {
    async fn invoke(&self, tool: &str, arguments: Value) -> Result<ToolEnvelope, BridgeError> {
        let result = self
            .request(
                "tools/call",
                json!({
                    "name": tool,
                    "arguments": arguments,
                }),
            )
            .await?;
        serde_json::from_value(result)
            .map_err(|err| BridgeError::Transport(format!("malformed tool envelope: {err}")))
    }
}
