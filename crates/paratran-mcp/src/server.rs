//! Request dispatch and the stdio loop.

use paratran_client::Backend;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::McpError;
use crate::protocol::{RpcRequest, RpcResponse, negotiate_version, require_str};
use crate::tool::{self, TOOL_NAME, TranscribeArgs};

/// MCP server exposing the `transcribe` tool.
pub struct McpServer {
    backend: Backend,
}

impl McpServer {
    /// Server running tool calls on `backend`.
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Where tool calls run.
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Serve newline-delimited JSON-RPC until `reader` hits EOF.
    ///
    /// Requests are handled one at a time, in arrival order.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<(), McpError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(backend = %self.backend, "MCP server ready on stdio");
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_message(&line).await {
                let mut out = serde_json::to_vec(&response)?;
                out.push(b'\n');
                writer.write_all(&out).await?;
                writer.flush().await?;
            }
        }
        info!("MCP client closed stdin");
        Ok(())
    }

    /// Handle one raw message. `None` for notifications.
    pub async fn handle_message(&self, line: &str) -> Option<RpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                return Some(RpcResponse::parse_error());
            }
        };
        let id = value.get("id").cloned();
        let request: RpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => return Some(RpcResponse::invalid_request(id, e.to_string())),
        };
        if request.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
            return Some(RpcResponse::invalid_request(request.id, "jsonrpc must be \"2.0\""));
        }
        if request.is_notification() {
            debug!(method = %request.method, "notification");
            return None;
        }
        Some(self.dispatch(request).await)
    }

    async fn dispatch(&self, request: RpcRequest) -> RpcResponse {
        let RpcRequest { id, method, params, .. } = request;
        debug!(%method, "request");
        let params = params.unwrap_or(Value::Null);
        match method.as_str() {
            "initialize" => {
                let requested = params.get("protocolVersion").and_then(Value::as_str);
                RpcResponse::success(
                    id,
                    json!({
                        "protocolVersion": negotiate_version(requested),
                        "capabilities": { "tools": { "listChanged": false } },
                        "serverInfo": {
                            "name": "paratran",
                            "version": env!("CARGO_PKG_VERSION"),
                        },
                    }),
                )
            }
            "ping" => RpcResponse::success(id, json!({})),
            "tools/list" => RpcResponse::success(id, json!({ "tools": [tool::definition()] })),
            "tools/call" => {
                let name = match require_str(&params, "name") {
                    Ok(n) => n,
                    Err(msg) => return RpcResponse::invalid_params(id, msg),
                };
                if name != TOOL_NAME {
                    return RpcResponse::invalid_params(id, format!("Unknown tool: {name}"));
                }
                match TranscribeArgs::parse(params.get("arguments")) {
                    Ok(args) => match tool::call(&self.backend, &args).await {
                        Ok(result) => RpcResponse::success(id, result),
                        Err(e) => {
                            warn!(error = %e, "failed to encode tool result");
                            RpcResponse::internal_error(id, format!("Failed to encode result: {e}"))
                        }
                    },
                    Err(msg) => RpcResponse::invalid_params(id, msg),
                }
            }
            other => RpcResponse::method_not_found(id, other),
        }
    }
}
