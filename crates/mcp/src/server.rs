//! MCP server loop over line-delimited stdio.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, CancelledParams, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION,
    RequestId, ServerCapabilities, ServerInfo, Tool, ToolsCapability,
};

/// Trait for the tool side of a server.
///
/// Implementations describe their tools and execute calls. Calls may run
/// concurrently, so implementations must not rely on exclusive access.
pub trait ToolHandler: Send + Sync + 'static {
    /// Tool definitions advertised by `tools/list`.
    fn tools(&self) -> Vec<Tool>;

    /// Execute a tool call.
    fn call(
        &self,
        name: &str,
        arguments: Value,
    ) -> impl Future<Output = Result<CallToolResult>> + Send;
}

/// An MCP server dispatching requests to a [`ToolHandler`].
pub struct Server<H> {
    info: ServerInfo,
    handler: Arc<H>,
}

type InFlight = HashMap<RequestId, AbortHandle>;

impl<H: ToolHandler> Server<H> {
    pub fn new(info: ServerInfo, handler: H) -> Self {
        Self {
            info,
            handler: Arc::new(handler),
        }
    }

    /// Serve on the process's stdin/stdout until stdin closes.
    pub async fn serve_stdio(self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC messages until `reader` hits EOF.
    ///
    /// Returns once every in-flight call has written its response.
    pub async fn serve<R, W>(self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_lines(writer, rx));

        let mut lines = BufReader::new(reader).lines();
        let mut in_flight = InFlight::new();

        info!(server = %self.info.name, "MCP server listening");

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(line) {
                Ok(request) => request,
                Err(e) => {
                    warn!("unparseable message: {e}");
                    let error = JsonRpcError::parse_error(e.to_string());
                    send(&tx, JsonRpcResponse::failure(None, error));
                    continue;
                }
            };

            in_flight.retain(|_, handle| !handle.is_finished());
            self.dispatch(request, &tx, &mut in_flight);
        }

        info!("input closed, waiting for in-flight calls");
        drop(tx);

        writer_task
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }

    fn dispatch(
        &self,
        request: JsonRpcRequest,
        tx: &mpsc::UnboundedSender<String>,
        in_flight: &mut InFlight,
    ) {
        let Some(id) = request.id else {
            self.notify(&request.method, request.params, in_flight);
            return;
        };

        if request.jsonrpc != "2.0" {
            let error = JsonRpcError::invalid_request("jsonrpc must be \"2.0\"");
            send(tx, JsonRpcResponse::failure(Some(id), error));
            return;
        }

        debug!(?id, method = %request.method, "request");

        match request.method.as_str() {
            "initialize" => {
                let result = self.initialize(request.params);
                send(tx, JsonRpcResponse::success(id, result));
            }
            "ping" => send(tx, JsonRpcResponse::success(id, serde_json::json!({}))),
            "tools/list" => {
                let result = ListToolsResult {
                    tools: self.handler.tools(),
                };
                send(tx, JsonRpcResponse::success(id, result));
            }
            "tools/call" => {
                let params: CallToolParams = match parse_params(request.params) {
                    Ok(params) => params,
                    Err(e) => {
                        send(tx, JsonRpcResponse::failure(Some(id), e.into()));
                        return;
                    }
                };

                let handler = Arc::clone(&self.handler);
                let tx = tx.clone();
                let call_id = id.clone();
                let task = tokio::spawn(async move {
                    let arguments = params.arguments.unwrap_or(Value::Null);
                    let response = match handler.call(&params.name, arguments).await {
                        Ok(result) => JsonRpcResponse::success(call_id, result),
                        Err(e) => {
                            warn!(tool = %params.name, "tool call failed: {e}");
                            JsonRpcResponse::failure(Some(call_id), e.into())
                        }
                    };
                    send(&tx, response);
                });

                in_flight.insert(id, task.abort_handle());
            }
            method => {
                let error = JsonRpcError::method_not_found(method);
                send(tx, JsonRpcResponse::failure(Some(id), error));
            }
        }
    }

    fn notify(&self, method: &str, params: Option<Value>, in_flight: &mut InFlight) {
        match method {
            "notifications/initialized" => debug!("client initialized"),
            "notifications/cancelled" => match parse_params::<CancelledParams>(params) {
                Ok(cancel) => {
                    if let Some(handle) = in_flight.remove(&cancel.request_id) {
                        handle.abort();
                        info!(id = ?cancel.request_id, reason = ?cancel.reason, "call cancelled");
                    }
                }
                Err(e) => warn!("bad cancellation: {e}"),
            },
            other => debug!(method = other, "ignoring notification"),
        }
    }

    fn initialize(&self, params: Option<Value>) -> InitializeResult {
        let params: InitializeParams = parse_params(params).unwrap_or_default();

        if let Some(client) = &params.client_info {
            info!(client = %client.name, version = ?client.version, "initialize");
        }

        InitializeResult {
            protocol_version: params
                .protocol_version
                .unwrap_or_else(|| PROTOCOL_VERSION.to_string()),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: self.info.clone(),
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T> {
    let params = params.unwrap_or(Value::Null);
    serde_json::from_value(params).map_err(|e| Error::InvalidParams(e.to_string()))
}

fn send(tx: &mpsc::UnboundedSender<String>, response: JsonRpcResponse) {
    match serde_json::to_string(&response) {
        Ok(line) => {
            // Writer gone means the output side is closed; nothing left to do.
            let _ = tx.send(line);
        }
        Err(e) => error!("failed to serialize response: {e}"),
    }
}

async fn write_lines<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
