//! The stdio transport for an external tool server: a child process
//! speaking line-delimited JSON-RPC over its stdin/stdout.
//!
//! Grounded in the teacher's `McpSession` stdio client (spawn + handshake),
//! reimplemented over `tokio::process` directly rather than the
//! `mcp_client`/`mcp_core` git dependency (see this repo's design notes).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use super::{ExternalToolServer, JsonRpcResponse, parse_tool_call_content, parse_tool_schemas};
use crate::error::ToolError;
use crate::message::ContentBlock;
use crate::model::ToolSchema;

fn io_err(name: &str, err: std::io::Error) -> ToolError {
    ToolError::Transport {
        name: name.to_string(),
        source: err,
    }
}

struct Pipes {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// An external tool server reached by spawning a child process and
/// speaking JSON-RPC over its stdio.
pub struct StdioToolServer {
    label: String,
    _child: Child,
    pipes: Mutex<Pipes>,
    next_id: AtomicU64,
}

impl StdioToolServer {
    /// Spawns `command args...` and performs the `initialize` /
    /// `notifications/initialized` handshake.
    pub async fn spawn(label: impl Into<String>, command: &str, args: &[String]) -> Result<Self, ToolError> {
        let label = label.into();
        let mut child = Command::new(command)
            .args(args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| io_err(&label, e))?;

        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = BufReader::new(child.stdout.take().expect("piped stdout"));

        let server = Self {
            label: label.clone(),
            _child: child,
            pipes: Mutex::new(Pipes { stdin, stdout }),
            next_id: AtomicU64::new(1),
        };

        server
            .request(
                "initialize",
                json!({ "protocolVersion": "2025-06-18", "clientInfo": { "name": "reagent-core" } }),
            )
            .await?;
        server.notify("notifications/initialized", json!({})).await?;
        Ok(server)
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ToolError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        let mut line = serde_json::to_string(&request)?.into_bytes();
        line.push(b'\n');

        let mut pipes = self.pipes.lock().await;
        pipes.stdin.write_all(&line).await.map_err(|e| io_err(&self.label, e))?;
        pipes.stdin.flush().await.map_err(|e| io_err(&self.label, e))?;

        let mut response_line = String::new();
        pipes
            .stdout
            .read_line(&mut response_line)
            .await
            .map_err(|e| io_err(&self.label, e))?;
        drop(pipes);

        let response: JsonRpcResponse = serde_json::from_str(response_line.trim())?;
        if let Some(err) = response.error {
            return Err(ToolError::Provider {
                name: self.label.clone(),
                message: err.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn notify(&self, method: &str, params: Value) -> Result<(), ToolError> {
        let notification = json!({ "jsonrpc": "2.0", "method": method, "params": params });
        let mut line = serde_json::to_string(&notification)?.into_bytes();
        line.push(b'\n');
        let mut pipes = self.pipes.lock().await;
        pipes.stdin.write_all(&line).await.map_err(|e| io_err(&self.label, e))?;
        pipes.stdin.flush().await.map_err(|e| io_err(&self.label, e))?;
        Ok(())
    }
}

#[async_trait]
impl ExternalToolServer for StdioToolServer {
    async fn list_tools(&self) -> Result<Vec<ToolSchema>, ToolError> {
        let result = self.request("tools/list", json!({})).await?;
        Ok(parse_tool_schemas(&result))
    }

    async fn call_tool(&self, name: &str, args: &HashMap<String, Value>) -> Result<Vec<ContentBlock>, ToolError> {
        let result = self
            .request("tools/call", json!({ "name": name, "arguments": args }))
            .await?;
        Ok(parse_tool_call_content(&result))
    }
}
