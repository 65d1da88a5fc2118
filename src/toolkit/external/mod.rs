//! External tool servers (§6): the MCP-like interface — `listTools`,
//! `callTool` — over stdio, SSE, or streamable-HTTP transports.
//!
//! Reimplemented here without the teacher's `mcp_client`/`mcp_core` crates
//! (git-sourced, not published to a registry — see this repo's design
//! notes for the substitution). The JSON-RPC framing is small enough to
//! hand-roll directly on top of `tokio::process` and `reqwest`.

pub mod http;
pub mod stdio;

pub use http::HttpToolServer;
pub use stdio::StdioToolServer;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;
use crate::message::ContentBlock;
use crate::model::ToolSchema;

/// How an external tool server is reached.
#[derive(Debug, Clone)]
pub enum Transport {
    Stdio { command: String, args: Vec<String> },
    Http { url: String, headers: HashMap<String, String> },
    Sse { url: String, headers: HashMap<String, String> },
}

/// A minimal JSON-RPC 2.0 envelope, shared by the stdio and HTTP
/// transports — both speak the same message shape, only the framing
/// differs.
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcRequest<'a> {
    pub jsonrpc: &'a str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcResponse {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    #[allow(dead_code)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcError {
    #[allow(dead_code)]
    pub code: i64,
    pub message: String,
}

/// The interface the toolkit consumes for any registered external tool
/// server, regardless of transport.
#[async_trait]
pub trait ExternalToolServer: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSchema>, ToolError>;
    async fn call_tool(&self, name: &str, args: &HashMap<String, Value>) -> Result<Vec<ContentBlock>, ToolError>;
}

/// `tools/list` and `tools/call` results share this tool-schema shape —
/// parsed once here, reused by both transports.
pub(crate) fn parse_tool_schemas(result: &Value) -> Vec<ToolSchema> {
    result
        .get("tools")
        .and_then(Value::as_array)
        .map(|tools| {
            tools
                .iter()
                .filter_map(|t| {
                    Some(ToolSchema {
                        name: t.get("name")?.as_str()?.to_string(),
                        description: t
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        input_schema: t.get("inputSchema").cloned().unwrap_or(Value::Null),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// `tools/call`'s `content` array is a list of `{type: "text", text: ...}`
/// (and similar) blocks — map them onto our own content-block model.
pub(crate) fn parse_tool_call_content(result: &Value) -> Vec<ContentBlock> {
    result
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let text = item.get("text")?.as_str()?;
                    Some(ContentBlock::text(text))
                })
                .collect()
        })
        .unwrap_or_default()
}
