//! The streamable-HTTP / SSE transport for an external tool server.
//!
//! Grounded in the teacher's `McpHttpSession` (`parse_json_rpc_from_body`
//! handling both plain JSON and `text/event-stream` bodies, the
//! initialize/request flow, `MCP-Session-Id` capture), reimplemented
//! without `mcp_core`'s `ErrorObject`/`MessageId`/etc types.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tokio::sync::RwLock;

use super::{ExternalToolServer, JsonRpcResponse, parse_tool_call_content, parse_tool_schemas};
use crate::error::ToolError;
use crate::message::ContentBlock;
use crate::model::ToolSchema;

fn transport_err(name: &str, message: impl Into<String>) -> ToolError {
    ToolError::Transport {
        name: name.to_string(),
        source: std::io::Error::other(message.into()),
    }
}

/// Parses a `tools/call`-or-similar HTTP response body, which per the MCP
/// streamable-HTTP spec may be either `application/json` or an SSE stream
/// of `data: <json>` lines — the last `data:` line carrying the response
/// is what we want.
pub(crate) fn parse_json_rpc_from_body(content_type: &str, body: &str) -> Result<JsonRpcResponse, ToolError> {
    if content_type.contains("text/event-stream") {
        let last_data = body
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .next_back()
            .ok_or_else(|| transport_err("http", "SSE body carried no data line"))?;
        Ok(serde_json::from_str(last_data)?)
    } else {
        Ok(serde_json::from_str(body)?)
    }
}

/// An external tool server reached over streamable-HTTP (and its SSE
/// variant, which differs only in how the response body is framed).
pub struct HttpToolServer {
    label: String,
    base_url: String,
    headers: HashMap<String, String>,
    client: Client,
    session_id: RwLock<Option<String>>,
    next_id: AtomicU64,
}

impl HttpToolServer {
    pub async fn connect(
        label: impl Into<String>,
        url: impl Into<String>,
        headers: HashMap<String, String>,
    ) -> Result<Self, ToolError> {
        let label = label.into();
        let server = Self {
            label: label.clone(),
            base_url: url.into(),
            headers,
            client: Client::new(),
            session_id: RwLock::new(None),
            next_id: AtomicU64::new(1),
        };
        server
            .request(
                "initialize",
                json!({ "protocolVersion": "2025-06-18", "clientInfo": { "name": "reagent-core" } }),
            )
            .await?;
        Ok(server)
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ToolError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });

        let mut builder = self
            .client
            .post(&self.base_url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream")
            .header("MCP-Protocol-Version", "2025-06-18");
        for (k, v) in &self.headers {
            builder = builder.header(k, v);
        }
        if let Some(ref sid) = *self.session_id.read().await {
            builder = builder.header("MCP-Session-Id", sid.clone());
        }

        let response = builder
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_err(&self.label, e.to_string()))?;

        if let Some(sid) = response.headers().get("MCP-Session-Id").and_then(|v| v.to_str().ok()) {
            *self.session_id.write().await = Some(sid.to_string());
        }
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        let text = response.text().await.map_err(|e| transport_err(&self.label, e.to_string()))?;

        let parsed = parse_json_rpc_from_body(&content_type, &text)?;
        if let Some(err) = parsed.error {
            return Err(ToolError::Provider {
                name: self.label.clone(),
                message: err.message,
            });
        }
        Ok(parsed.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ExternalToolServer for HttpToolServer {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_body() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[]}}"#;
        let parsed = parse_json_rpc_from_body("application/json", body).unwrap();
        assert_eq!(parsed.result, Some(json!({"tools": []})));
    }

    #[test]
    fn parses_sse_body_taking_the_last_data_line() {
        let body = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"ok\":true}}\n\n";
        let parsed = parse_json_rpc_from_body("text/event-stream", body).unwrap();
        assert_eq!(parsed.result, Some(json!({"ok": true})));
    }

    #[test]
    fn error_object_in_response_surfaces_as_provider_error_message() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"boom"}}"#;
        let parsed = parse_json_rpc_from_body("application/json", body).unwrap();
        assert_eq!(parsed.error.unwrap().message, "boom");
    }
}
