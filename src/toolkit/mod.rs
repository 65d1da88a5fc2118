//! The toolkit (§4.5): registers native and external tools, executes
//! `ToolUse` blocks, and produces per-session copies for isolation.
//!
//! Grounded in the teacher's `ToolRegistry`/`ToolRegistryLocked` — a
//! name-keyed map behind a lock, with `copy()` cloning the map structure
//! while sharing the underlying `Arc<dyn Tool>` implementations.

pub mod external;
pub mod native;

pub use external::{ExternalToolServer, Transport};
pub use native::NativeFn;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::error::ToolError;
use crate::message::ContentBlock;
use crate::model::ToolSchema;

/// A callable tool, native or adapted from an external server.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> Value;
    async fn call(&self, input: &HashMap<String, Value>) -> Result<Vec<ContentBlock>, ToolError>;
}

/// An external tool, keyed by name: the server that owns it plus the
/// schema `list_tools` returned for it, so the model sees real metadata
/// instead of a re-derived blank.
#[derive(Clone)]
struct ExternalEntry {
    server: Arc<dyn ExternalToolServer>,
    schema: ToolSchema,
}

/// Registers native tools and external tool servers, routes `ToolUse`
/// blocks to whichever owns the name, and never lets a tool error cross
/// the boundary as an `Err` — native and external failures alike become
/// an error text block inside the `ToolResult`.
#[derive(Clone, Default)]
pub struct Toolkit {
    native: Arc<DashMap<String, Arc<dyn Tool>>>,
    external: Arc<DashMap<String, ExternalEntry>>,
}

impl Toolkit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_native(&self, tool: Arc<dyn Tool>) {
        self.native.insert(tool.name().to_string(), tool);
    }

    /// Registers every tool schema an external server currently exposes.
    /// Bootstrapping (§6: "Registration is async and fails the agent call
    /// if bootstrapping fails") happens before this call — the caller is
    /// expected to have already confirmed `list_tools` succeeds.
    pub async fn register_external(&self, server: Arc<dyn ExternalToolServer>) -> Result<(), ToolError> {
        for schema in server.list_tools().await? {
            self.external.insert(
                schema.name.clone(),
                ExternalEntry {
                    server: server.clone(),
                    schema,
                },
            );
        }
        Ok(())
    }

    /// All tool schemas visible to the model for this turn: native tools'
    /// own schemas plus whatever external servers have registered, each
    /// carrying the real description/input schema `list_tools` reported.
    pub fn tool_schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .native
            .iter()
            .map(|entry| ToolSchema {
                name: entry.key().clone(),
                description: entry.value().description().to_string(),
                input_schema: entry.value().input_schema(),
            })
            .collect();
        schemas.extend(self.external.iter().map(|entry| entry.value().schema.clone()));
        schemas
    }

    /// Execute one `ToolUse` block, returning its `ToolResult` content.
    /// Never returns an `Err` — unknown tools, native errors, and
    /// external-provider errors all become an error text block instead
    /// (§4.5).
    pub async fn execute(&self, _id: &str, name: &str, input: &HashMap<String, Value>) -> Vec<ContentBlock> {
        if let Some(tool) = self.native.get(name) {
            return match tool.call(input).await {
                Ok(blocks) => blocks,
                Err(err) => vec![ContentBlock::text(err.as_result_text())],
            };
        }
        if let Some(entry) = self.external.get(name) {
            return match entry.server.call_tool(name, input).await {
                Ok(blocks) => blocks,
                // External-tool errors surface the provider message verbatim.
                Err(err) => vec![ContentBlock::text(err.as_result_text())],
            };
        }
        vec![ContentBlock::text(
            ToolError::NotFound { name: name.to_string() }.as_result_text(),
        )]
    }

    /// An independent toolkit that shares this one's tool implementations
    /// but has its own registry, so registering additional tools on the
    /// copy does not affect the original (§4.5 "copy() returns an
    /// independent toolkit sharing underlying tool implementations").
    pub fn copy(&self) -> Self {
        let native = DashMap::new();
        for entry in self.native.iter() {
            native.insert(entry.key().clone(), entry.value().clone());
        }
        let external = DashMap::new();
        for entry in self.external.iter() {
            external.insert(entry.key().clone(), entry.value().clone());
        }
        Self {
            native: Arc::new(native),
            external: Arc::new(external),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn input_schema(&self) -> Value {
            Value::Object(Default::default())
        }
        async fn call(&self, input: &HashMap<String, Value>) -> Result<Vec<ContentBlock>, ToolError> {
            Ok(vec![ContentBlock::text(format!("{input:?}"))])
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "boom"
        }
        fn description(&self) -> &str {
            "always fails"
        }
        fn input_schema(&self) -> Value {
            Value::Object(Default::default())
        }
        async fn call(&self, _input: &HashMap<String, Value>) -> Result<Vec<ContentBlock>, ToolError> {
            Err(ToolError::Provider {
                name: "boom".into(),
                message: "kaboom".into(),
            })
        }
    }

    #[tokio::test]
    async fn unknown_tool_name_produces_error_text_not_a_panic() {
        let toolkit = Toolkit::new();
        let blocks = toolkit.execute("c1", "missing", &HashMap::new()).await;
        assert_eq!(blocks.len(), 1);
        assert!(matches!(&blocks[0], ContentBlock::Text { text } if text.contains("not found")));
    }

    #[tokio::test]
    async fn native_tool_error_never_crosses_boundary_as_err() {
        let toolkit = Toolkit::new();
        toolkit.register_native(Arc::new(FailingTool));
        let blocks = toolkit.execute("c1", "boom", &HashMap::new()).await;
        assert!(matches!(&blocks[0], ContentBlock::Text { text } if text.contains("kaboom")));
    }

    #[tokio::test]
    async fn copy_shares_implementations_but_has_independent_registry() {
        let toolkit = Toolkit::new();
        toolkit.register_native(Arc::new(EchoTool));
        let copy = toolkit.copy();
        copy.register_native(Arc::new(FailingTool));

        assert!(toolkit.execute("c1", "boom", &HashMap::new()).await[0] == ContentBlock::text("tool \"boom\" not found"));
        let echoed = copy.execute("c1", "echo", &HashMap::new()).await;
        assert!(matches!(&echoed[0], ContentBlock::Text { .. }));
    }

    struct MockExternalServer;

    #[async_trait]
    impl ExternalToolServer for MockExternalServer {
        async fn list_tools(&self) -> Result<Vec<ToolSchema>, ToolError> {
            Ok(vec![ToolSchema {
                name: "remoteLookup".into(),
                description: "looks something up on a remote server".into(),
                input_schema: serde_json::json!({"type": "object", "properties": {"q": {"type": "string"}}}),
            }])
        }

        async fn call_tool(&self, _name: &str, _args: &HashMap<String, Value>) -> Result<Vec<ContentBlock>, ToolError> {
            Ok(vec![ContentBlock::text("remote result")])
        }
    }

    #[tokio::test]
    async fn external_tool_schema_carries_the_real_description_and_input_schema() {
        let toolkit = Toolkit::new();
        toolkit.register_external(Arc::new(MockExternalServer)).await.unwrap();

        let schemas = toolkit.tool_schemas();
        let remote = schemas.iter().find(|s| s.name == "remoteLookup").unwrap();
        assert_eq!(remote.description, "looks something up on a remote server");
        assert_eq!(remote.input_schema["properties"]["q"]["type"], "string");

        let result = toolkit.execute("c1", "remoteLookup", &HashMap::new()).await;
        assert_eq!(result, vec![ContentBlock::text("remote result")]);
    }
}
