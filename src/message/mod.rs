//! The tagged content-block message model (§3, §4.9).

mod block;
mod usage;

pub use block::{ContentBlock, MediaSource};
pub use usage::ChatUsage;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Well-known metadata keys. Stored as plain strings so a `Message`'s
/// metadata map stays a simple `HashMap<String, Value>` rather than an enum
/// keyed type, matching how the rest of the block model is shaped.
pub mod metadata_keys {
    pub const CHAT_USAGE: &str = "chat_usage";
    pub const STRUCTURED_OUTPUT: &str = "structured_output";
    pub const BYPASS_MULTIAGENT_HISTORY_MERGE: &str = "bypass_multiagent_history_merge";
    pub const THOUGHT_SIGNATURE: &str = "thought_signature";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

/// One logical turn's worth of content. Multiple streamed chunks for the
/// same turn share an `id`; `TOOL` messages contain only `ToolResult`
/// blocks; `ASSISTANT` messages may mix `Text`, `Thinking`, and `ToolUse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub name: Option<String>,
    pub role: Role,
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Message {
    pub fn new(id: impl Into<String>, role: Role, content: Vec<ContentBlock>) -> Self {
        Self {
            id: id.into(),
            name: None,
            role,
            content,
            metadata: HashMap::new(),
        }
    }

    /// Build a new message with a freshly generated turn id.
    pub fn with_new_id(role: Role, content: Vec<ContentBlock>) -> Self {
        Self::new(Uuid::new_v4().to_string(), role, content)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::with_new_id(Role::User, vec![ContentBlock::text(text)])
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::with_new_id(Role::System, vec![ContentBlock::text(text)])
    }

    /// A TOOL-role message carrying the given result blocks, preserving
    /// the calling turn's id so consumers can correlate it back.
    pub fn tool_results(turn_id: impl Into<String>, results: Vec<ContentBlock>) -> Self {
        debug_assert!(
            results.iter().all(|b| matches!(b, ContentBlock::ToolResult { .. })),
            "TOOL role messages must contain only ToolResult blocks"
        );
        Self::new(turn_id, Role::Tool, results)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// All `ToolUse` blocks in this message, in insertion order.
    pub fn tool_uses(&self) -> impl Iterator<Item = &ContentBlock> {
        self.content.iter().filter(|b| b.is_tool_use())
    }

    pub fn has_tool_uses(&self) -> bool {
        self.content.iter().any(ContentBlock::is_tool_use)
    }

    /// Concatenation of every `Text` block's text, in order. Used by
    /// scenario tests that assert on the fully reassembled text of a turn.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_message_role_invariant_holds_for_constructor() {
        let msg = Message::tool_results(
            "turn-1",
            vec![ContentBlock::tool_error_result("c1", "weather", "boom")],
        );
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.id, "turn-1");
    }

    #[test]
    fn text_concatenates_only_text_blocks_in_order() {
        let msg = Message::new(
            "m1",
            Role::Assistant,
            vec![
                ContentBlock::thinking("ignored"),
                ContentBlock::text("Hel"),
                ContentBlock::text("lo"),
            ],
        );
        assert_eq!(msg.text(), "Hello");
    }
}
