use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A multimodal content source: either a remote URL or inline base64 data.
///
/// Serializers must treat [`MediaSource::Base64`] payloads opaquely; a
/// formatter that talks to a provider API accepting only path/URL
/// references may materialize the decoded bytes to a temporary file whose
/// extension is derived from `media_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaSource {
    Url { url: String },
    Base64 { media_type: String, data: String },
}

/// A tagged content block. `ToolUse`/`ToolResult` carry the tool-call
/// protocol; `Thinking` is never sent back to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: HashMap<String, Value>,
        content: String,
        #[serde(default)]
        metadata: HashMap<String, Value>,
    },
    ToolResult {
        id: String,
        name: String,
        output: Vec<ContentBlock>,
    },
    Image {
        source: MediaSource,
    },
    Audio {
        source: MediaSource,
    },
    Video {
        source: MediaSource,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn thinking(thinking: impl Into<String>) -> Self {
        ContentBlock::Thinking {
            thinking: thinking.into(),
        }
    }

    /// Build a `ToolResult` whose sole output is a text block — the shape
    /// every tool error takes (§4.5: native tool errors never cross the
    /// toolkit boundary as an `Err`, they become this).
    pub fn tool_error_result(id: impl Into<String>, name: impl Into<String>, message: impl Into<String>) -> Self {
        ContentBlock::ToolResult {
            id: id.into(),
            name: name.into(),
            output: vec![ContentBlock::text(message)],
        }
    }

    pub fn is_tool_use(&self) -> bool {
        matches!(self, ContentBlock::ToolUse { .. })
    }

    pub fn as_tool_use(&self) -> Option<(&str, &str)> {
        match self {
            ContentBlock::ToolUse { id, name, .. } => Some((id, name)),
            _ => None,
        }
    }
}
