//! The model provider and formatter interfaces the core consumes (§6).
//!
//! No concrete provider adapter lives here — only the trait boundary and a
//! mock used by tests and as a safe default, mirroring the teacher's own
//! "resolve to a mock when unset" pattern for optional collaborators.

use async_trait::async_trait;
use tokio_stream::Stream;
use std::collections::VecDeque;
use std::pin::Pin;
use tokio::sync::Mutex;

use crate::message::{ChatUsage, ContentBlock, Message};

/// One chunk of a streamed model response. Providers must chunk the same
/// `id` consistently across a single turn so the accumulator can coalesce.
#[derive(Debug, Clone, Default)]
pub struct ChatResponseChunk {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub usage: Option<ChatUsage>,
}

/// Whether, and how, the model may be required to call a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolChoiceMode {
    #[default]
    Auto,
    None,
    Required,
}

impl std::str::FromStr for ToolChoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            other => Err(format!("unknown tool choice mode: {other}")),
        }
    }
}

/// A tool schema as advertised to the model (name + description + a JSON
/// Schema for its parameters).
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Per-call options a model request may carry (temperature, max tokens,
/// etc are left to the concrete provider's own request builder — this
/// core only needs the tool-choice knob, since it gates the ReAct loop's
/// decision step).
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub tool_choice: ToolChoiceMode,
}

pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatResponseChunk, crate::error::AgentError>> + Send>>;

/// The model provider interface the ReAct loop drives (§6).
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        tools: &[ToolSchema],
    ) -> Result<ChatStream, crate::error::AgentError>;
}

/// Translates between the core's message model and a specific provider's
/// wire format. Out of scope as a concrete implementation (§1); the core
/// only needs the boundary so a reasoning step can format its request and
/// parse (or, for streaming, pre-parse into [`ChatResponseChunk`]s) the
/// response.
pub trait Formatter: Send + Sync {
    type Request;
    type Response;

    /// Strips `Thinking` blocks — they are never sent back to a model.
    fn format(&self, messages: &[Message]) -> Self::Request;

    fn parse_response(&self, response: Self::Response, start_time: std::time::Instant) -> ChatResponseChunk;

    /// Applies non-tool-related per-call options (e.g. temperature, max
    /// tokens) to a request builder. A pure mutation — no return value.
    fn apply_options(&self, request: &mut Self::Request, options: &ChatOptions);

    /// Applies the advertised tool schemas to a request builder.
    fn apply_tools(&self, request: &mut Self::Request, tools: &[ToolSchema]);

    /// Applies the tool-choice mode to a request builder.
    fn apply_tool_choice(&self, request: &mut Self::Request, tool_choice: ToolChoiceMode);
}

/// Strips every `Thinking` block from a message list, in place order,
/// without mutating the originals. Shared by any `Formatter` impl since
/// the rule (§6) is universal, not provider-specific.
pub fn strip_thinking_blocks(messages: &[Message]) -> Vec<Message> {
    messages
        .iter()
        .map(|m| {
            let mut m = m.clone();
            m.content.retain(|b| !matches!(b, ContentBlock::Thinking { .. }));
            m
        })
        .collect()
}

/// A model provider driven by a fixed script of chunk sequences, one
/// sequence consumed per `chat` call. Mirrors the teacher's own pattern of
/// defaulting an unset `AgentOptions::llm` to a scripted mock rather than
/// leaving a collaborator genuinely optional at the trait-object boundary.
pub struct MockModelProvider {
    scripts: Mutex<VecDeque<Vec<ChatResponseChunk>>>,
}

impl MockModelProvider {
    /// Each inner `Vec` is the full chunk sequence for one `chat` call;
    /// calls beyond the scripted count yield an empty stream.
    pub fn new(scripts: Vec<Vec<ChatResponseChunk>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
        }
    }

    /// A single scripted call that streams `text` as one chunk and nothing
    /// else — the common case for tests that don't care about chunking.
    pub fn single_text_reply(message_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(vec![vec![ChatResponseChunk {
            id: message_id.into(),
            content: vec![ContentBlock::text(text)],
            usage: None,
        }]])
    }
}

#[async_trait]
impl ModelProvider for MockModelProvider {
    async fn chat(
        &self,
        _messages: &[Message],
        _options: &ChatOptions,
        _tools: &[ToolSchema],
    ) -> Result<ChatStream, crate::error::AgentError> {
        let script = self.scripts.lock().await.pop_front().unwrap_or_default();
        Ok(Box::pin(tokio_stream::iter(script.into_iter().map(Ok))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn strip_thinking_blocks_removes_only_thinking() {
        let msg = Message::new(
            "m1",
            Role::Assistant,
            vec![ContentBlock::thinking("internal"), ContentBlock::text("hi")],
        );
        let stripped = strip_thinking_blocks(std::slice::from_ref(&msg));
        assert_eq!(stripped[0].content, vec![ContentBlock::text("hi")]);
    }

    #[test]
    fn tool_choice_mode_parses_case_insensitively() {
        use std::str::FromStr;
        assert_eq!(ToolChoiceMode::from_str("REQUIRED").unwrap(), ToolChoiceMode::Required);
        assert!(ToolChoiceMode::from_str("bogus").is_err());
    }

    #[tokio::test]
    async fn mock_provider_consumes_one_script_per_call_then_streams_empty() {
        use tokio_stream::StreamExt;

        let provider = MockModelProvider::single_text_reply("m1", "hi");
        let mut stream = provider.chat(&[], &ChatOptions::default(), &[]).await.unwrap();
        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.content, vec![ContentBlock::text("hi")]);
        assert!(stream.next().await.is_none());

        let mut second = provider.chat(&[], &ChatOptions::default(), &[]).await.unwrap();
        assert!(second.next().await.is_none());
    }
}
