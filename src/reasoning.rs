//! Per-turn reasoning state (§3, §4.2): the accumulators, usage tracker, and
//! chunk journal owned by the agent for one reason→act cycle.

use crate::accumulator::{StringAccumulator, ToolCallFragment, ToolCallsAccumulator};
use crate::message::{ChatUsage, ContentBlock, Message, Role, metadata_keys};
use crate::model::ChatResponseChunk;

/// Created at the start of a reasoning step, mutated by [`Self::process_chunk`]
/// for every streamed chunk, consulted once by [`Self::build_final_message`],
/// then discarded.
#[derive(Debug, Default)]
pub struct ReasoningContext {
    agent_name: String,
    message_id: Option<String>,
    text_acc: StringAccumulator,
    thinking_acc: StringAccumulator,
    tool_calls_acc: ToolCallsAccumulator,
    chunk_journal: Vec<Message>,
    usage: ChatUsage,
}

impl ReasoningContext {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            ..Default::default()
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn chunk_journal(&self) -> &[Message] {
        &self.chunk_journal
    }

    /// Feed one streamed chunk through the context. Returns the chunk
    /// messages emitted for this chunk, in block order, which are also
    /// appended to the journal.
    pub fn process_chunk(&mut self, response: &ChatResponseChunk) -> Vec<Message> {
        self.message_id = Some(response.id.clone());
        if let Some(ref usage) = response.usage {
            self.usage.accumulate(usage);
        }

        let mut emitted = Vec::with_capacity(response.content.len());
        for block in &response.content {
            match block {
                ContentBlock::Text { text } => {
                    self.text_acc.add(text);
                    emitted.push(self.wrap_chunk(ContentBlock::text(text.clone())));
                }
                ContentBlock::Thinking { thinking } => {
                    self.thinking_acc.add(thinking);
                    emitted.push(self.wrap_chunk(ContentBlock::thinking(thinking.clone())));
                }
                ContentBlock::ToolUse {
                    id,
                    name,
                    input,
                    content,
                    metadata,
                } => {
                    let fragment = ToolCallFragment {
                        id: Some(id.clone()).filter(|s| !s.is_empty()),
                        name: Some(name.clone()).filter(|s| !s.is_empty()),
                        input: input.clone(),
                        raw_content: content.clone(),
                        metadata: metadata.clone(),
                    };
                    let key = self.tool_calls_acc.add(fragment);
                    let resolved_id = if id.is_empty() {
                        self.tool_calls_acc
                            .get_accumulated_tool_call(Some(&key))
                            .and_then(|b| b.as_tool_use().map(|(i, _)| i.to_string()))
                            .unwrap_or_else(|| id.clone())
                    } else {
                        id.clone()
                    };
                    emitted.push(self.wrap_chunk(ContentBlock::ToolUse {
                        id: resolved_id,
                        name: name.clone(),
                        input: input.clone(),
                        content: content.clone(),
                        metadata: metadata.clone(),
                    }));
                }
                // Multimodal chunks are not meaningful as streamed deltas in
                // this core; pass through unaccumulated.
                other => emitted.push(self.wrap_chunk(other.clone())),
            }
        }

        self.chunk_journal.extend(emitted.iter().cloned());
        emitted
    }

    fn wrap_chunk(&self, block: ContentBlock) -> Message {
        Message::new(
            self.message_id.clone().unwrap_or_default(),
            Role::Assistant,
            vec![block],
        )
    }

    /// Assembles the turn's single assistant message: thinking (if any),
    /// text (if any), then every tool call in insertion order. `None` iff
    /// no blocks were ever accumulated.
    pub fn build_final_message(&self) -> Option<Message> {
        let mut content = Vec::new();
        if let Some(block) = self.thinking_acc.build_thinking_block() {
            content.push(block);
        }
        if let Some(block) = self.text_acc.build_text_block() {
            content.push(block);
        }
        content.extend(self.tool_calls_acc.build_all());

        if content.is_empty() {
            return None;
        }

        let mut message = Message::new(
            self.message_id.clone().unwrap_or_default(),
            Role::Assistant,
            content,
        );
        if self.usage.is_positive() {
            message = message.with_metadata(
                metadata_keys::CHAT_USAGE,
                serde_json::to_value(self.usage).expect("ChatUsage always serializes"),
            );
        }
        Some(message)
    }

    pub fn usage(&self) -> ChatUsage {
        self.usage
    }

    /// The text accumulated so far this turn — used by cumulative-mode
    /// streaming to replace a chunk's delta with the running total (§4.7).
    pub fn current_text(&self) -> &str {
        self.text_acc.text()
    }

    pub fn current_thinking(&self) -> &str {
        self.thinking_acc.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_chunk(id: &str, text: &str) -> ChatResponseChunk {
        ChatResponseChunk {
            id: id.to_string(),
            content: vec![ContentBlock::text(text)],
            usage: None,
        }
    }

    #[test]
    fn s1_three_text_chunks_reassemble_with_matching_message_id() {
        let mut ctx = ReasoningContext::new("agent");
        let mut emitted = Vec::new();
        for frag in ["Hel", "lo", " world"] {
            emitted.extend(ctx.process_chunk(&text_chunk("m1", frag)));
        }
        assert_eq!(emitted.len(), 3);
        assert!(emitted.iter().all(|m| m.id == "m1"));

        let final_msg = ctx.build_final_message().unwrap();
        assert_eq!(final_msg.text(), "Hello world");
        assert_eq!(final_msg.id, "m1");
    }

    #[test]
    fn journal_length_matches_emitted_chunk_count_and_final_message_is_singular() {
        let mut ctx = ReasoningContext::new("agent");
        ctx.process_chunk(&text_chunk("m1", "a"));
        ctx.process_chunk(&text_chunk("m1", "b"));
        ctx.process_chunk(&text_chunk("m1", "c"));
        assert_eq!(ctx.chunk_journal().len(), 3);
        assert!(ctx.build_final_message().is_some());
    }

    #[test]
    fn mixed_text_and_tool_use_chunks_each_emit_independently() {
        let mut ctx = ReasoningContext::new("agent");
        ctx.process_chunk(&text_chunk("m1", "before "));
        ctx.process_chunk(&ChatResponseChunk {
            id: "m1".into(),
            content: vec![ContentBlock::ToolUse {
                id: "c1".into(),
                name: "weather".into(),
                input: Default::default(),
                content: "{}".into(),
                metadata: Default::default(),
            }],
            usage: None,
        });
        ctx.process_chunk(&text_chunk("m1", "after"));

        let final_msg = ctx.build_final_message().unwrap();
        assert_eq!(final_msg.text(), "before after");
        assert!(final_msg.has_tool_uses());
    }

    #[test]
    fn no_blocks_at_all_yields_no_final_message() {
        let ctx = ReasoningContext::new("agent");
        assert!(ctx.build_final_message().is_none());
    }

    #[test]
    fn empty_tool_use_id_is_enriched_from_the_accumulator_key() {
        let mut ctx = ReasoningContext::new("agent");
        let emitted = ctx.process_chunk(&ChatResponseChunk {
            id: "m1".into(),
            content: vec![ContentBlock::ToolUse {
                id: String::new(),
                name: "weather".into(),
                input: Default::default(),
                content: "{}".into(),
                metadata: Default::default(),
            }],
            usage: None,
        });
        let (id, name) = emitted[0].content[0].as_tool_use().unwrap();
        assert!(!id.is_empty());
        assert_eq!(name, "weather");
    }
}
