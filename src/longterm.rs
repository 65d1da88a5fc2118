//! Long-term memory (§6): a consumed interface, with framework-driven
//! modes that decide how retrieval and recording attach to the ReAct loop.
//! The Mem0 backend itself is out of scope — only the boundary and a mock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;
use crate::hooks::{Hook, HookEvent};
use crate::message::{ContentBlock, Message};
use crate::toolkit::Tool;

/// How a registered long-term memory participates in a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongTermMemoryMode {
    /// Expose `record`/`retrieve` as tools so the model decides when to use
    /// them.
    AgentControl,
    /// A priority-50 hook injects retrieval output as a SYSTEM message
    /// before reasoning, and records all messages after each call.
    StaticControl,
    Both,
}

impl std::str::FromStr for LongTermMemoryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AGENT_CONTROL" => Ok(Self::AgentControl),
            "STATIC_CONTROL" => Ok(Self::StaticControl),
            "BOTH" => Ok(Self::Both),
            other => Err(format!("unknown long-term memory mode: {other}")),
        }
    }
}

/// The consumed long-term memory interface.
#[async_trait]
pub trait LongTermMemory: Send + Sync {
    async fn record(&self, messages: &[Message]) -> Result<(), String>;
    async fn retrieve(&self, query: &str) -> Result<String, String>;
}

pub const RETRIEVAL_TAG_OPEN: &str = "<long_term_memory>";
pub const RETRIEVAL_TAG_CLOSE: &str = "</long_term_memory>";

pub fn wrap_retrieval(text: &str) -> String {
    format!("{RETRIEVAL_TAG_OPEN}{text}{RETRIEVAL_TAG_CLOSE}")
}

/// STATIC_CONTROL's priority-50 hook: injects retrieval output as a SYSTEM
/// message before reasoning and records all messages after each call.
/// Failures in either direction are logged and swallowed — never fail the
/// agent call (§6).
pub struct StaticControlHook {
    memory: Arc<dyn LongTermMemory>,
    query: String,
}

impl StaticControlHook {
    pub fn new(memory: Arc<dyn LongTermMemory>, query: impl Into<String>) -> Self {
        Self {
            memory,
            query: query.into(),
        }
    }
}

#[async_trait]
impl Hook for StaticControlHook {
    fn priority(&self) -> i32 {
        50
    }

    async fn on_event(&self, mut event: HookEvent) -> Result<HookEvent, crate::error::AgentError> {
        match &mut event {
            HookEvent::PreReasoning { input_messages } => {
                match self.memory.retrieve(&self.query).await {
                    Ok(text) if !text.is_empty() => {
                        input_messages.insert(0, Message::system(wrap_retrieval(&text)));
                    }
                    Ok(_) => {}
                    Err(err) => tracing::warn!(error = %err, "long-term memory retrieval failed"),
                }
            }
            HookEvent::PostCall { all_messages, .. } => {
                if let Err(err) = self.memory.record(all_messages).await {
                    tracing::warn!(error = %err, "long-term memory record failed");
                }
            }
            _ => {}
        }
        Ok(event)
    }
}

const RECORD_TOOL_NAME: &str = "ltm_record";
const RETRIEVE_TOOL_NAME: &str = "ltm_retrieve";

/// AGENT_CONTROL's `record` tool: lets the model decide when to write to
/// long-term memory instead of a hook doing it unconditionally.
struct RecordTool {
    memory: Arc<dyn LongTermMemory>,
}

#[async_trait]
impl Tool for RecordTool {
    fn name(&self) -> &str {
        RECORD_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Records the given text to long-term memory for later retrieval."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"],
        })
    }

    async fn call(&self, input: &HashMap<String, Value>) -> Result<Vec<ContentBlock>, ToolError> {
        let text = input
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidInput {
                name: RECORD_TOOL_NAME.into(),
                message: "missing \"text\"".into(),
            })?;
        self.memory
            .record(std::slice::from_ref(&Message::user(text)))
            .await
            .map_err(|message| ToolError::Provider {
                name: RECORD_TOOL_NAME.into(),
                message,
            })?;
        Ok(vec![ContentBlock::text("recorded")])
    }
}

/// AGENT_CONTROL's `retrieve` tool: the model supplies its own query rather
/// than the fixed one [`StaticControlHook`] uses.
struct RetrieveTool {
    memory: Arc<dyn LongTermMemory>,
}

#[async_trait]
impl Tool for RetrieveTool {
    fn name(&self) -> &str {
        RETRIEVE_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Retrieves long-term memory relevant to the given query."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"],
        })
    }

    async fn call(&self, input: &HashMap<String, Value>) -> Result<Vec<ContentBlock>, ToolError> {
        let query = input.get("query").and_then(Value::as_str).unwrap_or_default();
        let text = self
            .memory
            .retrieve(query)
            .await
            .map_err(|message| ToolError::Provider {
                name: RETRIEVE_TOOL_NAME.into(),
                message,
            })?;
        Ok(vec![ContentBlock::text(wrap_retrieval(&text))])
    }
}

/// The two tools AGENT_CONTROL/BOTH register so the model can decide when to
/// record or retrieve long-term memory, rather than a hook doing it for it.
pub fn agent_control_tools(memory: Arc<dyn LongTermMemory>) -> [Arc<dyn Tool>; 2] {
    [
        Arc::new(RecordTool { memory: memory.clone() }),
        Arc::new(RetrieveTool { memory }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookEvent;

    struct MockLongTermMemory {
        retrieval: &'static str,
    }

    #[async_trait]
    impl LongTermMemory for MockLongTermMemory {
        async fn record(&self, _messages: &[Message]) -> Result<(), String> {
            Ok(())
        }
        async fn retrieve(&self, _query: &str) -> Result<String, String> {
            Ok(self.retrieval.to_string())
        }
    }

    struct FailingLongTermMemory;

    #[async_trait]
    impl LongTermMemory for FailingLongTermMemory {
        async fn record(&self, _messages: &[Message]) -> Result<(), String> {
            Err("boom".into())
        }
        async fn retrieve(&self, _query: &str) -> Result<String, String> {
            Err("boom".into())
        }
    }

    #[tokio::test]
    async fn static_control_hook_injects_wrapped_retrieval_as_system_message() {
        let hook = StaticControlHook::new(Arc::new(MockLongTermMemory { retrieval: "fact" }), "q");
        let event = HookEvent::PreReasoning {
            input_messages: vec![Message::user("hi")],
        };
        let result = hook.on_event(event).await.unwrap();
        if let HookEvent::PreReasoning { input_messages } = result {
            assert_eq!(input_messages.len(), 2);
            assert_eq!(input_messages[0].text(), wrap_retrieval("fact"));
        } else {
            panic!("expected PreReasoning");
        }
    }

    #[tokio::test]
    async fn retrieval_failure_is_swallowed_not_propagated() {
        let hook = StaticControlHook::new(Arc::new(FailingLongTermMemory), "q");
        let event = HookEvent::PreReasoning {
            input_messages: vec![Message::user("hi")],
        };
        let result = hook.on_event(event).await;
        assert!(result.is_ok());
    }

    struct RecordingLongTermMemory {
        recorded: tokio::sync::Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl LongTermMemory for RecordingLongTermMemory {
        async fn record(&self, messages: &[Message]) -> Result<(), String> {
            self.recorded.lock().await.push(messages.len());
            Ok(())
        }
        async fn retrieve(&self, _query: &str) -> Result<String, String> {
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn static_control_hook_records_the_full_transcript_on_post_call() {
        let memory = Arc::new(RecordingLongTermMemory {
            recorded: tokio::sync::Mutex::new(Vec::new()),
        });
        let hook = StaticControlHook::new(memory.clone(), "q");
        let event = HookEvent::PostCall {
            output_message: Message::user("reply"),
            all_messages: vec![Message::user("hi"), Message::user("reply")],
        };
        hook.on_event(event).await.unwrap();
        assert_eq!(*memory.recorded.lock().await, vec![2]);
    }

    #[tokio::test]
    async fn record_failure_on_post_call_is_swallowed_not_propagated() {
        let hook = StaticControlHook::new(Arc::new(FailingLongTermMemory), "q");
        let event = HookEvent::PostCall {
            output_message: Message::user("reply"),
            all_messages: vec![Message::user("reply")],
        };
        assert!(hook.on_event(event).await.is_ok());
    }

    #[tokio::test]
    async fn agent_control_tools_record_and_retrieve_via_tool_call() {
        let memory = Arc::new(RecordingLongTermMemory {
            recorded: tokio::sync::Mutex::new(Vec::new()),
        });
        let [record, retrieve] = agent_control_tools(memory.clone());

        let mut input = HashMap::new();
        input.insert("text".to_string(), Value::String("remember this".into()));
        let result = record.call(&input).await.unwrap();
        assert_eq!(result, vec![ContentBlock::text("recorded")]);
        assert_eq!(*memory.recorded.lock().await, vec![1]);

        let mut input = HashMap::new();
        input.insert("query".to_string(), Value::String("anything".into()));
        let result = retrieve.call(&input).await.unwrap();
        assert_eq!(result, vec![ContentBlock::text(wrap_retrieval(""))]);
    }

    #[tokio::test]
    async fn long_term_memory_mode_parses_case_insensitively() {
        use std::str::FromStr;
        assert_eq!(LongTermMemoryMode::from_str("agent_control").unwrap(), LongTermMemoryMode::AgentControl);
        assert_eq!(LongTermMemoryMode::from_str("BOTH").unwrap(), LongTermMemoryMode::Both);
        assert!(LongTermMemoryMode::from_str("bogus").is_err());
    }
}
