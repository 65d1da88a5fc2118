//! The user-input provider (§6): a consumed interface for agents that
//! pause mid-turn to ask a human (or another system) a question.

use async_trait::async_trait;

use crate::message::{ContentBlock, Message};

/// What a user-input provider returns: freeform blocks, and optionally a
/// structured payload tagged by the model's requested schema name.
#[derive(Debug, Clone, Default)]
pub struct UserInputData {
    pub blocks: Vec<ContentBlock>,
    pub structured: Option<serde_json::Value>,
}

/// Blocking operations must run on a background scheduler; the core only
/// observes completion — no provider implementation here blocks the
/// runtime's worker threads.
#[async_trait]
pub trait UserInputProvider: Send + Sync {
    async fn handle_input(
        &self,
        agent_id: &str,
        agent_name: &str,
        context_messages: &[Message],
        structured_model_tag: Option<&str>,
    ) -> Result<UserInputData, crate::error::AgentError>;
}

/// A provider that always returns a fixed response — explicit dependency
/// injection at agent construction rather than a process-wide mutable
/// default (§9).
pub struct FixedUserInputProvider {
    response: String,
}

impl FixedUserInputProvider {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl UserInputProvider for FixedUserInputProvider {
    async fn handle_input(
        &self,
        _agent_id: &str,
        _agent_name: &str,
        _context_messages: &[Message],
        _structured_model_tag: Option<&str>,
    ) -> Result<UserInputData, crate::error::AgentError> {
        Ok(UserInputData {
            blocks: vec![ContentBlock::text(self.response.clone())],
            structured: None,
        })
    }
}
