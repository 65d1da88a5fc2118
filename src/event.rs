//! The public event stream contract (§3, §4.7): the ordered, typed
//! sequence of events produced per agent call.

use serde::{Deserialize, Serialize};

use crate::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Reasoning,
    ToolResult,
    Hint,
    AgentResult,
    Summary,
    All,
}

/// One event on the public stream. `message_id` always equals `message.id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub message: Message,
    pub is_last: bool,
    pub message_id: String,
}

impl Event {
    pub fn new(event_type: EventType, message: Message, is_last: bool) -> Self {
        let message_id = message.id.clone();
        Self {
            event_type,
            message,
            is_last,
            message_id,
        }
    }

    pub fn reasoning(message: Message, is_last: bool) -> Self {
        Self::new(EventType::Reasoning, message, is_last)
    }

    pub fn tool_result(message: Message) -> Self {
        Self::new(EventType::ToolResult, message, true)
    }

    pub fn agent_result(message: Message) -> Self {
        Self::new(EventType::AgentResult, message, true)
    }
}

/// Whether REASONING chunks on the stream carry deltas or running totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamMode {
    #[default]
    Incremental,
    Cumulative,
}

/// A caller-supplied subset of event types to receive. `AGENT_RESULT` is
/// always emitted regardless of this filter (§4.7).
#[derive(Debug, Clone)]
pub struct EventFilter {
    types: Option<Vec<EventType>>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self { types: None }
    }

    pub fn only(types: Vec<EventType>) -> Self {
        if types.contains(&EventType::All) {
            return Self::all();
        }
        Self { types: Some(types) }
    }

    pub fn allows(&self, event_type: EventType) -> bool {
        if event_type == EventType::AgentResult {
            return true;
        }
        match &self.types {
            None => true,
            Some(types) => types.contains(&event_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn agent_result_always_passes_the_filter() {
        let filter = EventFilter::only(vec![EventType::Hint]);
        assert!(filter.allows(EventType::AgentResult));
        assert!(!filter.allows(EventType::Reasoning));
    }

    #[test]
    fn event_message_id_mirrors_the_message() {
        let msg = Message::new("m1", Role::Assistant, vec![]);
        let event = Event::reasoning(msg, false);
        assert_eq!(event.message_id, "m1");
    }
}
