//! The prioritized hook chain (§4.3): composable interception of lifecycle
//! events with `stopAgent` short-circuit.
//!
//! Modeled after the teacher's `NodeMiddleware::around_run` shape — an
//! async-trait method taking the event by value and returning it, so a hook
//! can mutate in place and the loop doesn't need a separate "did you change
//! this" signal.

use async_trait::async_trait;

use crate::message::Message;

/// Lifecycle events a hook may observe. `PreCall`/`PreReasoning` carry a
/// mutable message list; `PostReasoning` carries the `stop` flag the loop
/// inspects after the hook returns.
#[derive(Debug, Clone)]
pub enum HookEvent {
    PreCall { input_messages: Vec<Message> },
    /// `all_messages` is the full transcript as of this call's end, so a
    /// hook that records to long-term memory doesn't need its own handle
    /// onto the agent's memory store.
    PostCall { output_message: Message, all_messages: Vec<Message> },
    PreReasoning { input_messages: Vec<Message> },
    PostReasoning { reasoning_message: Message, stop: bool },
}

impl HookEvent {
    /// Request that the ReAct loop treat the current reasoning step as
    /// terminal. Only meaningful on `PostReasoning`; a no-op otherwise.
    pub fn stop_agent(&mut self) {
        if let HookEvent::PostReasoning { stop, .. } = self {
            *stop = true;
        }
    }

    pub fn should_stop(&self) -> bool {
        matches!(self, HookEvent::PostReasoning { stop: true, .. })
    }

    pub fn input_messages_mut(&mut self) -> Option<&mut Vec<Message>> {
        match self {
            HookEvent::PreCall { input_messages } | HookEvent::PreReasoning { input_messages } => {
                Some(input_messages)
            }
            _ => None,
        }
    }
}

/// One hook in the chain. `priority` lower runs earlier; ties keep
/// insertion order, enforced by [`HookChain::register`] using a stable
/// sort.
#[async_trait]
pub trait Hook: Send + Sync {
    fn priority(&self) -> i32;

    /// Observe (and possibly mutate) the event. A hook that fails
    /// terminates the event stream — hook errors are never swallowed
    /// (§7), unlike tool errors.
    async fn on_event(&self, event: HookEvent) -> Result<HookEvent, crate::error::AgentError>;
}

/// A prioritized, ordered collection of hooks, dispatched sequentially.
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Box<dyn Hook>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook and re-sorts by ascending priority. `Vec::sort_by_key`
    /// is stable, so hooks with equal priority keep their relative
    /// insertion order — the property §8.16 tests for.
    pub fn register(&mut self, hook: Box<dyn Hook>) {
        self.hooks.push(hook);
        self.hooks.sort_by_key(|h| h.priority());
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run the full chain over one event, in priority order. Each hook
    /// receives the (possibly already mutated) output of the previous one.
    pub async fn dispatch(&self, mut event: HookEvent) -> Result<HookEvent, crate::error::AgentError> {
        for hook in &self.hooks {
            event = hook.on_event(event).await?;
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingHook {
        priority: i32,
        label: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Hook for RecordingHook {
        fn priority(&self) -> i32 {
            self.priority
        }

        async fn on_event(&self, event: HookEvent) -> Result<HookEvent, crate::error::AgentError> {
            self.order.lock().unwrap().push(self.label);
            Ok(event)
        }
    }

    #[tokio::test]
    async fn hooks_run_in_ascending_priority_with_stable_ties() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut chain = HookChain::new();
        // Insertion order A, B, C, D with priorities 100, 50, 50, 10.
        chain.register(Box::new(RecordingHook { priority: 100, label: "A", order: order.clone() }));
        chain.register(Box::new(RecordingHook { priority: 50, label: "B", order: order.clone() }));
        chain.register(Box::new(RecordingHook { priority: 50, label: "C", order: order.clone() }));
        chain.register(Box::new(RecordingHook { priority: 10, label: "D", order: order.clone() }));

        chain
            .dispatch(HookEvent::PreCall { input_messages: vec![] })
            .await
            .unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["D", "B", "C", "A"]);
    }

    struct PrependingHook;

    #[async_trait]
    impl Hook for PrependingHook {
        fn priority(&self) -> i32 {
            0
        }

        async fn on_event(&self, mut event: HookEvent) -> Result<HookEvent, crate::error::AgentError> {
            if let Some(msgs) = event.input_messages_mut() {
                msgs.insert(0, Message::system("injected"));
            }
            Ok(event)
        }
    }

    struct AssertingHook {
        seen_len: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl Hook for AssertingHook {
        fn priority(&self) -> i32 {
            1
        }

        async fn on_event(&self, event: HookEvent) -> Result<HookEvent, crate::error::AgentError> {
            if let HookEvent::PreCall { ref input_messages } = event {
                *self.seen_len.lock().unwrap() = input_messages.len();
            }
            Ok(event)
        }
    }

    #[tokio::test]
    async fn mutating_precall_input_is_observed_by_later_hooks() {
        let seen_len = Arc::new(Mutex::new(0));
        let mut chain = HookChain::new();
        chain.register(Box::new(PrependingHook));
        chain.register(Box::new(AssertingHook { seen_len: seen_len.clone() }));

        chain
            .dispatch(HookEvent::PreCall { input_messages: vec![Message::user("hi")] })
            .await
            .unwrap();

        assert_eq!(*seen_len.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn stop_agent_on_post_reasoning_is_observable_after_dispatch() {
        struct StoppingHook;
        #[async_trait]
        impl Hook for StoppingHook {
            fn priority(&self) -> i32 {
                0
            }
            async fn on_event(&self, mut event: HookEvent) -> Result<HookEvent, crate::error::AgentError> {
                event.stop_agent();
                Ok(event)
            }
        }

        let mut chain = HookChain::new();
        chain.register(Box::new(StoppingHook));
        let result = chain
            .dispatch(HookEvent::PostReasoning {
                reasoning_message: Message::user("x"),
                stop: false,
            })
            .await
            .unwrap();
        assert!(result.should_stop());
    }
}
