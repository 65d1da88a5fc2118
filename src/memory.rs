//! In-process message log with session (re)hydration (§4.4).
//!
//! Grounded in the teacher's `InMemoryStore` (`Arc<RwLock<..>>` around a
//! plain collection); writes are single-threaded in practice (the agent
//! never calls itself concurrently once `checkRunning` holds), so a
//! `tokio::sync::RwLock` over a `Vec` is sufficient without a full
//! copy-on-write structure.

use tokio::sync::RwLock;

use crate::message::Message;
use crate::session::{Session, SessionKey, typed_list};

const MEMORY_MESSAGES_KEY: &str = "memory_messages";

/// The conversational message log for one agent/session.
#[derive(Debug, Default)]
pub struct Memory {
    messages: RwLock<Vec<Message>>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_message(&self, message: Message) {
        self.messages.write().await.push(message);
    }

    /// A snapshot of the current contents. Never returns a missing list —
    /// an empty memory yields an empty `Vec`.
    pub async fn get_messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    /// Out-of-range is a silent no-op, not an error.
    pub async fn delete_message(&self, index: usize) {
        let mut guard = self.messages.write().await;
        if index < guard.len() {
            guard.remove(index);
        }
    }

    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }

    /// Writes the full list under `"memory_messages"`. An empty list is
    /// saved too — a clear must persist.
    pub async fn save_to(&self, session: &dyn Session, key: &SessionKey) -> Result<(), crate::error::PersistenceError> {
        let snapshot = self.get_messages().await;
        typed_list::save(session, key, MEMORY_MESSAGES_KEY, &snapshot).await
    }

    /// Replaces in-memory contents with whatever is stored.
    pub async fn load_from(&self, session: &dyn Session, key: &SessionKey) -> Result<(), crate::error::PersistenceError> {
        let loaded: Vec<Message> = typed_list::load(session, key, MEMORY_MESSAGES_KEY).await?;
        *self.messages.write().await = loaded;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionStore;

    #[tokio::test]
    async fn delete_out_of_range_is_a_silent_noop() {
        let memory = Memory::new();
        memory.add_message(Message::user("hi")).await;
        memory.delete_message(5).await;
        assert_eq!(memory.get_messages().await.len(), 1);
    }

    #[tokio::test]
    async fn save_to_of_empty_memory_then_load_from_yields_empty_memory() {
        let store = InMemorySessionStore::new();
        let key = SessionKey::new("s1").unwrap();

        let memory = Memory::new();
        memory.save_to(&store, &key).await.unwrap();

        let reloaded = Memory::new();
        reloaded.add_message(Message::user("stale")).await;
        reloaded.load_from(&store, &key).await.unwrap();
        assert!(reloaded.get_messages().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips_messages() {
        let store = InMemorySessionStore::new();
        let key = SessionKey::new("s1").unwrap();

        let memory = Memory::new();
        memory.add_message(Message::user("hi")).await;
        memory.add_message(Message::user("there")).await;
        memory.save_to(&store, &key).await.unwrap();

        let reloaded = Memory::new();
        reloaded.load_from(&store, &key).await.unwrap();
        assert_eq!(reloaded.get_messages().await.len(), 2);
    }
}
