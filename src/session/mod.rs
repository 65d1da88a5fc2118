//! Key-scoped persistence (§4.8): save/load of single values and lists,
//! with append-oriented stores deciding internally whether to append or
//! rewrite via [`hash::compute_list_hash`].

mod append_store;
mod hash;
mod memory_store;

pub use append_store::AppendOnlySessionStore;
pub use hash::compute_list_hash;
pub use memory_store::InMemorySessionStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PersistenceError;

/// An opaque, non-blank session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Result<Self, crate::error::AgentError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(crate::error::AgentError::InvalidArgument(
                "session key must not be blank".into(),
            ));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The key-scoped store contract (§4.8). Implementations: an in-memory map
/// ([`InMemorySessionStore`]) and an append-oriented on-disk store
/// ([`AppendOnlySessionStore`]).
#[async_trait]
pub trait Session: Send + Sync {
    async fn save(&self, key: &SessionKey, component_key: &str, value: Value) -> Result<(), PersistenceError>;

    async fn get(&self, key: &SessionKey, component_key: &str) -> Result<Option<Value>, PersistenceError>;

    /// The caller always passes the full list; the store decides
    /// internally whether to append or rewrite on disk.
    async fn save_list(&self, key: &SessionKey, component_key: &str, list: Vec<Value>) -> Result<(), PersistenceError>;

    /// Never returns a missing list as an error — an absent key yields an
    /// empty `Vec`.
    async fn get_list(&self, key: &SessionKey, component_key: &str) -> Result<Vec<Value>, PersistenceError>;

    async fn exists(&self, key: &SessionKey, component_key: &str) -> Result<bool, PersistenceError>;

    async fn delete(&self, key: &SessionKey, component_key: &str) -> Result<(), PersistenceError>;

    async fn list_session_keys(&self) -> Result<Vec<SessionKey>, PersistenceError>;

    async fn close(&self) -> Result<(), PersistenceError>;
}

/// Convenience helpers for saving/loading a typed `Vec<T>` (e.g. `Message`)
/// through a `Session`'s JSON-valued list storage.
pub mod typed_list {
    use serde::{Serialize, de::DeserializeOwned};

    use super::*;

    pub async fn save<T: Serialize + Sync>(
        session: &dyn Session,
        key: &SessionKey,
        component_key: &str,
        items: &[T],
    ) -> Result<(), PersistenceError> {
        let values = items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        session.save_list(key, component_key, values).await
    }

    pub async fn load<T: DeserializeOwned>(
        session: &dyn Session,
        key: &SessionKey,
        component_key: &str,
    ) -> Result<Vec<T>, PersistenceError> {
        let values = session.get_list(key, component_key).await?;
        values
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PersistenceError::from)
    }
}
