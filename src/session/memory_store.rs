use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::{Session, SessionKey};
use crate::error::PersistenceError;

type Namespaced = (String, String);

/// The simplest `Session` implementation: everything lives in a `DashMap`,
/// gone when the process exits. Used as the default in tests and anywhere
/// persistence across restarts isn't required.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    values: DashMap<Namespaced, Value>,
    lists: DashMap<Namespaced, Vec<Value>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ns(key: &SessionKey, component_key: &str) -> Namespaced {
        (key.as_str().to_string(), component_key.to_string())
    }
}

#[async_trait]
impl Session for InMemorySessionStore {
    async fn save(&self, key: &SessionKey, component_key: &str, value: Value) -> Result<(), PersistenceError> {
        self.values.insert(Self::ns(key, component_key), value);
        Ok(())
    }

    async fn get(&self, key: &SessionKey, component_key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.values.get(&Self::ns(key, component_key)).map(|v| v.clone()))
    }

    async fn save_list(&self, key: &SessionKey, component_key: &str, list: Vec<Value>) -> Result<(), PersistenceError> {
        self.lists.insert(Self::ns(key, component_key), list);
        Ok(())
    }

    async fn get_list(&self, key: &SessionKey, component_key: &str) -> Result<Vec<Value>, PersistenceError> {
        Ok(self.lists.get(&Self::ns(key, component_key)).map(|v| v.clone()).unwrap_or_default())
    }

    async fn exists(&self, key: &SessionKey, component_key: &str) -> Result<bool, PersistenceError> {
        let ns = Self::ns(key, component_key);
        Ok(self.values.contains_key(&ns) || self.lists.contains_key(&ns))
    }

    async fn delete(&self, key: &SessionKey, component_key: &str) -> Result<(), PersistenceError> {
        let ns = Self::ns(key, component_key);
        self.values.remove(&ns);
        self.lists.remove(&ns);
        Ok(())
    }

    async fn list_session_keys(&self) -> Result<Vec<SessionKey>, PersistenceError> {
        let mut keys: Vec<String> = self
            .values
            .iter()
            .map(|e| e.key().0.clone())
            .chain(self.lists.iter().map(|e| e.key().0.clone()))
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys.into_iter().map(SessionKey).collect())
    }

    async fn close(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}
