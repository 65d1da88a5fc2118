use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::hash::compute_list_hash;
use super::{Session, SessionKey};
use crate::error::PersistenceError;

type Namespaced = (String, String);

/// `(lastHash, storedCount)` for one `(sessionKey, componentKey)` list, per
/// §4.8. Lazily populated from whatever is already on disk the first time
/// a key is touched in this process — a file that doesn't exist yet is
/// `storedCount = 0`, matching the "absent prior state ⇒ append from
/// zero" decision.
#[derive(Debug, Clone)]
struct Tracking {
    last_hash: String,
    stored_count: usize,
}

/// An append-oriented on-disk session store. Single values are stored as
/// one JSON file each; lists are stored as JSON Lines so an append is a
/// cheap file-append rather than a rewrite of the whole list.
pub struct AppendOnlySessionStore {
    base_dir: PathBuf,
    tracking: DashMap<Namespaced, Tracking>,
}

impl AppendOnlySessionStore {
    pub async fn open(base_dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self {
            base_dir,
            tracking: DashMap::new(),
        })
    }

    fn ns(key: &SessionKey, component_key: &str) -> Namespaced {
        (key.as_str().to_string(), component_key.to_string())
    }

    fn value_path(&self, key: &SessionKey, component_key: &str) -> PathBuf {
        self.session_dir(key).join(format!("{component_key}.json"))
    }

    fn list_path(&self, key: &SessionKey, component_key: &str) -> PathBuf {
        self.session_dir(key).join(format!("{component_key}.jsonl"))
    }

    fn session_dir(&self, key: &SessionKey) -> PathBuf {
        self.base_dir.join(sanitize(key.as_str()))
    }

    async fn read_list(path: &Path) -> Result<Vec<Value>, PersistenceError> {
        if !fs::try_exists(path).await? {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(path).await?;
        contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(PersistenceError::from))
            .collect()
    }

    async fn write_full(path: &Path, list: &[Value]) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut out = String::new();
        for item in list {
            out.push_str(&serde_json::to_string(item)?);
            out.push('\n');
        }
        fs::write(path, out).await?;
        Ok(())
    }

    async fn append_suffix(path: &Path, suffix: &[Value]) -> Result<(), PersistenceError> {
        if suffix.is_empty() {
            return Ok(());
        }
        let mut file = fs::OpenOptions::new().append(true).create(true).open(path).await?;
        for item in suffix {
            file.write_all(serde_json::to_string(item)?.as_bytes()).await?;
            file.write_all(b"\n").await?;
        }
        Ok(())
    }

    async fn tracking_for(&self, ns: &Namespaced, path: &Path) -> Result<Tracking, PersistenceError> {
        if let Some(existing) = self.tracking.get(ns) {
            return Ok(existing.clone());
        }
        let existing_items = Self::read_list(path).await?;
        let tracking = Tracking {
            last_hash: compute_list_hash(&existing_items),
            stored_count: existing_items.len(),
        };
        self.tracking.insert(ns.clone(), tracking.clone());
        Ok(tracking)
    }
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[async_trait]
impl Session for AppendOnlySessionStore {
    async fn save(&self, key: &SessionKey, component_key: &str, value: Value) -> Result<(), PersistenceError> {
        let path = self.value_path(key, component_key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, serde_json::to_vec(&value)?).await?;
        Ok(())
    }

    async fn get(&self, key: &SessionKey, component_key: &str) -> Result<Option<Value>, PersistenceError> {
        let path = self.value_path(key, component_key);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        let contents = fs::read(&path).await?;
        Ok(Some(serde_json::from_slice(&contents)?))
    }

    /// §4.8's incremental-append contract: full rewrite when the hash of
    /// the previously stored prefix disagrees with what's recorded, or
    /// when the incoming list is shorter than what's stored; otherwise
    /// append only the new suffix.
    async fn save_list(&self, key: &SessionKey, component_key: &str, list: Vec<Value>) -> Result<(), PersistenceError> {
        let ns = Self::ns(key, component_key);
        let path = self.list_path(key, component_key);
        let tracking = self.tracking_for(&ns, &path).await?;

        let needs_rewrite = if list.len() < tracking.stored_count {
            true
        } else {
            let current_hash = compute_list_hash(&list[..tracking.stored_count]);
            current_hash != tracking.last_hash
        };

        if needs_rewrite {
            Self::write_full(&path, &list).await?;
        } else {
            Self::append_suffix(&path, &list[tracking.stored_count..]).await?;
        }

        self.tracking.insert(
            ns,
            Tracking {
                last_hash: compute_list_hash(&list),
                stored_count: list.len(),
            },
        );
        Ok(())
    }

    async fn get_list(&self, key: &SessionKey, component_key: &str) -> Result<Vec<Value>, PersistenceError> {
        Self::read_list(&self.list_path(key, component_key)).await
    }

    async fn exists(&self, key: &SessionKey, component_key: &str) -> Result<bool, PersistenceError> {
        Ok(fs::try_exists(self.value_path(key, component_key)).await?
            || fs::try_exists(self.list_path(key, component_key)).await?)
    }

    async fn delete(&self, key: &SessionKey, component_key: &str) -> Result<(), PersistenceError> {
        let _ = fs::remove_file(self.value_path(key, component_key)).await;
        let _ = fs::remove_file(self.list_path(key, component_key)).await;
        self.tracking.remove(&Self::ns(key, component_key));
        Ok(())
    }

    async fn list_session_keys(&self) -> Result<Vec<SessionKey>, PersistenceError> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    keys.push(SessionKey(name.to_string()));
                }
            }
        }
        Ok(keys)
    }

    async fn close(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn s5_append_preserves_hash_and_mutation_triggers_full_rewrite() {
        let dir = tempdir().unwrap();
        let store = AppendOnlySessionStore::open(dir.path()).await.unwrap();
        let key = SessionKey::new("s1").unwrap();

        store.save_list(&key, "messages", vec![json!("m1"), json!("m2")]).await.unwrap();
        store
            .save_list(&key, "messages", vec![json!("m1"), json!("m2"), json!("m3")])
            .await
            .unwrap();
        assert_eq!(
            store.get_list(&key, "messages").await.unwrap(),
            vec![json!("m1"), json!("m2"), json!("m3")]
        );

        // Mutate m2 in place and save again: hash of the old prefix now
        // disagrees, forcing a full rewrite rather than an append.
        store
            .save_list(&key, "messages", vec![json!("m1"), json!("m2-mutated"), json!("m3")])
            .await
            .unwrap();
        assert_eq!(
            store.get_list(&key, "messages").await.unwrap(),
            vec![json!("m1"), json!("m2-mutated"), json!("m3")]
        );
    }

    #[tokio::test]
    async fn fresh_process_reading_existing_file_initializes_tracking_from_disk() {
        let dir = tempdir().unwrap();
        {
            let store = AppendOnlySessionStore::open(dir.path()).await.unwrap();
            let key = SessionKey::new("s1").unwrap();
            store.save_list(&key, "messages", vec![json!("m1"), json!("m2")]).await.unwrap();
        }
        // Second store instance simulates a fresh process attaching to the
        // same on-disk state with no in-memory tracking.
        let store = AppendOnlySessionStore::open(dir.path()).await.unwrap();
        let key = SessionKey::new("s1").unwrap();
        store
            .save_list(&key, "messages", vec![json!("m1"), json!("m2"), json!("m3")])
            .await
            .unwrap();
        assert_eq!(
            store.get_list(&key, "messages").await.unwrap(),
            vec![json!("m1"), json!("m2"), json!("m3")]
        );
    }

    #[tokio::test]
    async fn get_list_on_missing_key_returns_empty() {
        let dir = tempdir().unwrap();
        let store = AppendOnlySessionStore::open(dir.path()).await.unwrap();
        let key = SessionKey::new("s1").unwrap();
        assert_eq!(store.get_list(&key, "missing").await.unwrap(), Vec::<Value>::new());
    }
}
