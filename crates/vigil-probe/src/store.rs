//! Durable per-domain state storage.
//!
//! The store is a plain get/put keyed by `"dns:" + domain`; no cross-domain
//! locking is needed because each key is touched by at most one in-flight
//! check.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use vigil_core::{DomainState, Result, VigilError};

/// Store key for a domain's state record
#[must_use]
pub fn state_key(domain: &str) -> String {
    format!("dns:{domain}")
}

/// Get/put of one [`DomainState`] per key
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Fetch the state stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<DomainState>>;

    /// Write the state under `key`, replacing any previous value
    async fn put(&self, key: &str, state: &DomainState) -> Result<()>;
}

/// File-backed store: one JSON document per key under a state directory
#[derive(Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`; the directory is created on first
    /// write
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Keys contain `:` which some filesystems reject, so the on-disk name
    /// replaces everything outside `[A-Za-z0-9._-]` with `_`
    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl StateStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<DomainState>> {
        let path = self.path_for(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(VigilError::Store(format!(
                    "read {}: {e}",
                    path.display()
                )))
            }
        };
        let state = serde_json::from_str(&content)
            .map_err(|e| VigilError::Store(format!("parse {}: {e}", path.display())))?;
        Ok(Some(state))
    }

    async fn put(&self, key: &str, state: &DomainState) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| VigilError::Store(format!("create {}: {e}", self.dir.display())))?;
        let path = self.path_for(key);
        let json = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| VigilError::Store(format!("write {}: {e}", path.display())))?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral runs
#[derive(Clone, Default)]
pub struct MemoryStore {
    map: Arc<RwLock<HashMap<String, DomainState>>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<DomainState>> {
        Ok(self.map.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, state: &DomainState) -> Result<()> {
        self.map.write().await.insert(key.to_string(), state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::DomainStatus;

    fn sample_state() -> DomainState {
        let mut state = DomainState::uninitialized();
        state.status = DomainStatus::Resolved;
        state.set_ips(vec!["9.9.9.9".parse().unwrap()]);
        state.serial = Some("100".into());
        state
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let key = state_key("example.com");

        assert!(store.get(&key).await.unwrap().is_none());

        let state = sample_state();
        store.put(&key, &state).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.put("dns:sub.example.com", &sample_state()).await.unwrap();
        assert!(dir.path().join("dns_sub.example.com.json").exists());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_record_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::write(dir.path().join("dns_example.com.json"), "{ nope").unwrap();

        let err = store.get("dns:example.com").await.unwrap_err();
        assert!(matches!(err, VigilError::Store(_)));
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let key = state_key("example.com");

        assert!(store.get(&key).await.unwrap().is_none());
        let state = sample_state();
        store.put(&key, &state).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(state));
    }
}
