//! Per-user document store.
//!
//! Documents are opaque JSON strings keyed by user and key. Everything lives
//! in a [`DashMap`]; when a data directory is configured each user's
//! documents are also written to `<dir>/<user>.json` after every change and
//! read back on start.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub key: String,
    pub data: String,
    pub updated_at: DateTime<Utc>,
}

/// On-disk form of one user's documents.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserSnapshot {
    user_id: String,
    documents: Vec<DocumentRecord>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document data is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    users: DashMap<String, HashMap<String, DocumentRecord>>,
    data_dir: Option<PathBuf>,
}

impl DocumentStore {
    /// A store that keeps everything in memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store backed by snapshot files in `dir`, loading any that exist.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        let store = Self {
            users: DashMap::new(),
            data_dir: Some(dir.clone()),
        };

        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_snapshot(&path).await {
                Ok(snapshot) => {
                    let documents = snapshot
                        .documents
                        .into_iter()
                        .map(|record| (record.key.clone(), record))
                        .collect();
                    store.users.insert(snapshot.user_id, documents);
                }
                Err(e) => warn!("Skipping unreadable snapshot {}: {}", path.display(), e),
            }
        }
        info!(
            "Loaded documents for {} user(s) from {}",
            store.users.len(),
            dir.display()
        );
        Ok(store)
    }

    /// Keys stored for a user, sorted.
    pub fn list(&self, user: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .users
            .get(user)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn get(&self, user: &str, key: &str) -> Option<DocumentRecord> {
        self.users.get(user)?.get(key).cloned()
    }

    /// Store `data` under a key, replacing what was there. `data` must be
    /// JSON text.
    pub async fn put(&self, user: &str, key: &str, data: String) -> Result<DocumentRecord, StoreError> {
        serde_json::from_str::<serde::de::IgnoredAny>(&data)?;
        let record = DocumentRecord {
            key: key.to_string(),
            data,
            updated_at: Utc::now(),
        };
        self.users
            .entry(user.to_string())
            .or_default()
            .insert(key.to_string(), record.clone());
        debug!("Stored {}/{} ({} bytes)", user, key, record.data.len());
        self.persist(user).await?;
        Ok(record)
    }

    /// Remove a key. Returns whether it existed.
    pub async fn delete(&self, user: &str, key: &str) -> Result<bool, StoreError> {
        let removed = self
            .users
            .get_mut(user)
            .map(|mut docs| docs.remove(key).is_some())
            .unwrap_or(false);
        if removed {
            debug!("Deleted {}/{}", user, key);
            self.persist(user).await?;
        }
        Ok(removed)
    }

    async fn persist(&self, user: &str) -> Result<(), StoreError> {
        let Some(dir) = &self.data_dir else {
            return Ok(());
        };
        // Copy out so no map guard is held across the write
        let mut documents: Vec<DocumentRecord> = self
            .users
            .get(user)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        documents.sort_by(|a, b| a.key.cmp(&b.key));

        let path = snapshot_path(dir, user);
        if documents.is_empty() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            return Ok(());
        }

        let snapshot = UserSnapshot {
            user_id: user.to_string(),
            documents,
        };
        let json = serde_json::to_vec_pretty(&snapshot)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

async fn read_snapshot(path: &Path) -> Result<UserSnapshot, StoreError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Snapshot file for a user. Characters outside `[A-Za-z0-9_-]` are
/// percent-encoded so any user id maps to a distinct file name.
fn snapshot_path(dir: &Path, user: &str) -> PathBuf {
    let mut name = String::with_capacity(user.len() + 5);
    for byte in user.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => name.push(byte as char),
            _ => name.push_str(&format!("%{:02X}", byte)),
        }
    }
    name.push_str(".json");
    dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_list_delete() {
        let store = DocumentStore::new();
        assert!(store.list("alice").is_empty());

        store.put("alice", "b", "[]".into()).await.unwrap();
        let record = store.put("alice", "a", r#"{"x":1}"#.into()).await.unwrap();
        assert_eq!(store.get("alice", "a"), Some(record));
        assert_eq!(store.list("alice"), vec!["a", "b"]);
        assert!(store.list("bob").is_empty());
        assert!(store.get("bob", "a").is_none());

        assert!(store.delete("alice", "a").await.unwrap());
        assert!(!store.delete("alice", "a").await.unwrap());
        assert!(!store.delete("nobody", "a").await.unwrap());
        assert_eq!(store.list("alice"), vec!["b"]);
    }

    #[tokio::test]
    async fn test_rejects_invalid_json() {
        let store = DocumentStore::new();
        let err = store.put("alice", "k", "{not json".into()).await;
        assert!(matches!(err, Err(StoreError::InvalidJson(_))));
        assert!(store.get("alice", "k").is_none());
    }

    #[tokio::test]
    async fn test_overwrite_updates_timestamp() {
        let store = DocumentStore::new();
        let first = store.put("alice", "k", "1".into()).await.unwrap();
        let second = store.put("alice", "k", "2".into()).await.unwrap();
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(store.get("alice", "k").unwrap().data, "2");
    }

    #[tokio::test]
    async fn test_snapshots_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DocumentStore::open(dir.path()).await.unwrap();
            store.put("user/1", "k1", r#"{"nodes":[]}"#.into()).await.unwrap();
            store.put("user/1", "k2", "true".into()).await.unwrap();
            store.put("bob", "k", "0".into()).await.unwrap();
            store.delete("bob", "k").await.unwrap();
        }
        assert!(dir.path().join("user%2F1.json").exists());
        assert!(!dir.path().join("bob.json").exists());

        let store = DocumentStore::open(dir.path()).await.unwrap();
        assert_eq!(store.list("user/1"), vec!["k1", "k2"]);
        assert_eq!(store.get("user/1", "k1").unwrap().data, r#"{"nodes":[]}"#);
        assert!(store.list("bob").is_empty());
    }

    #[tokio::test]
    async fn test_open_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "nope").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let store = DocumentStore::open(dir.path()).await.unwrap();
        assert!(store.list("broken").is_empty());
    }
}
