//! In-memory storage backend.
//!
//! Stores all data in a `BTreeMap` behind a `RwLock`. Nothing is persisted;
//! all data is lost when the process exits. Used for `KAYDA_STORAGE=memory`
//! and for every unit and integration test.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{StorageBackend, StorageError, WriteOp};

/// An in-memory storage backend backed by a `BTreeMap`.
///
/// Data is sorted by key, which makes prefix listing a `BTreeMap::range`
/// scan. Batches are applied under a single write guard, so readers never
/// observe a half-applied batch.
///
/// # Examples
///
/// ```
/// # use kayda_storage::{MemoryBackend, StorageBackend, WriteOp};
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new();
/// backend.apply(vec![WriteOp::put("acts/1", b"{}".to_vec())]).await.unwrap();
/// let val = backend.get("acts/1").await.unwrap();
/// assert_eq!(val, Some(b"{}".to_vec()));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let data = self.data.read().await;
        let keys = data
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        Ok(keys)
    }

    async fn apply(&self, ops: Vec<WriteOp>) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        for op in ops {
            match op {
                WriteOp::Put { key, value } => {
                    data.insert(key, value);
                }
                WriteOp::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let data = self.data.read().await;
        Ok(data.contains_key(key))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn seeded(keys: &[&str]) -> MemoryBackend {
        let backend = MemoryBackend::new();
        let ops = keys.iter().map(|k| WriteOp::put(*k, b"{}".to_vec())).collect();
        backend.apply(ops).await.unwrap();
        backend
    }

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let backend = MemoryBackend::new();
        let result = backend.get("acts/missing").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn deleting_a_missing_key_is_a_noop() {
        let backend = seeded(&["acts/1"]).await;
        backend.apply(vec![WriteOp::delete("nope")]).await.unwrap();
        assert!(backend.exists("acts/1").await.unwrap());
    }

    #[tokio::test]
    async fn list_with_prefix() {
        let backend = seeded(&[
            "idx/act-sections/a/1",
            "idx/act-sections/a/2",
            "idx/act-sections/b/3",
            "sections/1",
        ])
        .await;

        let keys = backend.list("idx/act-sections/a/").await.unwrap();
        assert_eq!(keys, vec!["idx/act-sections/a/1", "idx/act-sections/a/2"]);
    }

    #[tokio::test]
    async fn list_no_matches_returns_empty() {
        let backend = seeded(&["accounts/a@b.c"]).await;
        let keys = backend.list("acts/").await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn apply_puts_and_deletes_together() {
        let backend = seeded(&["sections/old"]).await;

        backend
            .apply(vec![
                WriteOp::put("acts/1", b"act".to_vec()),
                WriteOp::delete("sections/old"),
                WriteOp::put("idx/act-sections/1/2", Vec::new()),
            ])
            .await
            .unwrap();

        assert_eq!(backend.get("acts/1").await.unwrap(), Some(b"act".to_vec()));
        assert!(!backend.exists("sections/old").await.unwrap());
        assert!(backend.exists("idx/act-sections/1/2").await.unwrap());
    }

    #[tokio::test]
    async fn apply_later_op_on_same_key_wins() {
        let backend = MemoryBackend::new();
        backend
            .apply(vec![
                WriteOp::put("k", b"first".to_vec()),
                WriteOp::delete("k"),
                WriteOp::put("k", b"last".to_vec()),
            ])
            .await
            .unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"last".to_vec()));
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let backend = MemoryBackend::new();
        let clone = backend.clone();
        backend
            .apply(vec![WriteOp::put("key", b"val".to_vec())])
            .await
            .unwrap();
        assert_eq!(clone.get("key").await.unwrap(), Some(b"val".to_vec()));
    }
}
