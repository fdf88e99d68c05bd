//! Test helpers: an in-memory store and a backend whose batches can be made to fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kayda_storage::{MemoryBackend, StorageBackend, StorageError, WriteOp};

use crate::store::DocumentStore;

pub fn make_store() -> Arc<DocumentStore> {
    Arc::new(DocumentStore::new(Arc::new(MemoryBackend::new())))
}

/// Wraps a [`MemoryBackend`] and rejects every `apply` while armed.
#[derive(Debug, Default)]
pub struct FlakyBackend {
    inner: MemoryBackend,
    fail: AtomicBool,
}

impl FlakyBackend {
    pub fn fail_batches(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl StorageBackend for FlakyBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get(key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.inner.list(prefix).await
    }

    async fn apply(&self, ops: Vec<WriteOp>) -> Result<(), StorageError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Batch {
                ops: ops.len(),
                reason: "injected failure".to_owned(),
            });
        }
        self.inner.apply(ops).await
    }
}

pub fn failing_store() -> (Arc<DocumentStore>, Arc<FlakyBackend>) {
    let backend = Arc::new(FlakyBackend::default());
    let store = Arc::new(DocumentStore::new(Arc::clone(&backend) as Arc<dyn StorageBackend>));
    (store, backend)
}
