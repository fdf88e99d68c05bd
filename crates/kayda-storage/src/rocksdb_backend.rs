//! `RocksDB` backend, used when `KAYDA_STORAGE=rocksdb`.
//!
//! `RocksDB` is a synchronous C++ library, so each call runs on the Tokio
//! blocking pool through [`RocksDbBackend::blocking`]. Batches become a single
//! `WriteBatch`, which `RocksDB` commits atomically.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rocksdb::{DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options, WriteBatch};

use crate::{StorageBackend, StorageError, WriteOp};

type Db = DBWithThreadMode<MultiThreaded>;

/// Persistent storage in a `RocksDB` directory.
#[derive(Clone)]
pub struct RocksDbBackend {
    db: Arc<Db>,
    path: PathBuf,
}

impl std::fmt::Debug for RocksDbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RocksDbBackend {
    /// Open (or create) the database directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if `RocksDB` cannot open the directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = Db::open(&opts, path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "rocksdb opened");

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    /// Run `work` against the database on the blocking pool.
    async fn blocking<T, F>(&self, op: &'static str, work: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Db) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || work(&db))
            .await
            .map_err(|e| StorageError::Task {
                op,
                reason: e.to_string(),
            })?
    }
}

#[async_trait::async_trait]
impl StorageBackend for RocksDbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let key = key.to_owned();
        self.blocking("get", move |db| {
            db.get(key.as_bytes()).map_err(|e| StorageError::Read {
                key,
                reason: e.to_string(),
            })
        })
        .await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let prefix = prefix.to_owned();
        self.blocking("list", move |db| {
            let mut keys = Vec::new();
            for item in db.iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward)) {
                let (raw, _) = item.map_err(|e| StorageError::List {
                    prefix: prefix.clone(),
                    reason: e.to_string(),
                })?;
                let key = String::from_utf8(raw.into_vec()).map_err(|e| {
                    StorageError::InvalidKey {
                        reason: e.to_string(),
                    }
                })?;
                if !key.starts_with(&prefix) {
                    break;
                }
                keys.push(key);
            }
            Ok(keys)
        })
        .await
    }

    async fn apply(&self, ops: Vec<WriteOp>) -> Result<(), StorageError> {
        self.blocking("apply", move |db| {
            let count = ops.len();
            let mut batch = WriteBatch::default();
            for op in &ops {
                match op {
                    WriteOp::Put { key, value } => batch.put(key.as_bytes(), value),
                    WriteOp::Delete { key } => batch.delete(key.as_bytes()),
                }
            }
            db.write(batch).map_err(|e| StorageError::Batch {
                ops: count,
                reason: e.to_string(),
            })
        })
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let key = key.to_owned();
        self.blocking("exists", move |db| {
            db.get_pinned(key.as_bytes())
                .map(|v| v.is_some())
                .map_err(|e| StorageError::Read {
                    key,
                    reason: e.to_string(),
                })
        })
        .await
    }
}
