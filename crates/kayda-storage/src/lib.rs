//! Storage backend abstraction for Kayda.
//!
//! This crate defines the [`StorageBackend`] trait, a pure key-value storage
//! interface that knows nothing about acts, sections, or accounts. The
//! document layer in `kayda-core` serializes domain types to JSON and maps
//! them onto keys such as `acts/<id>` or `idx/act-sections/<act>/<section>`.
//!
//! Two implementations are provided:
//!
//! - [`RocksDbBackend`]: production default, backed by `RocksDB` (feature `rocksdb-backend`)
//! - [`MemoryBackend`]: in-memory, for development and tests

mod error;
mod memory;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend;

pub use error::StorageError;
pub use memory::MemoryBackend;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::RocksDbBackend;

/// A single mutation inside an atomic [`StorageBackend::apply`] batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Store `value` under `key`, overwriting any existing value.
    Put { key: String, value: Vec<u8> },
    /// Remove `key`. Removing a missing key is not an error.
    Delete { key: String },
}

impl WriteOp {
    /// Build a `Put` operation.
    pub fn put(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Build a `Delete` operation.
    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }

    /// The key this operation touches.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// A pluggable key-value storage backend.
///
/// Keys are UTF-8 strings using `/` as a separator (e.g. `acts/<uuid>`,
/// `idx/group-sections/<group>/<section>`). Values are opaque byte arrays.
///
/// There is no single-key write: every mutation, even of one key, is a
/// [`WriteOp`] batch passed to [`apply`](StorageBackend::apply).
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Retrieve a value by key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// List all keys that start with the given prefix, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::List`] if the underlying backend fails.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Apply every operation in `ops` atomically: either all of them become
    /// visible or none do. Operations are applied in order, so a later op on
    /// the same key wins.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Batch`] if the batch could not be committed.
    async fn apply(&self, ops: Vec<WriteOp>) -> Result<(), StorageError>;

    /// Check whether a key exists in storage.
    ///
    /// The default implementation calls [`get`](StorageBackend::get) and checks
    /// for `Some`. Backends may override this with a more efficient check.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key).await?.is_some())
    }
}
