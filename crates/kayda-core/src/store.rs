//! JSON document store over a [`StorageBackend`].
//!
//! Every domain record lives under a typed key (see [`keys`]) and is stored
//! as a JSON document. Parent→child relations are kept as empty marker keys
//! under `idx/`, so listing the children of a parent is a prefix scan.
//!
//! Mutations that touch more than one key are built as a `Vec<WriteOp>` and
//! committed through [`DocumentStore::apply`], which the backend applies
//! atomically. Repositories additionally take [`DocumentStore::write_lock`]
//! around read-check-write sequences so concurrent requests in this process
//! cannot interleave between the check and the commit.

use std::sync::Arc;

use kayda_storage::{StorageBackend, WriteOp};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::StoreError;

/// Key layout shared by all repositories.
pub mod keys {
    use uuid::Uuid;

    pub const ACTS: &str = "acts/";
    pub const GROUPS: &str = "groups/";
    pub const SECTIONS: &str = "sections/";
    pub const ACCOUNTS: &str = "accounts/";
    pub const SESSIONS: &str = "sessions/";

    #[must_use]
    pub fn act(id: Uuid) -> String {
        format!("{ACTS}{id}")
    }

    #[must_use]
    pub fn group(id: Uuid) -> String {
        format!("{GROUPS}{id}")
    }

    #[must_use]
    pub fn section(id: Uuid) -> String {
        format!("{SECTIONS}{id}")
    }

    #[must_use]
    pub fn account(email: &str) -> String {
        format!("{ACCOUNTS}{email}")
    }

    #[must_use]
    pub fn session(token_hash: &str) -> String {
        format!("{SESSIONS}{token_hash}")
    }

    /// Prefix of the Groups owned by an Act.
    #[must_use]
    pub fn act_groups(act: Uuid) -> String {
        format!("idx/act-groups/{act}/")
    }

    /// Prefix of the Sections attached directly to an Act.
    #[must_use]
    pub fn act_sections(act: Uuid) -> String {
        format!("idx/act-sections/{act}/")
    }

    /// Prefix of the Sections attached to a Group.
    #[must_use]
    pub fn group_sections(group: Uuid) -> String {
        format!("idx/group-sections/{group}/")
    }

    /// Points at the session currently held by an account.
    #[must_use]
    pub fn account_session(email: &str) -> String {
        format!("idx/account-session/{email}")
    }
}

/// Typed JSON access to a storage backend.
pub struct DocumentStore {
    backend: Arc<dyn StorageBackend>,
    writer: Mutex<()>,
}

impl DocumentStore {
    /// Wrap a storage backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            writer: Mutex::new(()),
        }
    }

    /// Serialize mutating sequences across all repositories sharing this store.
    pub async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    /// Fetch and decode a document.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Storage`] if the backend fails.
    /// - [`StoreError::Decode`] if the stored bytes are not valid JSON for `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.backend.get(key).await? {
            None => Ok(None),
            Some(bytes) => decode(key, &bytes).map(Some),
        }
    }

    /// Fetch a raw value (used for index entries that hold a plain string).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend fails.
    pub async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.backend.get(key).await?)
    }

    /// Check whether a key exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend fails.
    pub async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.backend.exists(key).await?)
    }

    /// List the keys under a prefix.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend fails.
    pub async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.backend.list(prefix).await?)
    }

    /// List the last path segment of every key under an index prefix.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend fails.
    pub async fn children(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let keys = self.backend.list(prefix).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(prefix).map(str::to_owned))
            .collect())
    }

    /// Decode every document stored directly under `prefix`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Storage`] if the backend fails.
    /// - [`StoreError::Decode`] if any document is malformed.
    pub async fn scan<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, StoreError> {
        let keys = self.backend.list(prefix).await?;
        let mut docs = Vec::with_capacity(keys.len());
        for key in keys {
            // A key deleted between list and get is simply skipped.
            if let Some(doc) = self.get(&key).await? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    /// Commit a batch atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend rejects the batch. In
    /// that case none of the operations were applied.
    pub async fn apply(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        if ops.is_empty() {
            return Ok(());
        }
        self.backend.apply(ops).await?;
        Ok(())
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore").finish_non_exhaustive()
    }
}

/// Encode a document into a `Put` operation.
///
/// # Errors
///
/// Returns [`StoreError::Encode`] if serialization fails.
pub fn put_doc<T: Serialize>(key: String, doc: &T) -> Result<WriteOp, StoreError> {
    let bytes = serde_json::to_vec(doc).map_err(|e| StoreError::Encode {
        key: key.clone(),
        reason: e.to_string(),
    })?;
    Ok(WriteOp::Put { key, value: bytes })
}

/// An empty marker value for index keys.
#[must_use]
pub fn put_marker(key: String) -> WriteOp {
    WriteOp::Put {
        key,
        value: Vec::new(),
    }
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Decode {
        key: key.to_owned(),
        reason: e.to_string(),
    })
}
