//! Storage error types.
//!
//! Every variant carries the key or prefix involved so a failed request can
//! be traced back to the document it touched.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to open the storage backend at the given path.
    #[error("failed to open storage at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Failed to read a value from storage.
    #[error("failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    /// Failed to list keys with the given prefix.
    #[error("failed to list keys with prefix '{prefix}': {reason}")]
    List { prefix: String, reason: String },

    /// An atomic batch could not be committed. Nothing in the batch was applied.
    #[error("batch of {ops} operations failed: {reason}")]
    Batch { ops: usize, reason: String },

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task for {op} did not complete: {reason}")]
    Task { op: &'static str, reason: String },

    /// A storage key contained invalid UTF-8.
    #[error("invalid key encoding: {reason}")]
    InvalidKey { reason: String },
}
