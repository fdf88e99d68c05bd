//! Error types for `kayda-core`.
//!
//! Each error variant carries enough context to diagnose the problem without
//! a debugger. Account errors never include passwords or session tokens,
//! only the email they concern.

use kayda_storage::StorageError;

/// Errors from the JSON document layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying storage backend returned an error.
    #[error("document storage error: {0}")]
    Storage(#[from] StorageError),

    /// A document could not be encoded to JSON.
    #[error("failed to encode document '{key}': {reason}")]
    Encode { key: String, reason: String },

    /// A stored document could not be decoded from JSON.
    #[error("failed to decode document '{key}': {reason}")]
    Decode { key: String, reason: String },
}

/// Errors from the act, group and section repositories.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The requested document does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// The parent a child document should attach to does not exist.
    #[error("parent {kind} '{id}' not found")]
    ParentNotFound { kind: &'static str, id: String },

    /// The caller supplied invalid input.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// A conditional update named a version that is no longer current.
    #[error("section '{id}' is at version {actual}, update expected version {expected}")]
    VersionConflict { id: String, expected: u64, actual: u64 },

    /// The document store returned an error.
    #[error("catalog store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from account and session operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// An account with this email already exists.
    #[error("account '{email}' already exists")]
    Conflict { email: String },

    /// No account with this email exists.
    #[error("account '{email}' not found")]
    NotFound { email: String },

    /// Logout was requested but the account has no active session.
    #[error("account '{email}' not found or already logged out")]
    NotLoggedIn { email: String },

    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account already holds an unexpired session.
    #[error("account '{email}' is already logged in")]
    AlreadyLoggedIn { email: String },

    /// The presented session token is unknown or expired.
    #[error("invalid or expired session")]
    InvalidSession,

    /// The caller supplied invalid input.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Password hashing failed.
    #[error("password hashing failed: {reason}")]
    Hash { reason: String },

    /// The document store returned an error.
    #[error("account store error: {0}")]
    Store(#[from] StoreError),
}
