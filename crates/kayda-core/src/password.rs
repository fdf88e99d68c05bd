//! Password and session-token hashing.
//!
//! Passwords are hashed with Argon2id into a PHC string that embeds its own
//! random salt. Session tokens are high-entropy UUIDs, so a single SHA-256
//! pass is enough to keep the plaintext out of storage.
//!
//! Argon2 is CPU-bound. Repositories call the `_blocking` variants, which run
//! on the Tokio blocking pool instead of an executor thread.

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AccountError;

/// Hash a password into an Argon2id PHC string.
///
/// # Errors
///
/// Returns [`AccountError::Hash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Hash {
            reason: e.to_string(),
        })
}

/// Check a password against a stored PHC string.
///
/// A mismatch is `Ok(false)`; only a malformed stored hash is an error.
///
/// # Errors
///
/// Returns [`AccountError::Hash`] if `phc` cannot be parsed.
pub fn verify_password(password: &str, phc: &str) -> Result<bool, AccountError> {
    let parsed = PasswordHash::new(phc).map_err(|e| AccountError::Hash {
        reason: e.to_string(),
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// [`hash_password`] on the blocking pool.
///
/// # Errors
///
/// Returns [`AccountError::Hash`] if hashing fails or the task dies.
pub async fn hash_password_blocking(password: &str) -> Result<String, AccountError> {
    let password = password.to_owned();
    run_blocking(move || hash_password(&password)).await
}

/// Check a login attempt on the blocking pool.
///
/// `stored` is the account's PHC string, or `None` for an unknown account. An
/// unknown account is verified against a throwaway hash and always fails, so
/// it costs the same as a wrong password.
///
/// # Errors
///
/// Returns [`AccountError::Hash`] if the stored hash is malformed or the task dies.
pub async fn verify_password_blocking(
    password: &str,
    stored: Option<String>,
) -> Result<bool, AccountError> {
    let password = password.to_owned();
    run_blocking(move || match stored {
        Some(phc) => verify_password(&password, &phc),
        None => {
            if let Some(phc) = dummy_hash() {
                let _ = verify_password(&password, phc);
            }
            Ok(false)
        }
    })
    .await
}

/// A fixed hash used to equalise timing for unknown accounts.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("kayda-unknown-account").ok())
        .as_deref()
}

async fn run_blocking<T, F>(work: F) -> Result<T, AccountError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AccountError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AccountError::Hash {
            reason: format!("hashing task did not complete: {e}"),
        })?
}

/// Hash a plaintext session token with SHA-256, hex-encoded.
#[must_use]
pub fn hash_token(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}

/// Compare two token hashes without an early exit on the first differing byte.
#[must_use]
pub fn hashes_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
