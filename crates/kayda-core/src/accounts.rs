//! Accounts and login sessions.
//!
//! An account is keyed by its normalised email. A login mints a random token
//! that is returned to the caller once; only its SHA-256 hash is stored, under
//! `sessions/<hash>`, with an expiry. Each account holds at most one live
//! session, tracked by `idx/account-session/<email>`. A session that has
//! expired no longer counts, so an abandoned login cannot lock an account.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use kayda_storage::WriteOp;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AccountError, StoreError};
use crate::models::{Account, AccountSummary, LoginGrant, Principal, Session};
use crate::password::{hash_password_blocking, hash_token, hashes_match, verify_password_blocking};
use crate::store::{keys, put_doc, DocumentStore};

/// Account lifecycle and session management.
pub struct AccountRepository {
    store: Arc<DocumentStore>,
    session_ttl: Duration,
}

impl AccountRepository {
    /// Create a repository whose sessions live for `session_ttl`.
    #[must_use]
    pub fn new(store: Arc<DocumentStore>, session_ttl: Duration) -> Self {
        Self { store, session_ttl }
    }

    /// Self-service registration. New accounts are never admins.
    ///
    /// # Errors
    ///
    /// - [`AccountError::InvalidRequest`] if the email or password is unusable.
    /// - [`AccountError::Conflict`] if the email is taken.
    /// - [`AccountError::Store`] if storage fails.
    pub async fn register(&self, email: &str, password: &str) -> Result<AccountSummary, AccountError> {
        self.create(email, password, false).await
    }

    /// Create an account with an explicit admin flag.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub async fn create(
        &self,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<AccountSummary, AccountError> {
        let email = normalize_email(email)?;
        require_password(password)?;
        let password_hash = hash_password_blocking(password).await?;

        let _guard = self.store.write_lock().await;
        if self.store.exists(&keys::account(&email)).await? {
            return Err(AccountError::Conflict { email });
        }

        let now = Utc::now();
        let account = Account {
            email: email.clone(),
            password_hash,
            is_admin,
            created_at: now,
            updated_at: now,
        };
        self.store
            .apply(vec![put_doc(keys::account(&email), &account)?])
            .await?;

        info!(email = %email, is_admin, "account created");
        Ok(AccountSummary {
            email,
            is_admin,
            logged_in: false,
        })
    }

    /// Verify credentials and open a session.
    ///
    /// The password is checked before the store lock is taken, so a flood of
    /// bad logins never holds up other writers.
    ///
    /// # Errors
    ///
    /// - [`AccountError::InvalidCredentials`] on an unknown email or wrong password.
    /// - [`AccountError::AlreadyLoggedIn`] if an unexpired session exists.
    /// - [`AccountError::Store`] if storage fails.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<LoginGrant, AccountError> {
        let email = email.trim().to_lowercase();

        let checked_hash = self
            .store
            .get::<Account>(&keys::account(&email))
            .await?
            .map(|account| account.password_hash);
        let known = checked_hash.is_some();
        if !verify_password_blocking(password, checked_hash.clone()).await? {
            if known {
                warn!(email = %email, "login with wrong password");
            } else {
                debug!(email = %email, "login for unknown account");
            }
            return Err(AccountError::InvalidCredentials);
        }

        let _guard = self.store.write_lock().await;
        // Deleted or re-passworded while we were verifying.
        let account = match self.store.get::<Account>(&keys::account(&email)).await? {
            Some(account) if Some(&account.password_hash) == checked_hash.as_ref() => account,
            _ => return Err(AccountError::InvalidCredentials),
        };

        let now = Utc::now();
        let mut ops = Vec::new();
        if let Some(current) = self.current_session(&email).await? {
            if !current.is_expired(now) {
                return Err(AccountError::AlreadyLoggedIn { email });
            }
            ops.push(WriteOp::delete(keys::session(&current.token_hash)));
        }

        let token = Uuid::new_v4().to_string();
        let session = Session {
            token_hash: hash_token(&token),
            email: email.clone(),
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        ops.push(put_doc(keys::session(&session.token_hash), &session)?);
        ops.push(WriteOp::put(
            keys::account_session(&email),
            session.token_hash.as_bytes().to_vec(),
        ));
        self.store.apply(ops).await?;

        info!(email = %email, expires_at = %session.expires_at, "session opened");
        Ok(LoginGrant {
            token,
            expires_at: session.expires_at,
            is_admin: account.is_admin,
        })
    }

    /// End the account's active session.
    ///
    /// # Errors
    ///
    /// - [`AccountError::NotLoggedIn`] if the account holds no session.
    /// - [`AccountError::Store`] if storage fails.
    pub async fn logout(&self, email: &str) -> Result<(), AccountError> {
        let email = email.trim().to_lowercase();

        let _guard = self.store.write_lock().await;
        let Some(session_hash) = self.session_hash(&email).await? else {
            return Err(AccountError::NotLoggedIn { email });
        };
        self.store
            .apply(vec![
                WriteOp::delete(keys::session(&session_hash)),
                WriteOp::delete(keys::account_session(&email)),
            ])
            .await?;

        info!(email = %email, "session closed");
        Ok(())
    }

    /// Map a presented token to its account.
    ///
    /// The admin flag is read from the account on every call, so a demotion
    /// takes effect on the very next request.
    ///
    /// # Errors
    ///
    /// - [`AccountError::InvalidSession`] if the token is unknown, expired,
    ///   superseded, or its account is gone.
    /// - [`AccountError::Store`] if storage fails.
    pub async fn resolve_session(&self, token: &str) -> Result<Principal, AccountError> {
        let token_hash = hash_token(token);
        let session = self
            .store
            .get::<Session>(&keys::session(&token_hash))
            .await?
            .ok_or(AccountError::InvalidSession)?;

        if session.is_expired(Utc::now()) {
            return Err(AccountError::InvalidSession);
        }
        match self.session_hash(&session.email).await? {
            Some(current) if hashes_match(&current, &token_hash) => {}
            _ => return Err(AccountError::InvalidSession),
        }

        let account = self
            .store
            .get::<Account>(&keys::account(&session.email))
            .await?
            .ok_or(AccountError::InvalidSession)?;
        Ok(Principal {
            email: account.email,
            is_admin: account.is_admin,
        })
    }

    /// Grant or revoke admin rights.
    ///
    /// # Errors
    ///
    /// - [`AccountError::NotFound`] if the account does not exist.
    /// - [`AccountError::Store`] if storage fails.
    pub async fn set_admin(&self, email: &str, is_admin: bool) -> Result<AccountSummary, AccountError> {
        let email = email.trim().to_lowercase();

        let _guard = self.store.write_lock().await;
        let mut account = self.require_account(&email).await?;
        account.is_admin = is_admin;
        account.updated_at = Utc::now();
        self.store
            .apply(vec![put_doc(keys::account(&email), &account)?])
            .await?;

        info!(email = %email, is_admin, "admin flag changed");
        let logged_in = self.has_live_session(&email, Utc::now()).await?;
        Ok(AccountSummary {
            email,
            is_admin,
            logged_in,
        })
    }

    /// Replace an account's password and end its session.
    ///
    /// # Errors
    ///
    /// - [`AccountError::InvalidRequest`] if the new password is empty.
    /// - [`AccountError::NotFound`] if the account does not exist.
    /// - [`AccountError::Store`] if storage fails.
    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<(), AccountError> {
        let email = email.trim().to_lowercase();
        require_password(new_password)?;
        let password_hash = hash_password_blocking(new_password).await?;

        let _guard = self.store.write_lock().await;
        let mut account = self.require_account(&email).await?;
        account.password_hash = password_hash;
        account.updated_at = Utc::now();

        let mut ops = vec![put_doc(keys::account(&email), &account)?];
        self.end_session(&email, &mut ops).await?;
        self.store.apply(ops).await?;

        info!(email = %email, "password reset");
        Ok(())
    }

    /// Remove an account and any session it holds.
    ///
    /// # Errors
    ///
    /// - [`AccountError::NotFound`] if the account does not exist.
    /// - [`AccountError::Store`] if storage fails.
    pub async fn delete(&self, email: &str) -> Result<(), AccountError> {
        let email = email.trim().to_lowercase();

        let _guard = self.store.write_lock().await;
        self.require_account(&email).await?;

        let mut ops = vec![WriteOp::delete(keys::account(&email))];
        self.end_session(&email, &mut ops).await?;
        self.store.apply(ops).await?;

        info!(email = %email, "account deleted");
        Ok(())
    }

    /// List every account, ordered by email. Hashes are never included.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Store`] if storage fails.
    pub async fn list(&self) -> Result<Vec<AccountSummary>, AccountError> {
        let now = Utc::now();
        let mut summaries = Vec::new();
        for account in self.store.scan::<Account>(keys::ACCOUNTS).await? {
            let logged_in = self.has_live_session(&account.email, now).await?;
            summaries.push(AccountSummary {
                email: account.email,
                is_admin: account.is_admin,
                logged_in,
            });
        }
        summaries.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(summaries)
    }

    /// Make sure an admin account exists for `email`.
    ///
    /// An existing account is promoted and keeps its password. Returns `true`
    /// if a new account was created.
    ///
    /// # Errors
    ///
    /// Same as [`create`](Self::create).
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<bool, AccountError> {
        match self.create(email, password, true).await {
            Ok(_) => Ok(true),
            Err(AccountError::Conflict { email }) => {
                self.set_admin(&email, true).await?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete every session that expired before `now`.
    ///
    /// Returns the number of sessions removed.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Store`] if storage fails.
    pub async fn sweep_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, AccountError> {
        let _guard = self.store.write_lock().await;

        let mut ops = Vec::new();
        let mut removed = 0;
        for session in self.store.scan::<Session>(keys::SESSIONS).await? {
            if !session.is_expired(now) {
                continue;
            }
            ops.push(WriteOp::delete(keys::session(&session.token_hash)));
            if self.session_hash(&session.email).await?.as_deref() == Some(session.token_hash.as_str()) {
                ops.push(WriteOp::delete(keys::account_session(&session.email)));
            }
            removed += 1;
        }
        self.store.apply(ops).await?;

        if removed > 0 {
            info!(count = removed, "expired sessions swept");
        }
        Ok(removed)
    }

    async fn require_account(&self, email: &str) -> Result<Account, AccountError> {
        self.store
            .get::<Account>(&keys::account(email))
            .await?
            .ok_or_else(|| AccountError::NotFound {
                email: email.to_owned(),
            })
    }

    async fn session_hash(&self, email: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .store
            .get_raw(&keys::account_session(email))
            .await?
            .and_then(|bytes| String::from_utf8(bytes).ok()))
    }

    async fn current_session(&self, email: &str) -> Result<Option<Session>, StoreError> {
        match self.session_hash(email).await? {
            Some(hash) => self.store.get::<Session>(&keys::session(&hash)).await,
            None => Ok(None),
        }
    }

    async fn has_live_session(&self, email: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(self
            .current_session(email)
            .await?
            .is_some_and(|s| !s.is_expired(now)))
    }

    async fn end_session(&self, email: &str, ops: &mut Vec<WriteOp>) -> Result<(), StoreError> {
        if let Some(hash) = self.session_hash(email).await? {
            ops.push(WriteOp::delete(keys::session(&hash)));
            ops.push(WriteOp::delete(keys::account_session(email)));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AccountRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountRepository")
            .field("session_ttl_secs", &self.session_ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

fn normalize_email(email: &str) -> Result<String, AccountError> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') || email.contains('/') {
        return Err(AccountError::InvalidRequest {
            reason: "a valid email is required".to_owned(),
        });
    }
    Ok(email)
}

fn require_password(password: &str) -> Result<(), AccountError> {
    if password.is_empty() {
        return Err(AccountError::InvalidRequest {
            reason: "password is required".to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::make_store;

    fn repo() -> AccountRepository {
        AccountRepository::new(make_store(), Duration::hours(1))
    }

    #[tokio::test]
    async fn register_normalizes_and_rejects_duplicates() {
        let repo = repo();
        let created = repo.register("  Clerk@Court.IN ", "pw").await.unwrap();
        assert_eq!(created.email, "clerk@court.in");
        assert!(!created.is_admin);

        let err = repo.register("clerk@court.in", "other").await.unwrap_err();
        assert!(matches!(err, AccountError::Conflict { .. }));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let repo = repo();
        assert!(matches!(
            repo.register("no-at-sign", "pw").await,
            Err(AccountError::InvalidRequest { .. })
        ));
        assert!(matches!(
            repo.register("a@b.c", "").await,
            Err(AccountError::InvalidRequest { .. })
        ));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let repo = repo();
        repo.register("a@b.c", "right").await.unwrap();
        assert!(matches!(
            repo.authenticate("a@b.c", "wrong").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            repo.authenticate("x@y.z", "right").await,
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn failed_logins_do_not_wait_for_the_store_lock() {
        let store = make_store();
        let repo = AccountRepository::new(Arc::clone(&store), Duration::hours(1));
        repo.register("a@b.c", "right").await.unwrap();

        let _held = store.write_lock().await;
        for email in ["a@b.c", "x@y.z"] {
            let attempt = tokio::time::timeout(
                std::time::Duration::from_secs(30),
                repo.authenticate(email, "wrong"),
            )
            .await;
            assert!(matches!(attempt, Ok(Err(AccountError::InvalidCredentials))));
        }
    }

    #[tokio::test]
    async fn login_is_refused_after_a_password_reset() {
        let repo = repo();
        repo.register("a@b.c", "old").await.unwrap();
        repo.reset_password("a@b.c", "new").await.unwrap();
        assert!(matches!(
            repo.authenticate("a@b.c", "old").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(repo.authenticate("a@b.c", "new").await.is_ok());
    }

    #[tokio::test]
    async fn second_login_is_rejected_until_logout() {
        let repo = repo();
        repo.register("a@b.c", "pw").await.unwrap();

        let grant = repo.authenticate("a@b.c", "pw").await.unwrap();
        assert!(matches!(
            repo.authenticate("a@b.c", "pw").await,
            Err(AccountError::AlreadyLoggedIn { .. })
        ));

        let principal = repo.resolve_session(&grant.token).await.unwrap();
        assert_eq!(principal.email, "a@b.c");

        repo.logout("a@b.c").await.unwrap();
        assert!(matches!(
            repo.resolve_session(&grant.token).await,
            Err(AccountError::InvalidSession)
        ));
        assert!(matches!(
            repo.logout("a@b.c").await,
            Err(AccountError::NotLoggedIn { .. })
        ));

        repo.authenticate("a@b.c", "pw").await.unwrap();
    }

    #[tokio::test]
    async fn expired_session_does_not_block_login() {
        let repo = AccountRepository::new(make_store(), Duration::zero());
        repo.register("a@b.c", "pw").await.unwrap();

        let stale = repo.authenticate("a@b.c", "pw").await.unwrap();
        assert!(matches!(
            repo.resolve_session(&stale.token).await,
            Err(AccountError::InvalidSession)
        ));

        let fresh = repo.authenticate("a@b.c", "pw").await.unwrap();
        assert_ne!(fresh.token, stale.token);
    }

    #[tokio::test]
    async fn unknown_token_is_invalid_session() {
        let repo = repo();
        assert!(matches!(
            repo.resolve_session("not-a-token").await,
            Err(AccountError::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn admin_flag_is_read_fresh_on_each_resolve() {
        let repo = repo();
        repo.register("a@b.c", "pw").await.unwrap();
        let grant = repo.authenticate("a@b.c", "pw").await.unwrap();
        assert!(!grant.is_admin);

        repo.set_admin("a@b.c", true).await.unwrap();
        assert!(repo.resolve_session(&grant.token).await.unwrap().is_admin);

        repo.set_admin("a@b.c", false).await.unwrap();
        assert!(!repo.resolve_session(&grant.token).await.unwrap().is_admin);
    }

    #[tokio::test]
    async fn reset_password_ends_session_and_changes_credentials() {
        let repo = repo();
        repo.register("a@b.c", "old").await.unwrap();
        let grant = repo.authenticate("a@b.c", "old").await.unwrap();

        repo.reset_password("a@b.c", "new").await.unwrap();
        assert!(matches!(
            repo.resolve_session(&grant.token).await,
            Err(AccountError::InvalidSession)
        ));
        assert!(matches!(
            repo.authenticate("a@b.c", "old").await,
            Err(AccountError::InvalidCredentials)
        ));
        repo.authenticate("a@b.c", "new").await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_account_and_session() {
        let repo = repo();
        repo.register("a@b.c", "pw").await.unwrap();
        let grant = repo.authenticate("a@b.c", "pw").await.unwrap();

        repo.delete("a@b.c").await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
        assert!(matches!(
            repo.resolve_session(&grant.token).await,
            Err(AccountError::InvalidSession)
        ));
        assert!(matches!(
            repo.delete("a@b.c").await,
            Err(AccountError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_reports_login_state_without_hashes() {
        let repo = repo();
        repo.register("b@x.y", "pw").await.unwrap();
        repo.create("a@x.y", "pw", true).await.unwrap();
        repo.authenticate("b@x.y", "pw").await.unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(
            listed,
            vec![
                AccountSummary {
                    email: "a@x.y".to_owned(),
                    is_admin: true,
                    logged_in: false,
                },
                AccountSummary {
                    email: "b@x.y".to_owned(),
                    is_admin: false,
                    logged_in: true,
                },
            ]
        );
    }

    #[tokio::test]
    async fn ensure_admin_creates_then_promotes() {
        let repo = repo();
        assert!(repo.ensure_admin("root@kayda.in", "pw").await.unwrap());
        assert!(!repo.ensure_admin("root@kayda.in", "ignored").await.unwrap());

        repo.register("user@kayda.in", "pw").await.unwrap();
        assert!(!repo.ensure_admin("user@kayda.in", "ignored").await.unwrap());
        // The existing password is kept.
        repo.authenticate("user@kayda.in", "pw").await.unwrap();

        assert!(repo.list().await.unwrap().iter().all(|a| a.is_admin));
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_sessions() {
        let repo = repo();
        repo.register("a@b.c", "pw").await.unwrap();
        let grant = repo.authenticate("a@b.c", "pw").await.unwrap();

        assert_eq!(repo.sweep_expired_sessions(Utc::now()).await.unwrap(), 0);
        assert!(repo.resolve_session(&grant.token).await.is_ok());

        let later = Utc::now() + Duration::hours(2);
        assert_eq!(repo.sweep_expired_sessions(later).await.unwrap(), 1);
        assert!(matches!(
            repo.resolve_session(&grant.token).await,
            Err(AccountError::InvalidSession)
        ));
        assert!(!repo.list().await.unwrap()[0].logged_in);
    }
}
