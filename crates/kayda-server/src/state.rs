//! Shared application state for the `Kayda` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. Every repository sits on the same
//! [`DocumentStore`], so they also share its write lock.

use std::sync::Arc;

use kayda_core::accounts::AccountRepository;
use kayda_core::acts::ActRepository;
use kayda_core::groups::GroupRepository;
use kayda_core::sections::SectionRepository;
use kayda_core::store::DocumentStore;
use kayda_storage::StorageBackend;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Act CRUD and search.
    pub acts: ActRepository,
    /// Group CRUD.
    pub groups: GroupRepository,
    /// Section CRUD.
    pub sections: SectionRepository,
    /// Accounts and login sessions.
    pub accounts: AccountRepository,
}

impl AppState {
    /// Build every repository over one storage backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, session_ttl: chrono::Duration) -> Self {
        let store = Arc::new(DocumentStore::new(backend));
        Self {
            acts: ActRepository::new(Arc::clone(&store)),
            groups: GroupRepository::new(Arc::clone(&store)),
            sections: SectionRepository::new(Arc::clone(&store)),
            accounts: AccountRepository::new(store, session_ttl),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
