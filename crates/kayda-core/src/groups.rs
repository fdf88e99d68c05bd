//! Group repository.
//!
//! A Group is a chapter-like container under an Act. Its Sections are stored
//! as ordinary Section documents pointing at the Group, not embedded in it,
//! so Section ids stay addressable on their own.

use std::sync::Arc;

use chrono::Utc;
use kayda_storage::WriteOp;
use tracing::info;
use uuid::Uuid;

use crate::error::{CatalogError, StoreError};
use crate::models::{non_empty, require_nonblank, Act, Group};
use crate::sections::section_teardown;
use crate::store::{keys, put_doc, put_marker, DocumentStore};

/// CRUD over Groups.
pub struct GroupRepository {
    store: Arc<DocumentStore>,
}

impl GroupRepository {
    /// Create a repository over the shared document store.
    #[must_use]
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Fetch one Group.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if no Group has this id.
    /// - [`CatalogError::Store`] if storage fails.
    pub async fn get(&self, id: Uuid) -> Result<Group, CatalogError> {
        self.store
            .get::<Group>(&keys::group(id))
            .await?
            .ok_or_else(|| CatalogError::NotFound {
                kind: "group",
                id: id.to_string(),
            })
    }

    /// List the Groups of an Act in creation order.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ParentNotFound`] if the Act does not exist.
    /// - [`CatalogError::Store`] if storage fails.
    pub async fn list_by_act(&self, act_id: Uuid) -> Result<Vec<Group>, CatalogError> {
        if !self.store.exists(&keys::act(act_id)).await? {
            return Err(CatalogError::ParentNotFound {
                kind: "act",
                id: act_id.to_string(),
            });
        }

        let mut groups = Vec::new();
        for child in self.store.children(&keys::act_groups(act_id)).await? {
            let Ok(id) = child.parse::<Uuid>() else {
                continue;
            };
            if let Some(group) = self.store.get::<Group>(&keys::group(id)).await? {
                groups.push(group);
            }
        }
        groups.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(groups)
    }

    /// Create a Group under an Act.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ParentNotFound`] if the Act does not exist.
    /// - [`CatalogError::InvalidRequest`] if `name` is blank.
    /// - [`CatalogError::Store`] if storage fails.
    pub async fn create(
        &self,
        act_id: Uuid,
        name: &str,
        description: Option<String>,
    ) -> Result<Group, CatalogError> {
        let name = require_nonblank("name", name)?;

        let _guard = self.store.write_lock().await;
        let act = self
            .store
            .get::<Act>(&keys::act(act_id))
            .await?
            .ok_or_else(|| CatalogError::ParentNotFound {
                kind: "act",
                id: act_id.to_string(),
            })?;

        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4(),
            act_id,
            jurisdiction: act.jurisdiction,
            name,
            description: non_empty(description),
            created_at: now,
            updated_at: now,
        };

        self.store
            .apply(vec![
                put_doc(keys::group(group.id), &group)?,
                put_marker(format!("{}{}", keys::act_groups(act_id), group.id)),
            ])
            .await?;

        info!(group_id = %group.id, act_id = %act_id, "group created");
        Ok(group)
    }

    /// Update a Group's name or description. Absent or blank fields are left unchanged.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if no Group has this id.
    /// - [`CatalogError::Store`] if storage fails.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Group, CatalogError> {
        let _guard = self.store.write_lock().await;
        let mut group = self.get(id).await?;

        if let Some(name) = non_empty(name) {
            group.name = name.trim().to_owned();
        }
        if let Some(description) = non_empty(description) {
            group.description = Some(description);
        }
        group.updated_at = Utc::now();

        self.store.apply(vec![put_doc(keys::group(id), &group)?]).await?;
        Ok(group)
    }

    /// Delete a Group and all of its Sections atomically.
    ///
    /// Returns the number of Sections removed.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if no Group has this id.
    /// - [`CatalogError::Store`] if storage fails; nothing is removed then.
    pub async fn delete(&self, id: Uuid) -> Result<usize, CatalogError> {
        let _guard = self.store.write_lock().await;
        let group = self.get(id).await?;

        let mut ops = Vec::new();
        let sections = group_teardown(&self.store, id, &mut ops).await?;
        ops.push(WriteOp::delete(format!(
            "{}{}",
            keys::act_groups(group.act_id),
            id
        )));
        self.store.apply(ops).await?;

        info!(group_id = %id, sections, "group deleted with its sections");
        Ok(sections)
    }
}

impl std::fmt::Debug for GroupRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupRepository").finish_non_exhaustive()
    }
}

/// Queue the removal of a Group document and all of its Sections.
///
/// The caller removes the `act-groups` index entry, since it knows the Act.
/// Returns the number of Sections queued.
pub(crate) async fn group_teardown(
    store: &DocumentStore,
    group_id: Uuid,
    ops: &mut Vec<WriteOp>,
) -> Result<usize, StoreError> {
    let removed = section_teardown(store, &keys::group_sections(group_id), ops).await?;
    ops.push(WriteOp::delete(keys::group(group_id)));
    Ok(removed)
}
