//! Section repository.
//!
//! Every Section lives under `sections/<id>` and records its single
//! [`Parent`] explicitly, so an id alone is enough to address it and no
//! lookup ever has to guess which collection or jurisdiction it belongs to.
//!
//! Updates are partial and versioned: each successful update bumps
//! `version`, and a caller that passes `expected_version` gets
//! [`CatalogError::VersionConflict`] instead of silently overwriting a newer
//! write.

use std::sync::Arc;

use chrono::Utc;
use kayda_storage::WriteOp;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CatalogError, StoreError};
use crate::models::{
    non_empty, require_nonblank, Act, Group, Jurisdiction, Parent, Section, SectionPatch,
};
use crate::store::{keys, put_doc, put_marker, DocumentStore};

/// CRUD over Sections.
pub struct SectionRepository {
    store: Arc<DocumentStore>,
}

impl SectionRepository {
    /// Create a repository over the shared document store.
    #[must_use]
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Fetch one Section.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if no Section has this id.
    /// - [`CatalogError::Store`] if storage fails.
    pub async fn get(&self, id: Uuid) -> Result<Section, CatalogError> {
        self.store
            .get::<Section>(&keys::section(id))
            .await?
            .ok_or_else(|| CatalogError::NotFound {
                kind: "section",
                id: id.to_string(),
            })
    }

    /// List the Sections of a parent in creation order.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ParentNotFound`] if the parent does not exist.
    /// - [`CatalogError::Store`] if storage fails.
    pub async fn list_by_parent(&self, parent: Parent) -> Result<Vec<Section>, CatalogError> {
        self.resolve_parent(parent).await?;

        let mut sections = Vec::new();
        for child in self.store.children(&parent_index(parent)).await? {
            let Ok(id) = child.parse::<Uuid>() else {
                continue;
            };
            if let Some(section) = self.store.get::<Section>(&keys::section(id)).await? {
                sections.push(section);
            }
        }
        sections.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(sections)
    }

    /// Create a Section under an Act or a Group.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ParentNotFound`] if the parent does not exist.
    /// - [`CatalogError::InvalidRequest`] if `name` is blank.
    /// - [`CatalogError::Store`] if storage fails.
    pub async fn create(
        &self,
        parent: Parent,
        name: &str,
        text: &str,
        description: Option<String>,
    ) -> Result<Section, CatalogError> {
        let name = require_nonblank("name", name)?;

        let _guard = self.store.write_lock().await;
        let jurisdiction = self.resolve_parent(parent).await?;

        let now = Utc::now();
        let section = Section {
            id: Uuid::new_v4(),
            parent,
            jurisdiction,
            name,
            text: text.to_owned(),
            description: non_empty(description),
            version: 1,
            created_at: now,
            updated_at: now,
        };

        self.store
            .apply(vec![
                put_doc(keys::section(section.id), &section)?,
                put_marker(format!("{}{}", parent_index(parent), section.id)),
            ])
            .await?;

        info!(
            section_id = %section.id,
            parent_kind = parent.kind(),
            parent_id = %parent.id(),
            "section created"
        );
        Ok(section)
    }

    /// Apply a partial update.
    ///
    /// Fields that are `None` or blank keep their stored value.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if no Section has this id.
    /// - [`CatalogError::VersionConflict`] if `expected_version` is stale.
    /// - [`CatalogError::Store`] if storage fails.
    pub async fn update(&self, id: Uuid, patch: SectionPatch) -> Result<Section, CatalogError> {
        let _guard = self.store.write_lock().await;
        let mut section = self.get(id).await?;

        if let Some(expected) = patch.expected_version {
            if expected != section.version {
                return Err(CatalogError::VersionConflict {
                    id: id.to_string(),
                    expected,
                    actual: section.version,
                });
            }
        }

        if let Some(name) = non_empty(patch.name) {
            section.name = name.trim().to_owned();
        }
        if let Some(text) = non_empty(patch.text) {
            section.text = text;
        }
        if let Some(description) = non_empty(patch.description) {
            section.description = Some(description);
        }
        section.version = section.version.saturating_add(1);
        section.updated_at = Utc::now();

        self.store
            .apply(vec![put_doc(keys::section(id), &section)?])
            .await?;

        debug!(section_id = %id, version = section.version, "section updated");
        Ok(section)
    }

    /// Delete a Section and its index entry.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if no Section has this id.
    /// - [`CatalogError::Store`] if storage fails.
    pub async fn delete(&self, id: Uuid) -> Result<(), CatalogError> {
        let _guard = self.store.write_lock().await;
        let section = self.get(id).await?;

        self.store
            .apply(vec![
                WriteOp::delete(keys::section(id)),
                WriteOp::delete(format!("{}{}", parent_index(section.parent), id)),
            ])
            .await?;

        info!(section_id = %id, "section deleted");
        Ok(())
    }

    /// Confirm the parent exists and return the jurisdiction it belongs to.
    async fn resolve_parent(&self, parent: Parent) -> Result<Jurisdiction, CatalogError> {
        let not_found = || CatalogError::ParentNotFound {
            kind: parent.kind(),
            id: parent.id().to_string(),
        };
        match parent {
            Parent::Act(id) => self
                .store
                .get::<Act>(&keys::act(id))
                .await?
                .map(|a| a.jurisdiction)
                .ok_or_else(not_found),
            Parent::Group(id) => self
                .store
                .get::<Group>(&keys::group(id))
                .await?
                .map(|g| g.jurisdiction)
                .ok_or_else(not_found),
        }
    }
}

impl std::fmt::Debug for SectionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionRepository").finish_non_exhaustive()
    }
}

fn parent_index(parent: Parent) -> String {
    match parent {
        Parent::Act(id) => keys::act_sections(id),
        Parent::Group(id) => keys::group_sections(id),
    }
}

/// Queue the removal of every Section listed under `index_prefix`, together
/// with the index entries themselves. Returns the number of Sections queued.
pub(crate) async fn section_teardown(
    store: &DocumentStore,
    index_prefix: &str,
    ops: &mut Vec<WriteOp>,
) -> Result<usize, StoreError> {
    let children = store.children(index_prefix).await?;
    for child in &children {
        ops.push(WriteOp::delete(format!("{}{child}", keys::SECTIONS)));
        ops.push(WriteOp::delete(format!("{index_prefix}{child}")));
    }
    Ok(children.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::acts::{ActRepository, NewAct};
    use crate::groups::GroupRepository;
    use crate::testing::{failing_store, make_store};

    async fn seed_act(store: &Arc<DocumentStore>, jurisdiction: Jurisdiction) -> Uuid {
        ActRepository::new(Arc::clone(store))
            .create(NewAct {
                jurisdiction,
                name: "Maharashtra Land Revenue Code".to_owned(),
                content: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn create_under_missing_parent_is_rejected() {
        let repo = SectionRepository::new(make_store());
        let err = repo
            .create(Parent::Act(Uuid::new_v4()), "Section 1", "text", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ParentNotFound { kind: "act", .. }));

        let err = repo
            .create(Parent::Group(Uuid::new_v4()), "Section 1", "text", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ParentNotFound { kind: "group", .. }));
    }

    #[tokio::test]
    async fn list_by_parent_returns_only_that_parents_sections() {
        let store = make_store();
        let a = seed_act(&store, Jurisdiction::Maharashtra).await;
        let b = seed_act(&store, Jurisdiction::Maharashtra).await;
        let repo = SectionRepository::new(Arc::clone(&store));

        let s1 = repo.create(Parent::Act(a), "Section 1", "one", None).await.unwrap();
        let s2 = repo.create(Parent::Act(a), "Section 2", "two", None).await.unwrap();
        repo.create(Parent::Act(b), "Section 1", "other", None).await.unwrap();

        let ids: Vec<Uuid> = repo
            .list_by_parent(Parent::Act(a))
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![s1.id, s2.id]);
    }

    #[tokio::test]
    async fn partial_update_changes_only_given_field() {
        let store = make_store();
        let act = seed_act(&store, Jurisdiction::Indian).await;
        let repo = SectionRepository::new(Arc::clone(&store));
        let created = repo
            .create(
                Parent::Act(act),
                "Section 3",
                "old text",
                Some("definitions".to_owned()),
            )
            .await
            .unwrap();

        repo.update(
            created.id,
            SectionPatch {
                text: Some("new".to_owned()),
                ..SectionPatch::default()
            },
        )
        .await
        .unwrap();

        let read = repo.get(created.id).await.unwrap();
        assert_eq!(read.text, "new");
        assert_eq!(read.name, "Section 3");
        assert_eq!(read.description.as_deref(), Some("definitions"));
        assert_eq!(read.jurisdiction, Jurisdiction::Indian);
        assert_eq!(read.version, 2);
    }

    #[tokio::test]
    async fn empty_strings_in_patch_mean_no_change() {
        let store = make_store();
        let act = seed_act(&store, Jurisdiction::Indian).await;
        let repo = SectionRepository::new(Arc::clone(&store));
        let created = repo
            .create(Parent::Act(act), "Section 4", "body", None)
            .await
            .unwrap();

        let updated = repo
            .update(
                created.id,
                SectionPatch {
                    name: Some(String::new()),
                    text: Some("  ".to_owned()),
                    ..SectionPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Section 4");
        assert_eq!(updated.text, "body");
    }

    #[tokio::test]
    async fn stale_expected_version_is_rejected() {
        let store = make_store();
        let act = seed_act(&store, Jurisdiction::Indian).await;
        let repo = SectionRepository::new(Arc::clone(&store));
        let created = repo
            .create(Parent::Act(act), "Section 5", "v1", None)
            .await
            .unwrap();

        repo.update(
            created.id,
            SectionPatch {
                text: Some("v2".to_owned()),
                expected_version: Some(1),
                ..SectionPatch::default()
            },
        )
        .await
        .unwrap();

        let err = repo
            .update(
                created.id,
                SectionPatch {
                    text: Some("lost".to_owned()),
                    expected_version: Some(1),
                    ..SectionPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::VersionConflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));
        assert_eq!(repo.get(created.id).await.unwrap().text, "v2");
    }

    #[tokio::test]
    async fn update_and_delete_unknown_id_is_not_found() {
        let repo = SectionRepository::new(make_store());
        let id = Uuid::new_v4();
        assert!(matches!(
            repo.update(id, SectionPatch::default()).await,
            Err(CatalogError::NotFound { .. })
        ));
        assert!(matches!(repo.delete(id).await, Err(CatalogError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_removes_section_from_parent_listing() {
        let store = make_store();
        let act = seed_act(&store, Jurisdiction::Maharashtra).await;
        let repo = SectionRepository::new(Arc::clone(&store));
        let keep = repo.create(Parent::Act(act), "Keep", "", None).await.unwrap();
        let gone = repo.create(Parent::Act(act), "Gone", "", None).await.unwrap();

        repo.delete(gone.id).await.unwrap();
        let listed = repo.list_by_parent(Parent::Act(act)).await.unwrap();
        assert_eq!(listed, vec![keep]);
    }

    #[tokio::test]
    async fn act_delete_removes_direct_and_grouped_sections() {
        let store = make_store();
        let act = seed_act(&store, Jurisdiction::Maharashtra).await;
        let acts = ActRepository::new(Arc::clone(&store));
        let groups = GroupRepository::new(Arc::clone(&store));
        let repo = SectionRepository::new(Arc::clone(&store));

        let group = groups.create(act, "Chapter I", None).await.unwrap();
        let direct = repo.create(Parent::Act(act), "Section 1", "a", None).await.unwrap();
        let grouped = repo
            .create(Parent::Group(group.id), "Section 2", "b", None)
            .await
            .unwrap();

        let removal = acts.delete(act).await.unwrap();
        assert_eq!(removal.groups, 1);
        assert_eq!(removal.sections, 2);

        for id in [direct.id, grouped.id] {
            assert!(matches!(repo.get(id).await, Err(CatalogError::NotFound { .. })));
        }
        assert!(matches!(groups.get(group.id).await, Err(CatalogError::NotFound { .. })));
        assert!(store.keys("idx/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_failure_during_act_delete_keeps_every_section() {
        let (store, backend) = failing_store();
        let act = seed_act(&store, Jurisdiction::Indian).await;
        let acts = ActRepository::new(Arc::clone(&store));
        let repo = SectionRepository::new(Arc::clone(&store));
        let s1 = repo.create(Parent::Act(act), "Section 1", "a", None).await.unwrap();
        let s2 = repo.create(Parent::Act(act), "Section 2", "b", None).await.unwrap();

        backend.fail_batches(true);
        assert!(acts.delete(act).await.is_err());
        backend.fail_batches(false);

        // Nothing was applied: the act and both sections are still whole.
        assert!(acts.get(act).await.is_ok());
        assert_eq!(repo.list_by_parent(Parent::Act(act)).await.unwrap().len(), 2);

        acts.delete(act).await.unwrap();
        for id in [s1.id, s2.id] {
            assert!(matches!(repo.get(id).await, Err(CatalogError::NotFound { .. })));
        }
    }
}
