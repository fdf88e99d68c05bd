//! Act repository.
//!
//! Acts are stored under `acts/<id>`. Deleting an Act removes its Groups,
//! every Section beneath it and all index entries in one atomic batch: a
//! failed delete leaves the whole tree in place and can simply be retried.

use std::sync::Arc;

use chrono::Utc;
use kayda_storage::WriteOp;
use tracing::info;
use uuid::Uuid;

use crate::error::CatalogError;
use crate::groups::group_teardown;
use crate::models::{non_empty, require_nonblank, Act, ActContent, Jurisdiction};
use crate::sections::section_teardown;
use crate::store::{keys, put_doc, DocumentStore};

/// Parameters for creating an Act.
#[derive(Debug, Clone)]
pub struct NewAct {
    pub jurisdiction: Jurisdiction,
    pub name: String,
    pub content: Option<String>,
}

/// What a cascading Act delete removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActRemoval {
    pub groups: usize,
    pub sections: usize,
}

/// CRUD and search over Acts.
pub struct ActRepository {
    store: Arc<DocumentStore>,
}

impl ActRepository {
    /// Create a repository over the shared document store.
    #[must_use]
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// List every Act of a jurisdiction, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] if storage fails.
    pub async fn list(&self, jurisdiction: Jurisdiction) -> Result<Vec<Act>, CatalogError> {
        let mut acts: Vec<Act> = self
            .store
            .scan::<Act>(keys::ACTS)
            .await?
            .into_iter()
            .filter(|a| a.jurisdiction == jurisdiction)
            .collect();
        sort_by_name(&mut acts);
        Ok(acts)
    }

    /// Fetch one Act.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if no Act has this id.
    /// - [`CatalogError::Store`] if storage fails.
    pub async fn get(&self, id: Uuid) -> Result<Act, CatalogError> {
        self.store
            .get::<Act>(&keys::act(id))
            .await?
            .ok_or_else(|| CatalogError::NotFound {
                kind: "act",
                id: id.to_string(),
            })
    }

    /// Fetch only the name and body of an Act.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub async fn content(&self, id: Uuid) -> Result<ActContent, CatalogError> {
        let act = self.get(id).await?;
        Ok(ActContent {
            name: act.name,
            content: act.content,
        })
    }

    /// Insert a new Act with a fresh id.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidRequest`] if `name` is blank.
    /// - [`CatalogError::Store`] if storage fails.
    pub async fn create(&self, new: NewAct) -> Result<Act, CatalogError> {
        let name = require_nonblank("name", &new.name)?;
        let now = Utc::now();
        let act = Act {
            id: Uuid::new_v4(),
            jurisdiction: new.jurisdiction,
            name,
            content: new.content,
            created_at: now,
            updated_at: now,
        };

        self.store
            .apply(vec![put_doc(keys::act(act.id), &act)?])
            .await?;

        info!(act_id = %act.id, jurisdiction = %act.jurisdiction, "act created");
        Ok(act)
    }

    /// Update an Act in place. An absent field keeps its stored value, and a
    /// blank name is ignored.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if no Act has this id.
    /// - [`CatalogError::Store`] if storage fails.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        content: Option<String>,
    ) -> Result<Act, CatalogError> {
        let _guard = self.store.write_lock().await;
        let mut act = self.get(id).await?;

        if let Some(name) = non_empty(name) {
            act.name = name.trim().to_owned();
        }
        if let Some(content) = content {
            act.content = Some(content);
        }
        act.updated_at = Utc::now();

        self.store.apply(vec![put_doc(keys::act(id), &act)?]).await?;

        info!(act_id = %id, "act updated");
        Ok(act)
    }

    /// Delete an Act together with its Groups and all their Sections.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if no Act has this id.
    /// - [`CatalogError::Store`] if storage fails; nothing is removed then.
    pub async fn delete(&self, id: Uuid) -> Result<ActRemoval, CatalogError> {
        let _guard = self.store.write_lock().await;
        if !self.store.exists(&keys::act(id)).await? {
            return Err(CatalogError::NotFound {
                kind: "act",
                id: id.to_string(),
            });
        }

        let mut ops: Vec<WriteOp> = Vec::new();
        let mut removal = ActRemoval::default();

        removal.sections += section_teardown(&self.store, &keys::act_sections(id), &mut ops).await?;

        let groups_prefix = keys::act_groups(id);
        for group_id in self.store.children(&groups_prefix).await? {
            let Ok(group_id) = group_id.parse::<Uuid>() else {
                continue;
            };
            removal.sections += group_teardown(&self.store, group_id, &mut ops).await?;
            ops.push(WriteOp::delete(format!("{groups_prefix}{group_id}")));
            removal.groups += 1;
        }

        ops.push(WriteOp::delete(keys::act(id)));
        self.store.apply(ops).await?;

        info!(
            act_id = %id,
            groups = removal.groups,
            sections = removal.sections,
            "act deleted with its groups and sections"
        );
        Ok(removal)
    }

    /// Case-insensitive literal substring search over Act names.
    ///
    /// The pattern is never interpreted as a regular expression, and an
    /// empty pattern matches every Act of the jurisdiction.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] if storage fails.
    pub async fn search_by_name(
        &self,
        jurisdiction: Jurisdiction,
        pattern: &str,
    ) -> Result<Vec<Act>, CatalogError> {
        let needle = pattern.trim().to_lowercase();
        let mut acts = self.list(jurisdiction).await?;
        acts.retain(|a| a.name.to_lowercase().contains(&needle));
        Ok(acts)
    }
}

impl std::fmt::Debug for ActRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActRepository").finish_non_exhaustive()
    }
}

fn sort_by_name(acts: &mut [Act]) {
    acts.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{failing_store, make_store};

    fn new_act(name: &str, jurisdiction: Jurisdiction) -> NewAct {
        NewAct {
            jurisdiction,
            name: name.to_owned(),
            content: Some(format!("{name} body")),
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_same_fields() {
        let repo = ActRepository::new(make_store());
        let created = repo
            .create(new_act("Maharashtra Stamp Act", Jurisdiction::Maharashtra))
            .await
            .unwrap();

        let fetched = repo.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Maharashtra Stamp Act");
        assert_eq!(fetched.content.as_deref(), Some("Maharashtra Stamp Act body"));
    }

    #[tokio::test]
    async fn create_allocates_distinct_ids() {
        let repo = ActRepository::new(make_store());
        let a = repo.create(new_act("A", Jurisdiction::Indian)).await.unwrap();
        let b = repo.create(new_act("A", Jurisdiction::Indian)).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let repo = ActRepository::new(make_store());
        let err = repo
            .create(new_act("   ", Jurisdiction::Indian))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn get_update_delete_unknown_id_is_not_found() {
        let repo = ActRepository::new(make_store());
        let id = Uuid::new_v4();
        assert!(matches!(repo.get(id).await, Err(CatalogError::NotFound { .. })));
        assert!(matches!(
            repo.update(id, Some("x".to_owned()), None).await,
            Err(CatalogError::NotFound { .. })
        ));
        assert!(matches!(repo.delete(id).await, Err(CatalogError::NotFound { .. })));
    }

    #[tokio::test]
    async fn update_keeps_absent_fields() {
        let repo = ActRepository::new(make_store());
        let act = repo
            .create(new_act("Police Act", Jurisdiction::Maharashtra))
            .await
            .unwrap();

        let updated = repo
            .update(act.id, None, Some("amended".to_owned()))
            .await
            .unwrap();
        assert_eq!(updated.name, "Police Act");
        assert_eq!(updated.content.as_deref(), Some("amended"));
        assert_eq!(repo.get(act.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn list_is_scoped_to_jurisdiction_and_sorted() {
        let repo = ActRepository::new(make_store());
        repo.create(new_act("zoning act", Jurisdiction::Maharashtra)).await.unwrap();
        repo.create(new_act("Abkari Act", Jurisdiction::Maharashtra)).await.unwrap();
        repo.create(new_act("Contract Act", Jurisdiction::Indian)).await.unwrap();

        let names: Vec<String> = repo
            .list(Jurisdiction::Maharashtra)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Abkari Act", "zoning act"]);
    }

    #[tokio::test]
    async fn search_matches_substring_in_any_case() {
        let repo = ActRepository::new(make_store());
        repo.create(new_act("Income TAX Act", Jurisdiction::Indian)).await.unwrap();
        repo.create(new_act("Taxation Laws", Jurisdiction::Indian)).await.unwrap();
        repo.create(new_act("Contract Act", Jurisdiction::Indian)).await.unwrap();
        repo.create(new_act("Profession Tax Act", Jurisdiction::Maharashtra)).await.unwrap();

        let names: Vec<String> = repo
            .search_by_name(Jurisdiction::Indian, "tax")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Income TAX Act", "Taxation Laws"]);
    }

    #[tokio::test]
    async fn search_treats_regex_metacharacters_literally() {
        let repo = ActRepository::new(make_store());
        repo.create(new_act("Act (Amendment) 2020", Jurisdiction::Indian)).await.unwrap();
        repo.create(new_act("Other Act", Jurisdiction::Indian)).await.unwrap();

        let hits = repo.search_by_name(Jurisdiction::Indian, ".*").await.unwrap();
        assert!(hits.is_empty());
        let hits = repo.search_by_name(Jurisdiction::Indian, "(amendment)").await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn empty_search_pattern_matches_all() {
        let repo = ActRepository::new(make_store());
        repo.create(new_act("One", Jurisdiction::Indian)).await.unwrap();
        repo.create(new_act("Two", Jurisdiction::Indian)).await.unwrap();
        let hits = repo.search_by_name(Jurisdiction::Indian, "").await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn failed_delete_batch_leaves_act_in_place() {
        let (store, backend) = failing_store();
        let repo = ActRepository::new(store);
        let act = repo.create(new_act("Fragile Act", Jurisdiction::Indian)).await.unwrap();

        backend.fail_batches(true);
        assert!(matches!(repo.delete(act.id).await, Err(CatalogError::Store(_))));
        assert_eq!(repo.get(act.id).await.unwrap().name, "Fragile Act");

        backend.fail_batches(false);
        repo.delete(act.id).await.unwrap();
        assert!(matches!(repo.get(act.id).await, Err(CatalogError::NotFound { .. })));
    }
}
