//! Remote Mutation Applier: one rename (and optional reparent) per file.
//! Failures are returned as-is; nothing here retries.

use crate::drive::{FileUpdate, RemoteStore};
use crate::error::ReorgError;
use std::sync::Arc;

pub struct MutationApplier {
    store: Arc<dyn RemoteStore>,
}

impl MutationApplier {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    pub async fn apply_update(
        &self,
        file_id: &str,
        new_name: &str,
        current_parents: &[String],
        target_folder_id: Option<&str>,
    ) -> Result<(), ReorgError> {
        let update = build_update(new_name, current_parents, target_folder_id);
        tracing::debug!(
            file_id,
            name = new_name,
            moved = update.is_move(),
            "Applying file update"
        );
        self.store
            .update_file(file_id, &update)
            .await
            .map_err(|source| ReorgError::MutationFailure {
                file_id: file_id.to_string(),
                source,
            })
    }
}

/// Always renames. Reparents only when the target is not already a parent,
/// in which case every current parent is removed.
pub fn build_update(
    new_name: &str,
    current_parents: &[String],
    target_folder_id: Option<&str>,
) -> FileUpdate {
    let mut update = FileUpdate {
        name: Some(new_name.to_string()),
        ..FileUpdate::default()
    };
    if let Some(target) = target_folder_id {
        if !current_parents.iter().any(|p| p == target) {
            update.add_parent = Some(target.to_string());
            update.remove_parents = current_parents.to_vec();
        }
    }
    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::fake::FakeStore;
    use crate::drive::RemoteContent;
    use crate::error::StoreError;

    fn parents(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_update_rename_only() {
        let update = build_update("New.txt", &parents(&["root"]), None);
        assert_eq!(update.name.as_deref(), Some("New.txt"));
        assert!(!update.is_move());
        assert!(update.remove_parents.is_empty());
    }

    #[test]
    fn test_build_update_target_already_parent() {
        let update = build_update("New.txt", &parents(&["a", "b"]), Some("b"));
        assert!(!update.is_move());
        assert!(update.remove_parents.is_empty());
    }

    #[test]
    fn test_build_update_reparent_removes_all() {
        let update = build_update("New.txt", &parents(&["a", "b"]), Some("c"));
        assert_eq!(update.add_parent.as_deref(), Some("c"));
        assert_eq!(update.remove_parents, parents(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_apply_update_moves_file() {
        let store = Arc::new(FakeStore::new());
        store.add_folder("dest", "Dest", "root");
        store.add_file("f1", "old.txt", "root", RemoteContent::Text("x".into()));

        let applier = MutationApplier::new(store.clone());
        applier
            .apply_update("f1", "new.txt", &parents(&["root"]), Some("dest"))
            .await
            .unwrap();

        let item = store.item("f1").unwrap();
        assert_eq!(item.name, "new.txt");
        assert_eq!(item.parents, parents(&["dest"]));
    }

    #[tokio::test]
    async fn test_apply_update_failure_is_not_retried() {
        let store = Arc::new(FakeStore::new());
        store.add_file("f1", "old.txt", "root", RemoteContent::Text("x".into()));
        store.fail_update_for("f1");

        let applier = MutationApplier::new(store.clone());
        let err = applier
            .apply_update("f1", "new.txt", &parents(&["root"]), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReorgError::MutationFailure { ref file_id, source: StoreError::Api { status: 403, .. } }
                if file_id == "f1"
        ));
        assert_eq!(store.update_calls().len(), 1);
    }
}
