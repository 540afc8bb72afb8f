//! Folder Path Resolver
//!
//! Turns a logical path like `Work/Projects/2024` into a store folder id,
//! finding or creating one folder per segment. Every resolved prefix is
//! cached for the lifetime of the resolver, so a prefix is created at most
//! once per session.

use crate::drive::RemoteStore;
use crate::error::{ReorgError, StoreError};
use std::collections::HashMap;
use std::sync::Arc;

/// Normalized path prefix (`"Work/Projects"`) → folder id
#[derive(Debug, Clone, Default)]
pub struct FolderPathCache {
    entries: HashMap<String, String>,
}

impl FolderPathCache {
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.entries.get(prefix).map(String::as_str)
    }

    fn insert(&mut self, prefix: String, folder_id: String) {
        self.entries.insert(prefix, folder_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split on `/`, trim each segment, drop empty and `.` segments
pub fn normalize_path(path: &str) -> Vec<&str> {
    path.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect()
}

/// Whether `path` normalizes to the root folder
pub fn is_root_path(path: &str) -> bool {
    normalize_path(path).is_empty()
}

pub struct FolderPathResolver {
    store: Arc<dyn RemoteStore>,
    cache: FolderPathCache,
}

impl FolderPathResolver {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            cache: FolderPathCache::default(),
        }
    }

    pub fn cache(&self) -> &FolderPathCache {
        &self.cache
    }

    /// Resolve `path` to a folder id, creating missing segments.
    ///
    /// Segments are walked strictly in order. On failure, prefixes resolved
    /// before the failing segment stay cached since those folders exist.
    pub async fn resolve(&mut self, path: &str) -> Result<String, ReorgError> {
        let segments = normalize_path(path);
        let mut parent_id = self.store.root_id().to_string();
        let mut prefix = String::new();

        for segment in segments {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);

            if let Some(cached) = self.cache.get(&prefix) {
                parent_id = cached.to_string();
                continue;
            }

            let folder_id = self
                .find_or_create(segment, &parent_id)
                .await
                .map_err(|source| ReorgError::PathResolutionFailure {
                    path: path.to_string(),
                    source,
                })?;

            self.cache.insert(prefix.clone(), folder_id.clone());
            parent_id = folder_id;
        }

        Ok(parent_id)
    }

    async fn find_or_create(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<String, StoreError> {
        if let Some(existing) = self.store.find_folder_by_name(name, parent_id).await? {
            tracing::debug!(folder = name, folder_id = %existing, "Reusing existing folder");
            return Ok(existing);
        }
        let created = self.store.create_folder(name, parent_id).await?;
        tracing::debug!(folder = name, folder_id = %created, "Created folder");
        Ok(created)
    }
}
