//! In-memory store that records every call, for tests

use super::{FileUpdate, RemoteContent, RemoteItem, RemoteStore, FOLDER_MIME_TYPE};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCall {
    pub name: String,
    pub parent_id: String,
    pub folder_id: String,
}

#[derive(Default)]
struct Inner {
    items: HashMap<String, RemoteItem>,
    order: Vec<String>,
    content: HashMap<String, RemoteContent>,
    next_id: usize,
    create_calls: Vec<CreateCall>,
    find_calls: usize,
    update_calls: Vec<(String, FileUpdate)>,
    fail_updates: HashSet<String>,
    fail_create_names: HashSet<String>,
    unauthorized: bool,
}

pub struct FakeStore {
    inner: Mutex<Inner>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn add_file(&self, id: &str, name: &str, parent: &str, content: RemoteContent) {
        let mut inner = self.inner.lock().unwrap();
        let mime_type = match content {
            RemoteContent::Text(_) => "text/plain",
            RemoteContent::Binary => "image/jpeg",
        };
        inner.items.insert(
            id.to_string(),
            RemoteItem {
                id: id.to_string(),
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                size: 42,
                modified_at: 1_700_000_000_000,
                parents: vec![parent.to_string()],
            },
        );
        inner.order.push(id.to_string());
        inner.content.insert(id.to_string(), content);
    }

    /// Pre-existing folder, as if created outside this session
    pub fn add_folder(&self, id: &str, name: &str, parent: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.items.insert(
            id.to_string(),
            RemoteItem {
                id: id.to_string(),
                name: name.to_string(),
                mime_type: FOLDER_MIME_TYPE.to_string(),
                size: 0,
                modified_at: 0,
                parents: vec![parent.to_string()],
            },
        );
        inner.order.push(id.to_string());
    }

    pub fn fail_update_for(&self, file_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_updates
            .insert(file_id.to_string());
    }

    pub fn fail_create_for(&self, folder_name: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_create_names
            .insert(folder_name.to_string());
    }

    pub fn set_unauthorized(&self, unauthorized: bool) {
        self.inner.lock().unwrap().unauthorized = unauthorized;
    }

    pub fn create_calls(&self) -> Vec<CreateCall> {
        self.inner.lock().unwrap().create_calls.clone()
    }

    pub fn find_calls(&self) -> usize {
        self.inner.lock().unwrap().find_calls
    }

    pub fn update_calls(&self) -> Vec<(String, FileUpdate)> {
        self.inner.lock().unwrap().update_calls.clone()
    }

    pub fn item(&self, id: &str) -> Option<RemoteItem> {
        self.inner.lock().unwrap().items.get(id).cloned()
    }

    /// Total number of calls that touched the store
    pub fn call_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.create_calls.len() + inner.find_calls + inner.update_calls.len()
    }

    fn check_auth(inner: &Inner) -> Result<(), StoreError> {
        if inner.unauthorized {
            Err(StoreError::Unauthorized)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    fn root_id(&self) -> &str {
        "root"
    }

    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteItem>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Self::check_auth(&inner)?;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.items.get(id))
            .filter(|item| item.parents.iter().any(|p| p == folder_id))
            .cloned()
            .collect())
    }

    async fn find_folder_by_name(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_auth(&inner)?;
        inner.find_calls += 1;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.items.get(id))
            .find(|item| {
                item.is_folder() && item.name == name && item.parents.iter().any(|p| p == parent_id)
            })
            .map(|item| item.id.clone()))
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_auth(&inner)?;
        if inner.fail_create_names.contains(name) {
            return Err(StoreError::Api {
                status: 500,
                message: format!("cannot create {}", name),
            });
        }
        inner.next_id += 1;
        let folder_id = format!("folder-{}", inner.next_id);
        inner.create_calls.push(CreateCall {
            name: name.to_string(),
            parent_id: parent_id.to_string(),
            folder_id: folder_id.clone(),
        });
        inner.items.insert(
            folder_id.clone(),
            RemoteItem {
                id: folder_id.clone(),
                name: name.to_string(),
                mime_type: FOLDER_MIME_TYPE.to_string(),
                size: 0,
                modified_at: 0,
                parents: vec![parent_id.to_string()],
            },
        );
        inner.order.push(folder_id.clone());
        Ok(folder_id)
    }

    async fn update_file(&self, file_id: &str, update: &FileUpdate) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_auth(&inner)?;
        inner
            .update_calls
            .push((file_id.to_string(), update.clone()));
        if inner.fail_updates.contains(file_id) {
            return Err(StoreError::Api {
                status: 403,
                message: "insufficient permissions".to_string(),
            });
        }
        let item = inner
            .items
            .get_mut(file_id)
            .ok_or_else(|| StoreError::Api {
                status: 404,
                message: format!("file not found: {}", file_id),
            })?;
        if let Some(name) = &update.name {
            item.name = name.clone();
        }
        item.parents.retain(|p| !update.remove_parents.contains(p));
        if let Some(parent) = &update.add_parent {
            item.parents.push(parent.clone());
        }
        Ok(())
    }

    async fn get_content(&self, item: &RemoteItem) -> Result<RemoteContent, StoreError> {
        let inner = self.inner.lock().unwrap();
        Self::check_auth(&inner)?;
        inner
            .content
            .get(&item.id)
            .cloned()
            .ok_or_else(|| StoreError::Api {
                status: 404,
                message: format!("no content for {}", item.id),
            })
    }
}
