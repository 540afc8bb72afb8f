//! Remote file store boundary
//!
//! The store models folders as parent links (Drive style): a file can have
//! several parents and moving it means swapping parent ids. Every call is
//! made with an already-established credential.

mod client;
mod content;
#[cfg(test)]
pub(crate) mod fake;

pub use client::DriveStore;
pub use content::SnippetProvider;

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// MIME type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Metadata for a file or folder as listed by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteItem {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Last modification time (unix timestamp ms)
    pub modified_at: i64,
    pub parents: Vec<String>,
}

impl RemoteItem {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// Fields to change on a file; `None` / empty leaves them alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileUpdate {
    pub name: Option<String>,
    pub add_parent: Option<String>,
    pub remove_parents: Vec<String>,
}

impl FileUpdate {
    pub fn is_move(&self) -> bool {
        self.add_parent.is_some()
    }
}

/// File content as far as the classifier is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteContent {
    Text(String),
    /// Not representable as text (images, archives, ...)
    Binary,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Identifier of the store's root folder
    fn root_id(&self) -> &str;

    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteItem>, StoreError>;

    /// Folder with exactly `name` directly under `parent_id`, if any
    async fn find_folder_by_name(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<String>, StoreError>;

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, StoreError>;

    async fn update_file(&self, file_id: &str, update: &FileUpdate) -> Result<(), StoreError>;

    async fn get_content(&self, item: &RemoteItem) -> Result<RemoteContent, StoreError>;
}
