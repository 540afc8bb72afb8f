//! Builds file descriptors for a folder selection, including the bounded
//! content snippet the classifier gets as context.

use super::{RemoteContent, RemoteItem, RemoteStore};
use crate::error::StoreError;
use crate::models::{truncate_chars, FileDescriptor, MAX_SNIPPET_CHARS};
use std::sync::Arc;

pub struct SnippetProvider {
    store: Arc<dyn RemoteStore>,
    snippet_chars: usize,
}

impl SnippetProvider {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            snippet_chars: MAX_SNIPPET_CHARS,
        }
    }

    /// Snippet length, capped at `MAX_SNIPPET_CHARS`
    pub fn with_snippet_chars(mut self, chars: usize) -> Self {
        self.snippet_chars = chars.min(MAX_SNIPPET_CHARS);
        self
    }

    /// Describe every non-folder item directly inside `folder_id`.
    ///
    /// Content is fetched one file at a time. A file whose content cannot be
    /// read still gets a descriptor, just without a snippet. A rejected
    /// credential aborts the whole collection.
    pub async fn collect(&self, folder_id: &str) -> Result<Vec<FileDescriptor>, StoreError> {
        let items = self.store.list_children(folder_id).await?;
        let mut descriptors = Vec::with_capacity(items.len());

        for item in items.into_iter().filter(|i| !i.is_folder()) {
            let snippet = match self.store.get_content(&item).await {
                Ok(RemoteContent::Text(text)) => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        Some(truncate_chars(trimmed, self.snippet_chars))
                    }
                }
                Ok(RemoteContent::Binary) => None,
                Err(StoreError::Unauthorized) => return Err(StoreError::Unauthorized),
                Err(e) => {
                    tracing::warn!(file_id = %item.id, error = %e, "Could not read file content");
                    None
                }
            };

            let mut descriptor = FileDescriptor::from(item);
            descriptor.content_snippet = snippet;
            descriptors.push(descriptor);
        }

        tracing::info!(folder_id, files = descriptors.len(), "Collected selection");
        Ok(descriptors)
    }
}

impl From<RemoteItem> for FileDescriptor {
    fn from(item: RemoteItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            size: item.size,
            mime_type: item.mime_type,
            last_modified: item.modified_at,
            content_snippet: None,
            parents: item.parents,
        }
    }
}
