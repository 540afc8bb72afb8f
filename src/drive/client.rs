//! Google Drive v3 adapter
//!
//! Talks to the REST endpoints directly with the shared reqwest client.
//! Authentication happens elsewhere; this only needs a valid bearer token.

use super::{FileUpdate, RemoteContent, RemoteItem, RemoteStore, FOLDER_MIME_TYPE};
use crate::ai::http_client::drive_client;
use crate::config::ReorgConfig;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,size,modifiedTime,parents)";
const PAGE_SIZE: &str = "1000";
/// Only the head of a text file is useful as classifier context
const DOWNLOAD_RANGE: &str = "bytes=0-16383";

pub struct DriveStore {
    client: Client,
    base_url: String,
    access_token: String,
    root_id: String,
}

impl DriveStore {
    pub fn new(access_token: impl Into<String>) -> Self {
        let defaults = ReorgConfig::default();
        Self {
            client: drive_client().clone(),
            base_url: defaults.drive_base_url,
            access_token: access_token.into(),
            root_id: defaults.root_folder_id,
        }
    }

    pub fn from_config(config: &ReorgConfig, access_token: impl Into<String>) -> Self {
        Self::new(access_token)
            .with_base_url(&config.drive_base_url)
            .with_root_id(&config.root_folder_id)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_root_id(mut self, root_id: &str) -> Self {
        self.root_id = root_id.to_string();
        self
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.access_token)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        check_status(response).await
    }

    async fn download_text(&self, item: &RemoteItem) -> Result<String, StoreError> {
        let request = self
            .client
            .get(format!("{}/{}", self.files_url(), item.id))
            .query(&[("alt", "media")])
            .header(reqwest::header::RANGE, DOWNLOAD_RANGE);
        let bytes = self
            .send(request)
            .await?
            .bytes()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn export_text(&self, item: &RemoteItem, export_mime: &str) -> Result<String, StoreError> {
        let request = self
            .client
            .get(format!("{}/{}/export", self.files_url(), item.id))
            .query(&[("mimeType", export_mime)]);
        self.send(request)
            .await?
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(StoreError::Unauthorized);
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(StoreError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

/// Quote a value for use inside a Drive search query
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Export format for Google-native documents, if they have a textual one
fn export_mime_for(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "application/vnd.google-apps.document" => Some("text/plain"),
        "application/vnd.google-apps.spreadsheet" => Some("text/csv"),
        "application/vnd.google-apps.presentation" => Some("text/plain"),
        _ => None,
    }
}

fn is_text_like(mime_type: &str) -> bool {
    mime_type.starts_with("text/")
        || matches!(
            mime_type,
            "application/json"
                | "application/xml"
                | "application/javascript"
                | "application/x-yaml"
                | "application/sql"
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    /// Drive reports sizes as decimal strings
    size: Option<String>,
    modified_time: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
}

impl From<DriveFile> for RemoteItem {
    fn from(file: DriveFile) -> Self {
        let modified_at = file
            .modified_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.timestamp_millis())
            .unwrap_or(0);
        Self {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            size: file.size.and_then(|s| s.parse().ok()).unwrap_or(0),
            modified_at,
            parents: file.parents,
        }
    }
}

#[derive(Deserialize)]
struct CreatedFile {
    id: String,
}

#[async_trait]
impl RemoteStore for DriveStore {
    fn root_id(&self) -> &str {
        &self.root_id
    }

    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteItem>, StoreError> {
        let query = format!(
            "'{}' in parents and trashed = false",
            escape_query_value(folder_id)
        );
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(self.files_url()).query(&[
                ("q", query.as_str()),
                ("fields", LIST_FIELDS),
                ("pageSize", PAGE_SIZE),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: FileList = self
                .send(request)
                .await?
                .json()
                .await
                .map_err(|e| StoreError::Decode(e.to_string()))?;

            items.extend(page.files.into_iter().map(RemoteItem::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(folder_id, count = items.len(), "Listed folder");
        Ok(items)
    }

    async fn find_folder_by_name(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<String>, StoreError> {
        let query = format!(
            "name = '{}' and '{}' in parents and mimeType = '{}' and trashed = false",
            escape_query_value(name),
            escape_query_value(parent_id),
            FOLDER_MIME_TYPE
        );
        let request = self.client.get(self.files_url()).query(&[
            ("q", query.as_str()),
            ("fields", "files(id)"),
            ("pageSize", "1"),
        ]);

        let list: FileList = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, StoreError> {
        let request = self
            .client
            .post(self.files_url())
            .query(&[("fields", "id")])
            .json(&serde_json::json!({
                "name": name,
                "mimeType": FOLDER_MIME_TYPE,
                "parents": [parent_id],
            }));

        let created: CreatedFile = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        tracing::debug!(name, parent_id, folder_id = %created.id, "Created folder");
        Ok(created.id)
    }

    async fn update_file(&self, file_id: &str, update: &FileUpdate) -> Result<(), StoreError> {
        let mut params: Vec<(&str, String)> = vec![("fields", "id,name,parents".to_string())];
        if let Some(parent) = &update.add_parent {
            params.push(("addParents", parent.clone()));
        }
        if !update.remove_parents.is_empty() {
            params.push(("removeParents", update.remove_parents.join(",")));
        }

        let mut body = serde_json::Map::new();
        if let Some(name) = &update.name {
            body.insert("name".to_string(), serde_json::Value::String(name.clone()));
        }

        let request = self
            .client
            .patch(format!("{}/{}", self.files_url(), file_id))
            .query(&params)
            .json(&body);

        self.send(request).await?;
        Ok(())
    }

    async fn get_content(&self, item: &RemoteItem) -> Result<RemoteContent, StoreError> {
        if let Some(export_mime) = export_mime_for(&item.mime_type) {
            return self.export_text(item, export_mime).await.map(RemoteContent::Text);
        }
        if is_text_like(&item.mime_type) {
            return self.download_text(item).await.map(RemoteContent::Text);
        }
        Ok(RemoteContent::Binary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn store_for(server: &mockito::ServerGuard) -> DriveStore {
        DriveStore::new("token-123").with_base_url(&server.url())
    }

    fn item(id: &str, mime_type: &str) -> RemoteItem {
        RemoteItem {
            id: id.to_string(),
            name: format!("{}.bin", id),
            mime_type: mime_type.to_string(),
            size: 10,
            modified_at: 0,
            parents: vec!["root".to_string()],
        }
    }

    #[test]
    fn test_escape_query_value() {
        assert_eq!(escape_query_value("Bob's Files"), "Bob\\'s Files");
        assert_eq!(escape_query_value("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_drive_file_conversion() {
        let file: DriveFile = serde_json::from_str(
            r#"{"id":"f1","name":"a.txt","mimeType":"text/plain","size":"2048",
                "modifiedTime":"2024-01-15T10:00:00.000Z","parents":["p1"]}"#,
        )
        .unwrap();
        let item = RemoteItem::from(file);
        assert_eq!(item.size, 2048);
        assert_eq!(item.modified_at, 1_705_312_800_000);
        assert_eq!(item.parents, vec!["p1".to_string()]);
    }

    #[tokio::test]
    async fn test_list_children() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/drive/v3/files")
            .match_header("authorization", "Bearer token-123")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "'folder-1' in parents and trashed = false".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"files":[
                    {"id":"a","name":"a.txt","mimeType":"text/plain","size":"5","parents":["folder-1"]},
                    {"id":"b","name":"Sub","mimeType":"application/vnd.google-apps.folder","parents":["folder-1"]}
                ]}"#,
            )
            .create_async()
            .await;

        let items = store_for(&server).list_children("folder-1").await.unwrap();
        mock.assert_async().await;
        assert_eq!(items.len(), 2);
        assert!(!items[0].is_folder());
        assert!(items[1].is_folder());
    }

    #[tokio::test]
    async fn test_unauthorized_is_distinguishable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/drive/v3/files")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error":{"code":401}}"#)
            .create_async()
            .await;

        let err = store_for(&server).list_children("root").await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized));
    }

    #[tokio::test]
    async fn test_find_folder_by_name() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/drive/v3/files")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "name = 'Work' and 'root' in parents and mimeType = 'application/vnd.google-apps.folder' and trashed = false".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"files":[{"id":"work-id"}]}"#)
            .create_async()
            .await;

        let found = store_for(&server)
            .find_folder_by_name("Work", "root")
            .await
            .unwrap();
        assert_eq!(found.as_deref(), Some("work-id"));
    }

    #[tokio::test]
    async fn test_find_folder_missing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/drive/v3/files")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"files":[]}"#)
            .create_async()
            .await;

        let found = store_for(&server)
            .find_folder_by_name("Nope", "root")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_create_folder() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/drive/v3/files")
            .match_query(Matcher::UrlEncoded("fields".into(), "id".into()))
            .match_body(Matcher::Json(serde_json::json!({
                "name": "2024",
                "mimeType": FOLDER_MIME_TYPE,
                "parents": ["work-id"],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"new-folder"}"#)
            .create_async()
            .await;

        let id = store_for(&server)
            .create_folder("2024", "work-id")
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(id, "new-folder");
    }

    #[tokio::test]
    async fn test_update_file_with_reparent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/drive/v3/files/f1")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("addParents".into(), "target".into()),
                Matcher::UrlEncoded("removeParents".into(), "p1,p2".into()),
            ]))
            .match_body(Matcher::Json(serde_json::json!({"name": "Invoice.pdf"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"f1"}"#)
            .create_async()
            .await;

        let update = FileUpdate {
            name: Some("Invoice.pdf".to_string()),
            add_parent: Some("target".to_string()),
            remove_parents: vec!["p1".to_string(), "p2".to_string()],
        };
        store_for(&server).update_file("f1", &update).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_failure_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PATCH", "/drive/v3/files/f1")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let update = FileUpdate {
            name: Some("x".to_string()),
            ..FileUpdate::default()
        };
        let err = store_for(&server).update_file("f1", &update).await.unwrap_err();
        assert!(matches!(err, StoreError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_get_content_exports_google_docs() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/drive/v3/files/doc1/export")
            .match_query(Matcher::UrlEncoded("mimeType".into(), "text/plain".into()))
            .with_status(200)
            .with_body("Meeting notes")
            .create_async()
            .await;

        let content = store_for(&server)
            .get_content(&item("doc1", "application/vnd.google-apps.document"))
            .await
            .unwrap();
        assert_eq!(content, RemoteContent::Text("Meeting notes".to_string()));
    }

    #[tokio::test]
    async fn test_get_content_downloads_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/drive/v3/files/t1")
            .match_query(Matcher::UrlEncoded("alt".into(), "media".into()))
            .with_status(206)
            .with_body("hello world")
            .create_async()
            .await;

        let content = store_for(&server)
            .get_content(&item("t1", "text/markdown"))
            .await
            .unwrap();
        assert_eq!(content, RemoteContent::Text("hello world".to_string()));
    }

    #[tokio::test]
    async fn test_get_content_binary_makes_no_request() {
        let server = mockito::Server::new_async().await;
        let content = store_for(&server)
            .get_content(&item("img", "image/jpeg"))
            .await
            .unwrap();
        assert_eq!(content, RemoteContent::Binary);
    }
}
