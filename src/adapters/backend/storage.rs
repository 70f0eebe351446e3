//! Object storage API
//!
//! Listing is `POST {base}/storage/v1/object/list/{bucket}` with a JSON body
//! of `prefix`, `limit` and `offset`. Entries whose `id` is null are folders.
//! Objects are downloaded with `GET {base}/storage/v1/object/{bucket}/{path}`.

use super::client::BackendClient;
use super::traits::{ObjectStore, StorageEntry};
use crate::domain::BackendError;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
    id: Option<String>,
    #[serde(default)]
    metadata: Option<ObjectMetadata>,
}

#[derive(Debug, Deserialize)]
struct ObjectMetadata {
    #[serde(default)]
    size: Option<u64>,
}

/// [`ObjectStore`] backed by the storage API, scoped to one bucket
#[derive(Clone)]
pub struct StorageApi {
    client: BackendClient,
    bucket: String,
}

impl StorageApi {
    pub fn new(client: BackendClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for StorageApi {
    async fn list(
        &self,
        prefix: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<StorageEntry>, BackendError> {
        let url = self
            .client
            .endpoint(["storage", "v1", "object", "list", self.bucket.as_str()]);
        let body = json!({
            "prefix": prefix,
            "limit": limit,
            "offset": offset,
            "sortBy": { "column": "name", "order": "asc" },
        });

        let response = self
            .client
            .send(self.client.request(Method::POST, url).json(&body))
            .await?;
        let listed: Vec<ListedObject> = response.json().await.map_err(|e| {
            BackendError::InvalidResponse(format!("listing '{prefix}': {e}"))
        })?;

        Ok(listed
            .into_iter()
            .map(|object| StorageEntry {
                is_folder: object.id.is_none(),
                size_bytes: object.metadata.and_then(|m| m.size),
                name: object.name,
            })
            .collect())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        let segments = ["storage", "v1", "object", self.bucket.as_str()]
            .into_iter()
            .chain(path.split('/').filter(|s| !s.is_empty()));
        let url = self.client.endpoint(segments);

        let response = self.client.send(self.client.request(Method::GET, url)).await?;
        let bytes = response.bytes().await.map_err(|e| {
            BackendError::ConnectionFailed(format!("reading '{path}': {e}"))
        })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::backend::client::tests::config;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_list_marks_folders() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/object/list/patient-files")
            .match_body(Matcher::PartialJson(json!({
                "prefix": "patients/p1",
                "limit": 100,
                "offset": 0,
            })))
            .with_status(200)
            .with_body(
                r#"[
                    {"name": "labs", "id": null, "metadata": null},
                    {"name": "id-card.png", "id": "obj-1", "metadata": {"size": 2048, "mimetype": "image/png"}}
                ]"#,
            )
            .create_async()
            .await;

        let client = BackendClient::new(&config(&server.url())).unwrap();
        let store = StorageApi::new(client, "patient-files");
        let entries = store.list("patients/p1", 0, 100).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            entries,
            vec![StorageEntry::folder("labs"), StorageEntry::file("id-card.png", 2048)]
        );
    }

    #[tokio::test]
    async fn test_download_returns_bytes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/storage/v1/object/patient-files/patients/p1/id-card.png")
            .with_status(200)
            .with_body(b"PNGDATA".as_slice())
            .create_async()
            .await;

        let client = BackendClient::new(&config(&server.url())).unwrap();
        let store = StorageApi::new(client, "patient-files");
        let bytes = store.download("patients/p1/id-card.png").await.unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, b"PNGDATA");
    }

    #[tokio::test]
    async fn test_download_missing_object() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/storage/v1/object/patient-files/gone.pdf")
            .with_status(404)
            .with_body(r#"{"error": "not_found"}"#)
            .create_async()
            .await;

        let client = BackendClient::new(&config(&server.url())).unwrap();
        let store = StorageApi::new(client, "patient-files");
        let err = store.download("gone.pdf").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
        assert!(!err.is_transient());
    }
}
