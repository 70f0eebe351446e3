//! Row access through the backend's REST endpoint
//!
//! `GET {base}/rest/v1/{table}?select=*&offset=&limit=` returns a JSON array
//! of row objects. Counts use `HEAD` with `Prefer: count=exact` and read the
//! total from `Content-Range: a-b/total`.

use super::client::BackendClient;
use super::traits::RowSource;
use crate::domain::{BackendError, ExportedRow, TableName};
use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::Method;
use serde_json::{Map, Value};

/// [`RowSource`] backed by the REST endpoint
#[derive(Clone)]
pub struct RestRowSource {
    client: BackendClient,
    schema: String,
}

impl RestRowSource {
    pub fn new(client: BackendClient, schema: impl Into<String>) -> Self {
        Self {
            client,
            schema: schema.into(),
        }
    }
}

#[async_trait]
impl RowSource for RestRowSource {
    async fn fetch_page(
        &self,
        table: &TableName,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ExportedRow>, BackendError> {
        let url = self.client.endpoint(["rest", "v1", table.as_str()]);
        let request = self
            .client
            .request(Method::GET, url)
            .header("Accept-Profile", &self.schema)
            .query(&[
                ("select", "*".to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ]);

        let response = self.client.send(request).await?;
        let rows: Vec<Map<String, Value>> = response.json().await.map_err(|e| {
            BackendError::InvalidResponse(format!("{table}: expected an array of rows: {e}"))
        })?;

        tracing::trace!(table = %table, offset, rows = rows.len(), "Page received");
        Ok(rows.into_iter().map(ExportedRow::from_json).collect())
    }

    async fn count_rows(&self, table: &TableName) -> Result<u64, BackendError> {
        let url = self.client.endpoint(["rest", "v1", table.as_str()]);
        let request = self
            .client
            .request(Method::HEAD, url)
            .header("Accept-Profile", &self.schema)
            .header("Prefer", "count=exact")
            .query(&[("select", "*")]);

        let response = self.client.send(request).await?;
        let header = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                BackendError::InvalidResponse(format!("{table}: missing Content-Range"))
            })?;

        parse_content_range_total(header).ok_or_else(|| {
            BackendError::InvalidResponse(format!("{table}: unparseable Content-Range '{header}'"))
        })
    }
}

/// Total from a `Content-Range` value such as `0-999/1234` or `*/0`
fn parse_content_range_total(header: &str) -> Option<u64> {
    let (_, total) = header.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::backend::client::tests::config;
    use crate::domain::CellValue;
    use mockito::Matcher;

    fn table(name: &str) -> TableName {
        TableName::new(name).unwrap()
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range_total("0-999/1234"), Some(1234));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-9/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[tokio::test]
    async fn test_fetch_page_sends_pagination_and_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/branches")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("select".into(), "*".into()),
                Matcher::UrlEncoded("offset".into(), "1000".into()),
                Matcher::UrlEncoded("limit".into(), "1000".into()),
            ]))
            .match_header("apikey", "anon-key")
            .match_header("authorization", "Bearer session-token")
            .match_header("accept-profile", "public")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": "b1", "name": "Centro", "notes": null, "beds": 4}]"#)
            .create_async()
            .await;

        let client = BackendClient::new(&config(&server.url())).unwrap();
        let source = RestRowSource::new(client, "public");
        let rows = source.fetch_page(&table("branches"), 1000, 1000).await.unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&CellValue::Text("Centro".to_string())));
        assert_eq!(rows[0].get("notes"), Some(&CellValue::Null));
    }

    #[tokio::test]
    async fn test_fetch_page_maps_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/rooms")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let client = BackendClient::new(&config(&server.url())).unwrap();
        let source = RestRowSource::new(client, "public");
        let err = source.fetch_page(&table("rooms"), 0, 1000).await.unwrap_err();

        assert!(matches!(err, BackendError::ServerError { status: 503, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_non_array() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/rooms")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"message": "not rows"}"#)
            .create_async()
            .await;

        let client = BackendClient::new(&config(&server.url())).unwrap();
        let source = RestRowSource::new(client, "public");
        let err = source.fetch_page(&table("rooms"), 0, 10).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_count_rows_reads_content_range() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("HEAD", "/rest/v1/patients")
            .match_query(Matcher::UrlEncoded("select".into(), "*".into()))
            .match_header("prefer", "count=exact")
            .with_status(200)
            .with_header("content-range", "0-999/4321")
            .create_async()
            .await;

        let client = BackendClient::new(&config(&server.url())).unwrap();
        let source = RestRowSource::new(client, "public");
        assert_eq!(source.count_rows(&table("patients")).await.unwrap(), 4321);
        mock.assert_async().await;
    }
}
