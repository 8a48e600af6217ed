// Cloud Storage blob store over the JSON API
use crate::application::blob_store::BlobStore;
use crate::infrastructure::gcp_auth::TokenProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Response, StatusCode, header};
use serde::Deserialize;
use std::sync::Arc;

const STORAGE_API: &str = "https://storage.googleapis.com";

#[derive(Debug, Deserialize)]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectEntry>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
}

#[derive(Debug, Clone)]
pub struct GcsBlobStore {
    client: reqwest::Client,
    tokens: Arc<TokenProvider>,
    api_base: String,
    bucket: String,
}

impl GcsBlobStore {
    pub fn new(client: reqwest::Client, tokens: Arc<TokenProvider>, bucket: String) -> Self {
        Self {
            client,
            tokens,
            api_base: STORAGE_API.to_string(),
            bucket,
        }
    }

    fn objects_url(&self) -> String {
        format!("{}/storage/v1/b/{}/o", self.api_base, self.bucket)
    }

    /// Object names are a single path segment in the API, so `/` is escaped
    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.objects_url(), urlencoding::encode(path))
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/storage/v1/b/{}/o", self.api_base, self.bucket)
    }

    async fn ensure_success(response: Response, action: &str) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Cloud Storage {} failed with status {}: {}", action, status, body);
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("prefix", prefix.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let response = self
                .client
                .get(self.objects_url())
                .bearer_auth(self.tokens.bearer().await?)
                .query(&query)
                .send()
                .await
                .context("Failed to send list request to Cloud Storage")?;
            let page = Self::ensure_success(response, "list")
                .await?
                .json::<ObjectList>()
                .await
                .context("Failed to parse Cloud Storage object list")?;

            names.extend(page.items.into_iter().map(|o| o.name));
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(names)
    }

    async fn put(&self, path: &str, body: Bytes, content_type: &str) -> Result<()> {
        let response = self
            .client
            .post(self.upload_url())
            .bearer_auth(self.tokens.bearer().await?)
            .query(&[("uploadType", "media"), ("name", path)])
            .header(header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .context("Failed to send upload to Cloud Storage")?;
        Self::ensure_success(response, "upload").await?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>> {
        let response = self
            .client
            .get(self.object_url(path))
            .bearer_auth(self.tokens.bearer().await?)
            .query(&[("alt", "media")])
            .send()
            .await
            .context("Failed to send download request to Cloud Storage")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = Self::ensure_success(response, "download")
            .await?
            .bytes()
            .await
            .context("Failed to read Cloud Storage object body")?;
        Ok(Some(body))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let response = self
            .client
            .get(self.object_url(path))
            .bearer_auth(self.tokens.bearer().await?)
            .query(&[("fields", "name")])
            .send()
            .await
            .context("Failed to send metadata request to Cloud Storage")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::ensure_success(response, "metadata lookup").await?;
        Ok(true)
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        let response = self
            .client
            .delete(self.object_url(path))
            .bearer_auth(self.tokens.bearer().await?)
            .send()
            .await
            .context("Failed to send delete request to Cloud Storage")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::ensure_success(response, "delete").await?;
        Ok(true)
    }
}
