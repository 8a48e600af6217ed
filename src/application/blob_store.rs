// Object store trait for dashboard blobs
use async_trait::async_trait;
use bytes::Bytes;

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Full blob names starting with `prefix`, in store order
    async fn list(&self, prefix: &str) -> anyhow::Result<Vec<String>>;

    /// Create or overwrite the blob at `path`
    async fn put(&self, path: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;

    async fn get(&self, path: &str) -> anyhow::Result<Option<Bytes>>;

    async fn exists(&self, path: &str) -> anyhow::Result<bool>;

    /// Returns false when there was nothing to delete
    async fn delete(&self, path: &str) -> anyhow::Result<bool>;
}
