// In-memory stores - Process-local stand-ins for the cloud backends
use crate::application::blob_store::BlobStore;
use crate::application::user_repository::{Insertion, UserRepository};
use crate::domain::user::{User, next_count};
use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> anyhow::Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|_| anyhow!("{} lock poisoned", what))
}

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find(&self, canonical: &str) -> anyhow::Result<Option<User>> {
        Ok(lock(&self.users, "user registry")?.get(canonical).cloned())
    }

    async fn insert_if_absent(&self, canonical: &str, userid: &str) -> anyhow::Result<Insertion> {
        let mut users = lock(&self.users, "user registry")?;
        if let Some(user) = users.get(canonical) {
            return Ok(Insertion {
                user: user.clone(),
                created: false,
            });
        }

        let max_count = users.values().map(|u| u.count).max();
        let user = User::new(userid, next_count(max_count));
        users.insert(canonical.to_string(), user.clone());
        Ok(Insertion {
            user,
            created: true,
        })
    }
}

#[derive(Debug, Clone)]
struct StoredBlob {
    body: Bytes,
    #[allow(dead_code)]
    content_type: String,
}

/// Blobs kept in name order, which is also the listing order
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, StoredBlob>>,
}

#[cfg(test)]
impl MemoryBlobStore {
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn content_type(&self, path: &str) -> Option<String> {
        self.blobs
            .lock()
            .unwrap()
            .get(path)
            .map(|b| b.content_type.clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let blobs = lock(&self.blobs, "blob store")?;
        Ok(blobs
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn put(&self, path: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        lock(&self.blobs, "blob store")?.insert(
            path.to_string(),
            StoredBlob {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, path: &str) -> anyhow::Result<Option<Bytes>> {
        Ok(lock(&self.blobs, "blob store")?
            .get(path)
            .map(|blob| blob.body.clone()))
    }

    async fn exists(&self, path: &str) -> anyhow::Result<bool> {
        Ok(lock(&self.blobs, "blob store")?.contains_key(path))
    }

    async fn delete(&self, path: &str) -> anyhow::Result<bool> {
        Ok(lock(&self.blobs, "blob store")?.remove(path).is_some())
    }
}
