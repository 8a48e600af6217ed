// Repository trait for the user registry
use crate::domain::user::User;
use async_trait::async_trait;

/// Result of an insert-if-absent: the stored record and whether this call created it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub user: User,
    pub created: bool,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user by canonical name
    async fn find(&self, canonical: &str) -> anyhow::Result<Option<User>>;

    /// Atomically create `{userid, count: max + 1}` under `canonical` unless a
    /// record already exists there. Two concurrent calls never share a count.
    async fn insert_if_absent(&self, canonical: &str, userid: &str) -> anyhow::Result<Insertion>;
}
