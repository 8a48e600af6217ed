// Cloud Datastore user registry over the REST API
use crate::application::user_repository::{Insertion, UserRepository};
use crate::domain::user::{User, next_count};
use crate::infrastructure::gcp_auth::TokenProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

const DATASTORE_API: &str = "https://datastore.googleapis.com/v1";

/// Transactions that lose a commit race to a different user are replayed
const MAX_INSERT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Key {
    partition_id: PartitionId,
    path: Vec<PathElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartitionId {
    project_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PathElement {
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
    /// int64 values travel as decimal strings
    #[serde(skip_serializing_if = "Option::is_none")]
    integer_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entity {
    key: Key,
    #[serde(default)]
    properties: HashMap<String, PropertyValue>,
}

#[derive(Debug, Deserialize)]
struct EntityResult {
    entity: Entity,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    found: Vec<EntityResult>,
}

#[derive(Debug, Deserialize)]
struct RunQueryResponse {
    batch: QueryBatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryBatch {
    #[serde(default)]
    entity_results: Vec<EntityResult>,
}

#[derive(Debug, Deserialize)]
struct BeginTransactionResponse {
    transaction: String,
}

enum CommitOutcome {
    Committed,
    Conflict,
}

enum InsertAttempt {
    Existing(User),
    Created(User),
    Conflict,
}

impl Entity {
    fn to_user(&self) -> Result<User> {
        let userid = self
            .properties
            .get("userid")
            .and_then(|v| v.string_value.clone())
            .context("User entity has no userid")?;
        let count = self
            .properties
            .get("count")
            .and_then(|v| v.integer_value.as_deref())
            .context("User entity has no count")?
            .parse::<i64>()
            .context("User entity count is not an integer")?;
        Ok(User::new(userid, count))
    }
}

#[derive(Debug, Clone)]
pub struct DatastoreUserRepository {
    client: reqwest::Client,
    tokens: Arc<TokenProvider>,
    api_base: String,
    project_id: String,
    kind: String,
}

impl DatastoreUserRepository {
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<TokenProvider>,
        project_id: String,
        kind: String,
    ) -> Self {
        Self {
            client,
            tokens,
            api_base: DATASTORE_API.to_string(),
            project_id,
            kind,
        }
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/projects/{}:{}", self.api_base, self.project_id, method)
    }

    fn key(&self, canonical: &str) -> Key {
        Key {
            partition_id: PartitionId {
                project_id: self.project_id.clone(),
            },
            path: vec![PathElement {
                kind: self.kind.clone(),
                name: Some(canonical.to_string()),
            }],
        }
    }

    fn user_entity(&self, canonical: &str, user: &User) -> Entity {
        let mut properties = HashMap::new();
        properties.insert(
            "userid".to_string(),
            PropertyValue {
                string_value: Some(user.userid.clone()),
                ..Default::default()
            },
        );
        properties.insert(
            "count".to_string(),
            PropertyValue {
                integer_value: Some(user.count.to_string()),
                ..Default::default()
            },
        );
        Entity {
            key: self.key(canonical),
            properties,
        }
    }

    async fn send(&self, method: &str, body: &serde_json::Value) -> Result<Response> {
        self.client
            .post(self.method_url(method))
            .bearer_auth(self.tokens.bearer().await?)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to Datastore", method))
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<R> {
        let response = self.send(method, body).await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Datastore {} failed with status {}: {}", method, status, text);
        }
        response
            .json::<R>()
            .await
            .with_context(|| format!("Failed to parse Datastore {} response", method))
    }

    async fn lookup(&self, canonical: &str, transaction: Option<&str>) -> Result<Option<User>> {
        let mut body = json!({ "keys": [self.key(canonical)] });
        if let Some(transaction) = transaction {
            body["readOptions"] = json!({ "transaction": transaction });
        }

        let response: LookupResponse = self.call("lookup", &body).await?;
        response
            .found
            .first()
            .map(|result| result.entity.to_user())
            .transpose()
    }

    async fn max_count(&self, transaction: &str) -> Result<Option<i64>> {
        let body = json!({
            "partitionId": { "projectId": self.project_id },
            "readOptions": { "transaction": transaction },
            "query": {
                "kind": [{ "name": self.kind }],
                "order": [{ "property": { "name": "count" }, "direction": "DESCENDING" }],
                "limit": 1
            }
        });

        let response: RunQueryResponse = self.call("runQuery", &body).await?;
        response
            .batch
            .entity_results
            .first()
            .map(|result| result.entity.to_user().map(|user| user.count))
            .transpose()
    }

    async fn begin_transaction(&self) -> Result<String> {
        let response: BeginTransactionResponse =
            self.call("beginTransaction", &json!({})).await?;
        Ok(response.transaction)
    }

    async fn rollback(&self, transaction: &str) {
        let body = json!({ "transaction": transaction });
        if let Err(e) = self.call::<serde_json::Value>("rollback", &body).await {
            tracing::warn!(error = %e, "Datastore rollback failed");
        }
    }

    /// `insert` fails on an existing key, so the commit is a create-only CAS
    async fn commit_insert(&self, transaction: &str, entity: Entity) -> Result<CommitOutcome> {
        let body = json!({
            "mode": "TRANSACTIONAL",
            "transaction": transaction,
            "mutations": [{ "insert": entity }]
        });

        let response = self.send("commit", &body).await?;
        match response.status() {
            status if status.is_success() => Ok(CommitOutcome::Committed),
            StatusCode::CONFLICT => Ok(CommitOutcome::Conflict),
            status => {
                let text = response.text().await.unwrap_or_default();
                anyhow::bail!("Datastore commit failed with status {}: {}", status, text);
            }
        }
    }

    /// One read-max-then-insert pass inside `transaction`
    async fn attempt_insert(
        &self,
        transaction: &str,
        canonical: &str,
        userid: &str,
    ) -> Result<InsertAttempt> {
        if let Some(user) = self.lookup(canonical, Some(transaction)).await? {
            return Ok(InsertAttempt::Existing(user));
        }

        let max_count = self.max_count(transaction).await?;
        let user = User::new(userid, next_count(max_count));
        let entity = self.user_entity(canonical, &user);

        Ok(match self.commit_insert(transaction, entity).await? {
            CommitOutcome::Committed => InsertAttempt::Created(user),
            CommitOutcome::Conflict => InsertAttempt::Conflict,
        })
    }
}

#[async_trait]
impl UserRepository for DatastoreUserRepository {
    async fn find(&self, canonical: &str) -> Result<Option<User>> {
        self.lookup(canonical, None).await
    }

    async fn insert_if_absent(&self, canonical: &str, userid: &str) -> Result<Insertion> {
        for attempt in 1..=MAX_INSERT_ATTEMPTS {
            let transaction = self.begin_transaction().await?;

            match self.attempt_insert(&transaction, canonical, userid).await {
                Ok(InsertAttempt::Created(user)) => {
                    return Ok(Insertion {
                        user,
                        created: true,
                    });
                }
                Ok(InsertAttempt::Existing(user)) => {
                    self.rollback(&transaction).await;
                    return Ok(Insertion {
                        user,
                        created: false,
                    });
                }
                Ok(InsertAttempt::Conflict) => {
                    // The aborted commit already ended the transaction
                    if let Some(user) = self.lookup(canonical, None).await? {
                        return Ok(Insertion {
                            user,
                            created: false,
                        });
                    }
                    tracing::debug!(user = %canonical, attempt, "user insert conflicted, retrying");
                }
                Err(e) => {
                    self.rollback(&transaction).await;
                    return Err(e);
                }
            }
        }

        anyhow::bail!(
            "creating user {} conflicted with concurrent registrations {} times",
            canonical,
            MAX_INSERT_ATTEMPTS
        )
    }
}
