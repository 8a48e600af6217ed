// Dashboard service - Publishing and retrieving dashboard documents
use crate::application::blob_store::{BlobStore, JSON_CONTENT_TYPE};
use crate::application::errors::{ServiceError, ServiceResult};
use crate::application::user_service::UserService;
use crate::domain::dashboard::{
    ANONYMOUS_FOLDER, DashboardKey, folder_prefix, is_published_dashboard, owner_folder,
    strip_prefix,
};
use anyhow::Context;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Settings that govern writes and the URLs handed back to callers
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub studio_secret: Option<String>,
    pub public_base_url: String,
    pub viewer_url: String,
}

/// Body of a publish request; every field is optional so that missing ones
/// can be reported together.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDashboard {
    pub user: Option<String>,
    pub name: Option<String>,
    pub dashboard: Option<serde_json::Value>,
    pub studio_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publication {
    pub url: String,
    pub view: String,
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn BlobStore>,
    users: UserService,
    settings: PublishSettings,
}

impl DashboardService {
    pub fn new(store: Arc<dyn BlobStore>, users: UserService, settings: PublishSettings) -> Self {
        Self {
            store,
            users,
            settings,
        }
    }

    /// Names of every dashboard in the user's folder
    pub async fn list_dashboards(&self, user: &str) -> ServiceResult<Vec<String>> {
        let folder = owner_folder(user)?;
        self.list_folder(&folder).await
    }

    /// Editor files published without a user
    pub async fn list_published(&self) -> ServiceResult<Vec<String>> {
        let names = self.list_folder(ANONYMOUS_FOLDER).await?;
        Ok(names
            .into_iter()
            .filter(|name| is_published_dashboard(name))
            .collect())
    }

    async fn list_folder(&self, folder: &str) -> ServiceResult<Vec<String>> {
        let prefix = folder_prefix(folder);
        let blobs = self
            .store
            .list(&prefix)
            .await
            .with_context(|| format!("listing {}", prefix))?;
        Ok(strip_prefix(&prefix, blobs))
    }

    pub async fn add_dashboard(&self, request: NewDashboard) -> ServiceResult<Publication> {
        let mut missing = Vec::new();
        if request.name.as_deref().is_none_or(str::is_empty) {
            missing.push("name");
        }
        if request.dashboard.is_none() {
            missing.push("dashboard");
        }
        if !missing.is_empty() {
            return Err(ServiceError::MissingField(format!(
                "/add_dashboard body missing required fields {}",
                missing.join(", ")
            )));
        }

        if !self.secret_matches(request.studio_secret.as_deref()) {
            tracing::warn!("rejected dashboard write with invalid studio_secret");
            return Err(ServiceError::InvalidSecret);
        }

        let user = request.user.as_deref().filter(|u| !u.trim().is_empty());
        let key = DashboardKey::new(user, request.name.as_deref())?;

        if let Some(user) = user {
            self.users.add_user_if_not_present(user).await?;
        }

        let body = serde_json::to_vec(&request.dashboard).context("serializing dashboard")?;
        let path = key.blob_path();
        self.store
            .put(&path, Bytes::from(body), JSON_CONTENT_TYPE)
            .await
            .with_context(|| format!("writing {}", path))?;

        let url = self.public_url(&path);
        let view = format!(
            "{}?dashboard={}",
            self.settings.viewer_url,
            urlencoding::encode(&url)
        );
        tracing::info!(blob = %path, "published dashboard");
        Ok(Publication { url, view })
    }

    pub async fn get_dashboard(
        &self,
        user: Option<&str>,
        name: Option<&str>,
    ) -> ServiceResult<serde_json::Value> {
        let key = DashboardKey::new(user, name)?;
        let path = key.blob_path();
        let body = self
            .store
            .get(&path)
            .await
            .with_context(|| format!("reading {}", path))?
            .ok_or(ServiceError::NotFound(path.clone()))?;

        let dashboard = serde_json::from_slice(&body)
            .with_context(|| format!("{} does not hold JSON", path))?;
        Ok(dashboard)
    }

    pub async fn get_dashboard_url(
        &self,
        user: Option<&str>,
        name: Option<&str>,
    ) -> ServiceResult<String> {
        let key = DashboardKey::new(user, name)?;
        let path = key.blob_path();
        if !self
            .store
            .exists(&path)
            .await
            .with_context(|| format!("checking {}", path))?
        {
            return Err(ServiceError::NotFound(path));
        }
        Ok(self.public_url(&path))
    }

    /// Remove a dashboard, returning its name
    pub async fn delete_dashboard(
        &self,
        user: Option<&str>,
        name: Option<&str>,
    ) -> ServiceResult<String> {
        let key = DashboardKey::new(user, name)?;
        let path = key.blob_path();
        if !self
            .store
            .delete(&path)
            .await
            .with_context(|| format!("deleting {}", path))?
        {
            return Err(ServiceError::NotFound(path));
        }

        tracing::info!(blob = %path, "deleted dashboard");
        Ok(key.name().to_string())
    }

    fn secret_matches(&self, offered: Option<&str>) -> bool {
        match (self.settings.studio_secret.as_deref(), offered) {
            (Some(expected), Some(offered)) => expected == offered,
            _ => false,
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.public_base_url.trim_end_matches('/'), path)
    }
}
