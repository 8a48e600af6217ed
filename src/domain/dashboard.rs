// Dashboard domain model - Blob naming for published dashboards
use super::user::canonical_name;
use thiserror::Error;

/// Root of every dashboard blob in the bucket
pub const DASHBOARD_ROOT: &str = "dashboards";

/// Folder used when a dashboard is published without a user
pub const ANONYMOUS_FOLDER: &str = "0";

/// Suffix the editor gives to saved dashboards
pub const DASHBOARD_SUFFIX: &str = ".gd.json";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("name is a required parameter")]
    MissingName,
    #[error("user is a required parameter")]
    MissingUser,
    #[error("{0} is not a valid dashboard name")]
    InvalidName(String),
    #[error("{0} is not a valid user name")]
    InvalidUser(String),
}

/// Identifies one dashboard: an optional owner plus a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardKey {
    folder: String,
    name: String,
}

impl DashboardKey {
    pub fn new(user: Option<&str>, name: Option<&str>) -> Result<Self, KeyError> {
        let name = name.filter(|n| !n.is_empty()).ok_or(KeyError::MissingName)?;
        if name.contains('/') || name == "." || name == ".." {
            return Err(KeyError::InvalidName(name.to_string()));
        }
        Ok(Self {
            folder: user_folder(user)?,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `dashboards/{user}/{name}`, with `0` standing in for a missing user
    pub fn blob_path(&self) -> String {
        format!("{}/{}/{}", DASHBOARD_ROOT, self.folder, self.name)
    }
}

/// Folder segment for a named owner. Blank names and names that would land
/// in the anonymous folder are rejected.
pub fn owner_folder(user: &str) -> Result<String, KeyError> {
    let canonical = canonical_name(user);
    if canonical.is_empty() {
        return Err(KeyError::MissingUser);
    }
    if canonical.contains('/') || canonical == ANONYMOUS_FOLDER {
        return Err(KeyError::InvalidUser(canonical));
    }
    Ok(canonical)
}

/// Folder segment for an optional owner; absent or blank users publish anonymously
pub fn user_folder(user: Option<&str>) -> Result<String, KeyError> {
    match user.filter(|u| !u.trim().is_empty()) {
        Some(user) => owner_folder(user),
        None => Ok(ANONYMOUS_FOLDER.to_string()),
    }
}

/// Listing prefix for a folder, including the trailing slash
pub fn folder_prefix(folder: &str) -> String {
    format!("{}/{}/", DASHBOARD_ROOT, folder)
}

/// Strip a listing prefix from blob names, dropping the folder entry itself
pub fn strip_prefix(prefix: &str, blob_names: Vec<String>) -> Vec<String> {
    blob_names
        .into_iter()
        .filter_map(|blob| {
            blob.strip_prefix(prefix)
                .filter(|rest| !rest.is_empty())
                .map(str::to_string)
        })
        .collect()
}

pub fn is_published_dashboard(file_name: &str) -> bool {
    file_name.ends_with(DASHBOARD_SUFFIX)
}
