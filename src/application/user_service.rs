// User service - Registry of dashboard publishers
use crate::application::errors::{ServiceError, ServiceResult};
use crate::application::user_repository::UserRepository;
use crate::domain::dashboard::{KeyError, owner_folder};
use crate::domain::user::{User, canonical_name};
use std::sync::Arc;

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn find_user(&self, name: &str) -> ServiceResult<Option<User>> {
        let canonical = Self::canonical_or_reject(name)?;
        Ok(self.repository.find(&canonical).await?)
    }

    /// Return the user's record, creating it first if this is a new name
    pub async fn add_user_if_not_present(&self, name: &str) -> ServiceResult<User> {
        if let Some(user) = self.find_user(name).await? {
            return Ok(user);
        }

        let canonical = canonical_name(name);
        let insertion = self.repository.insert_if_absent(&canonical, name).await?;
        if insertion.created {
            tracing::info!(user = %canonical, count = insertion.user.count, "created user");
        }
        Ok(insertion.user)
    }

    /// Explicit registration; a second registration of the same name fails
    pub async fn add_user(&self, name: Option<&str>) -> ServiceResult<User> {
        let name = name.unwrap_or_default();
        let canonical = Self::canonical_or_reject(name)?;

        let insertion = self.repository.insert_if_absent(&canonical, name).await?;
        if !insertion.created {
            return Err(ServiceError::UserExists(canonical));
        }

        tracing::info!(user = %canonical, count = insertion.user.count, "registered user");
        Ok(insertion.user)
    }

    fn canonical_or_reject(name: &str) -> ServiceResult<String> {
        match owner_folder(name) {
            Err(KeyError::MissingUser) => Err(ServiceError::MissingField(
                "user is a required field".to_string(),
            )),
            folder => Ok(folder?),
        }
    }
}
