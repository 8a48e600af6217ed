// Error taxonomy shared by the use cases
use crate::domain::dashboard::KeyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    MissingField(String),
    #[error("Invalid studio_secret")]
    InvalidSecret,
    #[error("User {0} is already in the database")]
    UserExists(String),
    #[error("No dashboard {0} found")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    InvalidKey(#[from] KeyError),
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl ServiceError {
    /// Everything except a store failure is the caller's fault
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ServiceError::Storage(_))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
