// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod datastore_repository;
pub mod gcp_auth;
pub mod gcs_blob_store;
pub mod http_response;
pub mod memory_store;
