// Application layer - Use cases and the storage seams they depend on
pub mod blob_store;
pub mod dashboard_service;
pub mod errors;
pub mod studio_service;
pub mod user_repository;
pub mod user_service;
