// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::blob_store::BlobStore;
use crate::application::dashboard_service::DashboardService;
use crate::application::studio_service::StudioService;
use crate::application::user_repository::UserRepository;
use crate::application::user_service::UserService;
use crate::infrastructure::config::{AppConfig, Backend, load_app_config};
use crate::infrastructure::datastore_repository::DatastoreUserRepository;
use crate::infrastructure::gcp_auth::TokenProvider;
use crate::infrastructure::gcs_blob_store::GcsBlobStore;
use crate::infrastructure::memory_store::{MemoryBlobStore, MemoryUserRepository};
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

type Stores = (Arc<dyn UserRepository>, Arc<dyn BlobStore>);

fn build_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    match config.backend {
        Backend::Memory => {
            tracing::warn!("using in-memory stores, nothing will be persisted");
            Ok((
                Arc::new(MemoryUserRepository::default()),
                Arc::new(MemoryBlobStore::default()),
            ))
        }
        Backend::Gcp => {
            let client = reqwest::Client::new();
            let tokens = Arc::new(TokenProvider::new(
                client.clone(),
                config.gcp.access_token.clone(),
            ));
            let users = DatastoreUserRepository::new(
                client.clone(),
                tokens.clone(),
                config.project_id()?.to_string(),
                config.gcp.user_kind.clone(),
            );
            let blobs = GcsBlobStore::new(client, tokens, config.gcp.bucket.clone());
            Ok((Arc::new(users), Arc::new(blobs)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Load configuration
    let config = load_app_config()?;
    if config.publish_settings().studio_secret.is_none() {
        tracing::warn!("studio_secret is not set, every dashboard write will be rejected");
    }

    // Create stores (infrastructure layer)
    let (user_repository, blob_store) = build_stores(&config)?;

    // Create services (application layer)
    let user_service = UserService::new(user_repository);
    let dashboard_service =
        DashboardService::new(blob_store, user_service.clone(), config.publish_settings());
    let studio_service = StudioService::new(config.studio.clone());

    let state = Arc::new(AppState {
        user_service,
        dashboard_service,
        studio_service,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, backend = ?config.backend, "starting dashboard-publisher");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
