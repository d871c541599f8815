//! poca-server binary: wires config, store, media, and the HTTP API.

use std::sync::{Arc, Mutex};

use tracing::info;
use tracing_subscriber::EnvFilter;

use poca_server::api::AppState;
use poca_server::media_store::MediaStore;
use poca_server::subscriptions::SubscriptionHub;
use poca_server::{build_router, ServerConfig};
use poca_store::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,poca_server=debug,poca_store=info")),
        )
        .init();

    info!("Starting poca server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let database = match &config.db_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };

    let media = Arc::new(
        MediaStore::new(config.media_storage_path.clone(), config.max_upload_size).await?,
    );

    let state = AppState {
        db: Arc::new(Mutex::new(database)),
        media,
        hub: Arc::new(SubscriptionHub::new()),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Serve
    // -----------------------------------------------------------------------
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!(addr = %config.http_addr, public_url = %config.public_url, "HTTP API listening");

    axum::serve(listener, app).await?;
    Ok(())
}
