//! Attache API Server
//!
//! Main entry point for the Attache presigned upload service.

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use attache_api::{AppState, create_router};
use attache_core::storage::StorageService;
use attache_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attache=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Storage is optional: without it the upload endpoint answers 503
    let storage = match StorageService::from_config(config.storage.clone()) {
        Ok(storage) => {
            info!(
                provider = storage.provider_name(),
                bucket = storage.bucket(),
                "Storage configured"
            );
            Some(storage)
        }
        Err(e) => {
            warn!(error = %e, "Storage unavailable, presigned uploads disabled");
            None
        }
    };

    info!(
        enabled = config.attachments.signed_storage.enabled,
        route = %config.attachments.signed_storage.route.url,
        temp_folder = config.attachments.signed_storage.temp_folder(),
        "Signed storage configured"
    );

    // Create router
    let app = create_router(AppState::new(storage, config.attachments));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
