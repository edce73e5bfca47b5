//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - The presigned upload URL endpoint (when signed storage is enabled)
//! - A health check
//! - JSON error responses

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use attache_core::storage::StorageService;
use attache_shared::config::AttachmentsConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storage service for presigned uploads (optional).
    pub storage: Option<Arc<StorageService>>,
    /// Attachment lifecycle configuration.
    pub attachments: Arc<AttachmentsConfig>,
}

impl AppState {
    /// Create application state.
    #[must_use]
    pub fn new(storage: Option<StorageService>, attachments: AttachmentsConfig) -> Self {
        Self {
            storage: storage.map(Arc::new),
            attachments: Arc::new(attachments),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes(&state.attachments))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
