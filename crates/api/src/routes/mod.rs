//! API route definitions.

use axum::Router;

use attache_shared::config::AttachmentsConfig;

use crate::AppState;

pub mod health;
pub mod signed_storage;

/// Creates the API router. The presigned upload route is only mounted when
/// signed storage is enabled.
pub fn api_routes(attachments: &AttachmentsConfig) -> Router<AppState> {
    let router = Router::new().merge(health::routes());

    if attachments.signed_storage.enabled {
        router.merge(signed_storage::routes(&attachments.signed_storage.route.url))
    } else {
        router
    }
}
