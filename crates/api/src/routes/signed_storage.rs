//! Presigned upload URL endpoint.
//!
//! Hands out a short-lived URL the client uploads a file to directly. The
//! file lands in the signed storage temp folder; its `path` is later passed
//! back as a presigned descriptor and moved into place by reconciliation.
//! Uploads that are never adopted stay in the temp folder.

use std::collections::HashMap;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use attache_core::storage::UploadRequest;
use attache_shared::AppError;

use crate::AppState;
use crate::error::ApiError;

/// Default canned ACL for uploads.
pub const DEFAULT_VISIBILITY: &str = "private";

/// Default content type for uploads.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Creates the presigned upload route at the configured URL.
pub fn routes(url: &str) -> Router<AppState> {
    let url = format!("/{}", url.trim_start_matches('/'));
    Router::new().route(&url, post(create_signed_storage_url))
}

/// Request body for a presigned upload URL. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct SignedStorageUrlRequest {
    /// Canned ACL, defaults to `private`.
    #[serde(default)]
    pub visibility: Option<String>,
    /// MIME type the client will upload.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Cache-Control to store with the object.
    #[serde(default)]
    pub cache_control: Option<String>,
    /// Expires header to store with the object.
    #[serde(default)]
    pub expires: Option<String>,
    /// Target bucket. Must match the configured one when given.
    #[serde(default)]
    pub bucket: Option<String>,
}

/// Response for a presigned upload URL.
#[derive(Debug, Serialize)]
pub struct SignedStorageUrlResponse {
    /// Presigned upload URL.
    pub url: String,
    /// HTTP method to use.
    pub method: String,
    /// Headers the client must send with the upload.
    pub headers: HashMap<String, String>,
    /// When the URL expires (ISO 8601).
    pub expires_at: String,
    /// Temp path to hand back as a presigned descriptor.
    pub path: String,
}

/// Issue a presigned upload URL into the temp folder.
async fn create_signed_storage_url(
    State(state): State<AppState>,
    Json(payload): Json<SignedStorageUrlRequest>,
) -> Result<(StatusCode, Json<SignedStorageUrlResponse>), ApiError> {
    let Some(storage) = &state.storage else {
        return Err(AppError::ServiceUnavailable("File storage is not configured".into()).into());
    };

    if let Some(bucket) = payload.bucket.as_deref().filter(|b| *b != storage.bucket()) {
        return Err(AppError::Unprocessable(format!("bucket {bucket} is not configured")).into());
    }

    let signed = &state.attachments.signed_storage;
    let path = temp_path(signed.temp_folder());

    let request = UploadRequest {
        path: path.clone(),
        visibility: payload
            .visibility
            .unwrap_or_else(|| DEFAULT_VISIBILITY.to_string()),
        content_type: payload
            .content_type
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        cache_control: payload.cache_control,
        expires: payload.expires,
        expires_in: signed.expire_duration(),
    };

    let presigned = storage.presign_upload(&request).await?;

    info!(
        path = %path,
        provider = storage.provider_name(),
        expires_at = %presigned.expires_at,
        "presigned upload URL issued"
    );

    Ok((
        StatusCode::CREATED,
        Json(SignedStorageUrlResponse {
            url: presigned.url,
            method: presigned.method,
            headers: presigned.headers,
            expires_at: presigned.expires_at.to_rfc3339(),
            path,
        }),
    ))
}

/// Fresh temp path: `{temp_folder}/{uuid}`.
fn temp_path(temp_folder: &str) -> String {
    let id = Uuid::new_v4();
    if temp_folder.is_empty() {
        id.to_string()
    } else {
        format!("{temp_folder}/{id}")
    }
}
