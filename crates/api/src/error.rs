//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use attache_shared::AppError;

/// Error returned by handlers, rendered as `{ "error": ..., "message": ... }`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E: Into<AppError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        error!(status = status.as_u16(), error = %self.0, "request failed");

        (
            status,
            Json(json!({
                "error": self.0.error_code().to_lowercase(),
                "message": self.0.to_string(),
            })),
        )
            .into_response()
    }
}
