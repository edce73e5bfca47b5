//! Attachment error types.

use thiserror::Error;

use attache_shared::AppError;

use crate::storage::StorageError;

/// Attachment operation errors.
///
/// Unrecognized desired values, deletes of empty slots and generated-path
/// collisions are not errors: they resolve to a deletion, a no-op and a
/// retry respectively.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Storage operation failed. Aborts the reconciliation in flight.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The persisted attachments column is not a JSON object of paths.
    #[error("invalid attachments column: {0}")]
    InvalidColumn(#[from] serde_json::Error),

    /// A presigned upload descriptor points at nothing.
    #[error("presigned upload not found in storage: {path}")]
    PreSignedUploadMissing {
        /// Temp path from the descriptor.
        path: String,
    },

    /// A presigned upload descriptor names a path outside the temp folder.
    #[error("presigned upload is not in the temp folder: {path}")]
    PreSignedOutsideTemp {
        /// Path from the descriptor.
        path: String,
    },
}

impl AttachmentError {
    /// Create a missing presigned upload error.
    #[must_use]
    pub fn pre_signed_upload_missing(path: impl Into<String>) -> Self {
        Self::PreSignedUploadMissing { path: path.into() }
    }
}

impl From<AttachmentError> for AppError {
    fn from(err: AttachmentError) -> Self {
        match err {
            AttachmentError::Storage(storage) => storage.into(),
            AttachmentError::InvalidColumn(_) => Self::Internal(err.to_string()),
            AttachmentError::PreSignedUploadMissing { .. }
            | AttachmentError::PreSignedOutsideTemp { .. } => Self::Validation(err.to_string()),
        }
    }
}
