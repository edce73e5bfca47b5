//! Admission checks for presigned upload descriptors.

use super::error::AttachmentError;
use super::service::AttachmentManager;
use super::types::{DesiredAttachment, DesiredAttachments, PreSignedUpload};
use crate::storage::StorageGateway;

impl<S: StorageGateway> AttachmentManager<S> {
    /// Check that a presigned upload was actually placed in the temp folder.
    pub async fn validate_pre_signed(&self, upload: &PreSignedUpload) -> Result<(), AttachmentError> {
        let path = upload.path.trim_matches('/');
        if path.is_empty() {
            return Err(AttachmentError::pre_signed_upload_missing(&upload.path));
        }
        if self.temp_leaf(path).is_none() {
            return Err(AttachmentError::PreSignedOutsideTemp {
                path: upload.path.clone(),
            });
        }
        if !self.storage().exists(path).await? {
            return Err(AttachmentError::pre_signed_upload_missing(&upload.path));
        }
        Ok(())
    }

    /// Validate every presigned descriptor in a desired map before reconciling it.
    pub async fn validate_desired(&self, desired: &DesiredAttachments) -> Result<(), AttachmentError> {
        for value in desired.values() {
            if let DesiredAttachment::PreSigned(upload) = value {
                self.validate_pre_signed(upload).await?;
            }
        }
        Ok(())
    }
}
