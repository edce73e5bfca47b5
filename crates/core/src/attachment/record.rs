//! Record-facing attachment operations and the deletion hook.

use tracing::{debug, info};

use super::error::AttachmentError;
use super::service::AttachmentManager;
use super::types::{DesiredAttachments, PresentedAttachments, RawAttachmentMap};
use crate::storage::StorageGateway;

/// How a record is being deleted, as seen by the deletion hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoftDeleteState {
    /// The record type cannot be soft deleted; every delete is permanent.
    #[default]
    Unsupported,
    /// Soft delete: the record can still be restored.
    Soft,
    /// Forced delete of a soft-deletable record.
    Forced,
}

impl SoftDeleteState {
    /// Whether the record is gone for good.
    #[must_use]
    pub fn is_permanent(self) -> bool {
        !matches!(self, Self::Soft)
    }
}

/// A persisted record owning an attachments column.
pub trait HasAttachments {
    /// Raw map as currently stored on the record.
    ///
    /// Implementors reading a JSON column return
    /// `Ok(RawAttachmentMap::from_column(value)?)`, which surfaces an
    /// unreadable column as [`AttachmentError::InvalidColumn`].
    fn raw_attachments(&self) -> Result<RawAttachmentMap, AttachmentError>;

    /// Replace the raw map. The caller persists the record afterwards.
    fn set_raw_attachments(&mut self, raw: RawAttachmentMap);

    /// How the record is being deleted. Only consulted by the deletion hook.
    fn soft_delete_state(&self) -> SoftDeleteState {
        SoftDeleteState::Unsupported
    }
}

impl<S: StorageGateway> AttachmentManager<S> {
    /// Presented attachments of a record.
    pub async fn attachments<R: HasAttachments + ?Sized>(
        &self,
        record: &R,
    ) -> Result<PresentedAttachments, AttachmentError> {
        self.present(&record.raw_attachments()?).await
    }

    /// Reconcile a record's attachments and store the resulting map on it.
    ///
    /// The record is left untouched when a storage operation fails.
    pub async fn update_attachments<R: HasAttachments + ?Sized>(
        &self,
        record: &mut R,
        desired: DesiredAttachments,
    ) -> Result<(), AttachmentError> {
        let raw = self.reconcile(&record.raw_attachments()?, desired).await?;
        record.set_raw_attachments(raw);
        Ok(())
    }

    /// Clear the given slots on a record.
    pub async fn delete_attachment<R, I>(&self, record: &mut R, slots: I) -> Result<(), AttachmentError>
    where
        R: HasAttachments + ?Sized,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let raw = self.delete_slots(&record.raw_attachments()?, slots).await?;
        record.set_raw_attachments(raw);
        Ok(())
    }

    /// Delete every attachment of a record and clear its map.
    pub async fn delete_attachments<R: HasAttachments + ?Sized>(
        &self,
        record: &mut R,
    ) -> Result<(), AttachmentError> {
        self.delete_all(&record.raw_attachments()?).await?;
        record.set_raw_attachments(RawAttachmentMap::new());
        Ok(())
    }

    /// Deletion hook. Call after the record was deleted.
    ///
    /// Removes the record's files on permanent deletion and returns whether
    /// anything was cleaned up. Soft deletes keep the files so the record
    /// can be restored.
    pub async fn record_deleted<R: HasAttachments + ?Sized>(
        &self,
        record: &R,
    ) -> Result<bool, AttachmentError> {
        let state = record.soft_delete_state();
        if !state.is_permanent() {
            debug!(?state, "soft delete, keeping attachments");
            return Ok(false);
        }

        let raw = record.raw_attachments()?;
        self.delete_all(&raw).await?;

        info!(?state, attachments = raw.len(), "attachments of deleted record removed");
        Ok(true)
    }
}
