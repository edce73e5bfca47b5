//! Attachment reconciliation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use attache_shared::config::AttachmentsConfig;

use super::error::AttachmentError;
use super::path::PathGenerator;
use super::types::{DesiredAttachment, DesiredAttachments, PreSignedUpload, RawAttachmentMap};
use crate::storage::{StorageGateway, UploadedFile, file_extension, join_path};

/// Reconciles records' attachment maps against storage.
///
/// Every call runs its storage operations one after another and stops at the
/// first failure. Nothing is rolled back: a slot whose old file was already
/// deleted stays empty if storing its replacement fails. Concurrent calls for
/// the same record must be serialized by the caller.
pub struct AttachmentManager<S: StorageGateway> {
    storage: Arc<S>,
    config: AttachmentsConfig,
    paths: PathGenerator,
}

impl<S: StorageGateway> AttachmentManager<S> {
    /// Create a new attachment manager.
    #[must_use]
    pub fn new(storage: Arc<S>, config: AttachmentsConfig) -> Self {
        let paths = PathGenerator::new(&config);
        Self {
            storage,
            config,
            paths,
        }
    }

    /// Storage gateway in use.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Attachment configuration in use.
    #[must_use]
    pub fn config(&self) -> &AttachmentsConfig {
        &self.config
    }

    /// Generate a fresh directory for a new attachment.
    pub async fn generate_path(&self) -> Result<String, AttachmentError> {
        Ok(self.paths.generate(self.storage.as_ref()).await?)
    }

    /// Reconcile the current map against the desired one and return the map to persist.
    ///
    /// - An empty `desired` deletes every current attachment.
    /// - Slots absent from `desired` are left alone.
    /// - A slot being replaced or cleared has its current file deleted before
    ///   the new value is resolved.
    /// - Slots that resolve to nothing are dropped from the result.
    pub async fn reconcile(
        &self,
        current: &RawAttachmentMap,
        desired: DesiredAttachments,
    ) -> Result<RawAttachmentMap, AttachmentError> {
        if desired.is_empty() {
            self.delete_all(current).await?;
            return Ok(RawAttachmentMap::new());
        }

        let replaced: Vec<&str> = desired
            .iter()
            .filter_map(|(slot, value)| current.get(slot).filter(|path| !value.keeps(path)))
            .collect();
        self.remove_paths(replaced).await?;

        let mut working = current.clone();
        for (slot, value) in desired {
            if current.get(&slot).is_some_and(|path| value.keeps(path)) {
                continue;
            }

            match self.resolve(value).await? {
                Some(path) => working.insert(slot, path),
                None => {
                    working.remove(&slot);
                }
            }
        }

        info!(
            before = current.len(),
            after = working.len(),
            "attachments reconciled"
        );
        Ok(working)
    }

    /// Clear the given slots, deleting their files. Unknown slots are ignored.
    pub async fn delete_slots<I>(
        &self,
        current: &RawAttachmentMap,
        slots: I,
    ) -> Result<RawAttachmentMap, AttachmentError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut working = current.clone();
        let removed: Vec<String> = slots
            .into_iter()
            .filter_map(|slot| working.remove(slot.as_ref()))
            .collect();

        self.remove_paths(removed.iter().map(String::as_str)).await?;
        Ok(working)
    }

    /// Delete every attachment in the map from storage.
    pub async fn delete_all(&self, current: &RawAttachmentMap) -> Result<(), AttachmentError> {
        self.remove_paths(current.paths()).await
    }

    /// Turn a desired value into a stored path, or `None` for an empty slot.
    async fn resolve(&self, value: DesiredAttachment) -> Result<Option<String>, AttachmentError> {
        match value {
            DesiredAttachment::NewFile(file) => self.store_file(&file).await.map(Some),
            DesiredAttachment::PreSigned(upload) => self.adopt_pre_signed(&upload).await,
            DesiredAttachment::Path(_) | DesiredAttachment::Delete => Ok(None),
        }
    }

    async fn store_file(&self, file: &UploadedFile) -> Result<String, AttachmentError> {
        let directory = self.generate_path().await?;
        let path = self.storage.put_new_file(&directory, file).await?;

        debug!(path = %path, filename = %file.filename, "stored uploaded attachment");
        Ok(path)
    }

    /// Move a presigned upload out of the temp folder into a generated directory.
    ///
    /// Descriptors pointing outside the temp folder are never moved; the
    /// slot resolves to empty instead.
    async fn adopt_pre_signed(&self, upload: &PreSignedUpload) -> Result<Option<String>, AttachmentError> {
        if self.temp_leaf(&upload.path).is_none() {
            warn!(path = %upload.path, "presigned upload outside temp folder, clearing slot");
            return Ok(None);
        }

        let directory = self.generate_path().await?;
        let Some(destination) = self.pre_signed_destination(&directory, upload) else {
            return Ok(None);
        };

        self.storage.move_file(&upload.path, &destination).await?;

        debug!(from = %upload.path, to = %destination, "adopted presigned upload");
        Ok(Some(destination))
    }

    /// Path of an upload relative to the signed storage temp folder.
    ///
    /// `None` unless the path lies strictly inside the temp folder with no
    /// `.` or `..` segments. With an empty temp folder only single-segment
    /// paths qualify.
    pub(crate) fn temp_leaf<'a>(&self, path: &'a str) -> Option<&'a str> {
        let path = path.trim_matches('/');
        let temp_folder = self.config.signed_storage.temp_folder();

        let leaf = if temp_folder.is_empty() {
            Some(path).filter(|p| !p.contains('/'))
        } else {
            path.strip_prefix(temp_folder)
                .and_then(|rest| rest.strip_prefix('/'))
        };
        let leaf = leaf?;

        leaf.split('/')
            .all(|segment| !matches!(segment, "" | "." | ".."))
            .then_some(leaf)
    }

    /// `{directory}/{temp-relative name}.{ext}` for a presigned upload.
    ///
    /// The extension comes from the descriptor name, lowercased, and is not
    /// repeated when the temp name already ends with it.
    pub(crate) fn pre_signed_destination(
        &self,
        directory: &str,
        upload: &PreSignedUpload,
    ) -> Option<String> {
        let leaf = self.temp_leaf(&upload.path)?;
        let destination = join_path(directory, leaf);

        match file_extension(&upload.name) {
            Some(ext) if file_extension(leaf).as_deref() != Some(ext.as_str()) => {
                Some(format!("{destination}.{ext}"))
            }
            _ => Some(destination),
        }
    }

    /// Delete stored attachments. Paths already gone are skipped.
    ///
    /// With wrapper folders enabled a nested path's whole directory is
    /// removed, taking sibling files (thumbnails, conversions) with it.
    async fn remove_paths<'a>(
        &self,
        paths: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), AttachmentError> {
        for path in paths {
            let path = path.trim_matches('/');
            if path.is_empty() {
                continue;
            }

            match path.rsplit_once('/').filter(|_| self.config.wrapper_folder) {
                Some((directory, _)) => {
                    if self.storage.exists(&format!("{directory}/")).await? {
                        self.storage.delete_directory(directory).await?;
                        debug!(directory = %directory, "removed attachment directory");
                    }
                }
                None => {
                    if self.storage.exists(path).await? {
                        self.storage.delete(path).await?;
                        debug!(path = %path, "removed attachment");
                    }
                }
            }
        }

        Ok(())
    }
}
