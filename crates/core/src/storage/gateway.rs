//! Storage capability the attachment engine depends on.

use std::future::Future;
use std::path::Path;

use bytes::Bytes;

use super::error::StorageError;

/// An uploaded file handed to reconciliation.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original client filename.
    pub filename: String,
    /// MIME type, if the client sent one.
    pub content_type: Option<String>,
    /// File contents.
    pub contents: Bytes,
}

impl UploadedFile {
    /// Create an uploaded file from its name and contents.
    #[must_use]
    pub fn new(filename: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            contents: contents.into(),
        }
    }

    /// Set the MIME type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Extension of the original filename, see [`file_extension`].
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.filename)
    }
}

/// Narrow storage interface used by path generation, reconciliation and presentation.
///
/// Paths are relative to the backend root and use `/` as separator.
/// A path ending in `/` denotes a directory.
pub trait StorageGateway: Send + Sync {
    /// Whether a file (or, for a trailing `/`, a directory) exists.
    fn exists(&self, path: &str) -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// URL a client can fetch the file from.
    fn url(&self, path: &str) -> impl Future<Output = Result<String, StorageError>> + Send;

    /// Store a new file under `directory` and return its final path.
    ///
    /// The backend chooses the leaf name. An empty directory means the storage root.
    fn put_new_file(
        &self,
        directory: &str,
        file: &UploadedFile,
    ) -> impl Future<Output = Result<String, StorageError>> + Send;

    /// Move a file. Fails with `NotFound` when the source is missing.
    fn move_file(
        &self,
        from: &str,
        to: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete(&self, path: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete a directory and everything below it. A missing directory is not an error.
    fn delete_directory(&self, path: &str)
    -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Join a directory and a leaf name. An empty directory yields the leaf alone.
#[must_use]
pub fn join_path(directory: &str, leaf: &str) -> String {
    let directory = directory.trim_matches('/');
    let leaf = leaf.trim_start_matches('/');
    if directory.is_empty() {
        leaf.to_string()
    } else {
        format!("{directory}/{leaf}")
    }
}

/// Lowercased extension of a filename, restricted to ASCII alphanumerics.
///
/// Returns `None` when the name has no usable extension.
#[must_use]
pub fn file_extension(filename: &str) -> Option<String> {
    let ext: String = Path::new(filename)
        .extension()?
        .to_str()?
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    (!ext.is_empty()).then_some(ext)
}
