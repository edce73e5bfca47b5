//! Storage service implementation using Apache OpenDAL.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use opendal::{ErrorKind, Operator, services};
use tracing::debug;
use uuid::Uuid;

use super::error::StorageError;
use super::gateway::{StorageGateway, UploadedFile, join_path};
use attache_shared::config::{StorageConfig, StorageProvider};

/// Presigned URL for upload or download.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use (PUT for upload, GET for download).
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
    /// Required headers for the request.
    pub headers: HashMap<String, String>,
}

/// Request to generate a direct upload URL.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Temp path the client uploads to.
    pub path: String,
    /// Canned ACL / visibility, e.g. `private`.
    pub visibility: String,
    /// Content type (MIME type).
    pub content_type: String,
    /// Cache-Control header to store with the object.
    pub cache_control: Option<String>,
    /// Expires header to store with the object.
    pub expires: Option<String>,
    /// How long the URL stays valid.
    pub expires_in: Duration,
}

/// Metadata about a stored file.
#[derive(Debug, Clone)]
pub struct AttachmentMetadata {
    /// Storage key.
    pub storage_key: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Content type.
    pub content_type: Option<String>,
}

/// Storage service for attachment files.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
        };

        Ok(operator)
    }

    /// Generate a presigned URL for a direct client upload.
    ///
    /// # Errors
    ///
    /// Returns an error if presigning is not supported or fails.
    pub async fn presign_upload(&self, req: &UploadRequest) -> Result<PresignedUrl, StorageError> {
        if req.path.trim_matches('/').is_empty() {
            return Err(StorageError::invalid_key("upload path is empty"));
        }

        let mut pending = self
            .operator
            .presign_write_with(&req.path, req.expires_in)
            .content_type(&req.content_type);
        if let Some(cache_control) = &req.cache_control {
            pending = pending.cache_control(cache_control);
        }
        let presigned = pending.await.map_err(StorageError::from)?;

        let mut headers: HashMap<String, String> = presigned
            .header()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        headers.insert("content-type".to_string(), req.content_type.clone());
        if let Some(cache_control) = &req.cache_control {
            headers.insert("cache-control".to_string(), cache_control.clone());
        }
        if let Some(expires) = &req.expires {
            headers.insert("expires".to_string(), expires.clone());
        }
        if matches!(self.config.provider, StorageProvider::S3 { .. }) {
            headers.insert("x-amz-acl".to_string(), req.visibility.clone());
        }

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: expires_at(req.expires_in),
            headers,
        })
    }

    /// Generate presigned URL for download.
    ///
    /// # Errors
    ///
    /// Returns an error if presigning is not supported or fails.
    pub async fn presign_download(&self, key: &str) -> Result<PresignedUrl, StorageError> {
        let ttl = Duration::from_secs(self.config.presign_download_ttl_secs);

        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(StorageError::from)?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: expires_at(ttl),
            headers: HashMap::new(),
        })
    }

    /// Read metadata of a stored file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be accessed.
    pub async fn stat(&self, key: &str) -> Result<AttachmentMetadata, StorageError> {
        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, key))?;

        Ok(AttachmentMetadata {
            storage_key: key.to_string(),
            file_size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
        })
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Fallback for backends without native rename.
    async fn copy_then_delete(&self, from: &str, to: &str) -> Result<(), StorageError> {
        match self.operator.copy(from, to).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Unsupported => {
                let contents = self
                    .operator
                    .read(from)
                    .await
                    .map_err(|e| StorageError::from_opendal(&e, from))?;
                self.operator
                    .write(to, contents)
                    .await
                    .map_err(|e| StorageError::from_opendal(&e, to))?;
            }
            Err(e) => return Err(StorageError::from_opendal(&e, from)),
        }

        self.delete(from).await
    }
}

impl StorageGateway for StorageService {
    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        match self.operator.stat(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::from_opendal(&e, path)),
        }
    }

    async fn url(&self, path: &str) -> Result<String, StorageError> {
        match &self.config.public_url {
            Some(base) => Ok(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            )),
            None => match self.presign_download(path).await {
                Ok(presigned) => Ok(presigned.url),
                // Local disks cannot sign; serve them root-relative.
                Err(StorageError::PresignNotSupported) => {
                    Ok(format!("/{}", path.trim_start_matches('/')))
                }
                Err(err) => Err(err),
            },
        }
    }

    async fn put_new_file(&self, directory: &str, file: &UploadedFile) -> Result<String, StorageError> {
        let path = join_path(directory, &generate_file_name(file));

        match &file.content_type {
            Some(content_type) => self
                .operator
                .write_with(&path, file.contents.clone())
                .content_type(content_type)
                .await
                .map_err(|e| StorageError::from_opendal(&e, &path))?,
            None => self
                .operator
                .write(&path, file.contents.clone())
                .await
                .map_err(|e| StorageError::from_opendal(&e, &path))?,
        };

        debug!(path = %path, size = file.contents.len(), "stored new file");
        Ok(path)
    }

    async fn move_file(&self, from: &str, to: &str) -> Result<(), StorageError> {
        match self.operator.rename(from, to).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Unsupported => self.copy_then_delete(from, to).await?,
            Err(e) => return Err(StorageError::from_opendal(&e, from)),
        }

        debug!(from = %from, to = %to, "moved file");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        match self.operator.delete(path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::from_opendal(&e, path)),
        }

        debug!(path = %path, "deleted file");
        Ok(())
    }

    async fn delete_directory(&self, path: &str) -> Result<(), StorageError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(StorageError::invalid_key("refusing to delete the storage root"));
        }
        let dir = format!("{trimmed}/");

        let entries = match self.operator.list_with(&dir).recursive(true).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StorageError::from_opendal(&e, &dir)),
        };

        // Deepest first so directories are empty by the time we reach them.
        let mut paths: Vec<String> = entries
            .into_iter()
            .map(|entry| entry.path().to_string())
            .filter(|p| p != &dir)
            .collect();
        paths.sort_by_key(|p| std::cmp::Reverse(p.len()));

        for entry in &paths {
            self.delete(entry).await?;
        }
        self.delete(&dir).await?;

        debug!(path = %dir, entries = paths.len(), "deleted directory");
        Ok(())
    }
}

/// Leaf name for a new file: a random UUID plus the sanitized original extension.
fn generate_file_name(file: &UploadedFile) -> String {
    let id = Uuid::new_v4().simple();
    match file.extension() {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

fn expires_at(ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
