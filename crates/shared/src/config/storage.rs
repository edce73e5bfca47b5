//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
        /// Azure container name.
        container: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl Default for StorageProvider {
    fn default() -> Self {
        Self::local_fs("./storage")
    }
}

impl StorageProvider {
    /// Create S3-compatible provider (Cloudflare R2, Supabase, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create Azure Blob Storage provider.
    #[must_use]
    pub fn azure_blob(
        account: impl Into<String>,
        access_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
            container: container.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Short provider name, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
        }
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::AzureBlob { container, .. } => container,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage provider configuration.
    #[serde(default)]
    pub provider: StorageProvider,
    /// Base URL under which stored paths are publicly reachable.
    ///
    /// When unset, attachment URLs are presigned download URLs.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Presigned upload URL TTL in seconds, used when no explicit expiry is requested.
    #[serde(default = "default_upload_ttl")]
    pub presign_upload_ttl_secs: u64,
    /// Presigned download URL TTL in seconds.
    #[serde(default = "default_download_ttl")]
    pub presign_download_ttl_secs: u64,
}

fn default_upload_ttl() -> u64 {
    StorageConfig::DEFAULT_UPLOAD_TTL
}

fn default_download_ttl() -> u64 {
    StorageConfig::DEFAULT_DOWNLOAD_TTL
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(StorageProvider::default())
    }
}

impl StorageConfig {
    /// Default upload TTL: 5 minutes.
    pub const DEFAULT_UPLOAD_TTL: u64 = 300;
    /// Default download TTL: 1 hour.
    pub const DEFAULT_DOWNLOAD_TTL: u64 = 3600;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            public_url: None,
            presign_upload_ttl_secs: Self::DEFAULT_UPLOAD_TTL,
            presign_download_ttl_secs: Self::DEFAULT_DOWNLOAD_TTL,
        }
    }

    /// Set the public base URL.
    #[must_use]
    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    /// Set presigned upload URL TTL.
    #[must_use]
    pub fn with_upload_ttl(mut self, secs: u64) -> Self {
        self.presign_upload_ttl_secs = secs;
        self
    }

    /// Set presigned download URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, secs: u64) -> Self {
        self.presign_download_ttl_secs = secs;
        self
    }
}
