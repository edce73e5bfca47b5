//! Attachment lifecycle configuration.
//!
//! These values are read once at startup and handed to the attachment
//! manager by value. Nothing here is mutated at runtime.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Field that can be included when an attachment is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentsAppend {
    /// The raw storage path.
    Path,
    /// The URL derived from the storage backend.
    Url,
    /// Whether the object currently exists in storage.
    Exists,
}

impl AttachmentsAppend {
    /// All appends, in presentation order.
    pub const ALL: [Self; 3] = [Self::Path, Self::Url, Self::Exists];

    /// Wire name of the append.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Url => "url",
            Self::Exists => "exists",
        }
    }
}

/// Attachment lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentsConfig {
    /// Folder every generated path starts with. Empty means the storage root.
    #[serde(default)]
    pub base_folder: String,
    /// Give every attachment its own directory named after its random token.
    #[serde(default)]
    pub wrapper_folder: bool,
    /// Fields included when presenting attachments.
    #[serde(default = "default_appends")]
    pub appends: Vec<AttachmentsAppend>,
    /// Random directory segments inserted into generated paths.
    #[serde(default)]
    pub path_obfuscation: PathObfuscationConfig,
    /// Direct-to-storage uploads through presigned URLs.
    #[serde(default)]
    pub signed_storage: SignedStorageConfig,
}

fn default_appends() -> Vec<AttachmentsAppend> {
    AttachmentsAppend::ALL.to_vec()
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            base_folder: String::new(),
            wrapper_folder: false,
            appends: default_appends(),
            path_obfuscation: PathObfuscationConfig::default(),
            signed_storage: SignedStorageConfig::default(),
        }
    }
}

impl AttachmentsConfig {
    /// Base folder with leading and trailing slashes removed.
    #[must_use]
    pub fn base_folder(&self) -> &str {
        self.base_folder.trim_matches('/')
    }

    /// Whether the given field is appended on presentation.
    #[must_use]
    pub fn appends(&self, append: AttachmentsAppend) -> bool {
        self.appends.contains(&append)
    }

    /// Set the base folder.
    #[must_use]
    pub fn with_base_folder(mut self, folder: impl Into<String>) -> Self {
        self.base_folder = folder.into();
        self
    }

    /// Enable or disable the per-attachment wrapper folder.
    #[must_use]
    pub fn with_wrapper_folder(mut self, enabled: bool) -> Self {
        self.wrapper_folder = enabled;
        self
    }

    /// Replace the presentation appends.
    #[must_use]
    pub fn with_appends(mut self, appends: impl IntoIterator<Item = AttachmentsAppend>) -> Self {
        self.appends = appends.into_iter().collect();
        self
    }

    /// Configure path obfuscation.
    #[must_use]
    pub fn with_path_obfuscation(mut self, enabled: bool, levels: u32) -> Self {
        self.path_obfuscation = PathObfuscationConfig { enabled, levels };
        self
    }

    /// Set the signed storage temp folder.
    #[must_use]
    pub fn with_temp_folder(mut self, folder: impl Into<String>) -> Self {
        self.signed_storage.temp_folder = folder.into();
        self
    }
}

/// Path obfuscation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathObfuscationConfig {
    /// Insert random single-character directories into generated paths.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of random directories.
    #[serde(default = "default_levels")]
    pub levels: u32,
}

fn default_true() -> bool {
    true
}

fn default_levels() -> u32 {
    3
}

impl Default for PathObfuscationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            levels: default_levels(),
        }
    }
}

impl PathObfuscationConfig {
    /// Number of random directories, never less than one.
    #[must_use]
    pub fn levels(&self) -> usize {
        usize::try_from(self.levels.max(1)).unwrap_or(1)
    }
}

/// Signed storage (presigned upload) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedStorageConfig {
    /// Mount the presigned upload URL route.
    #[serde(default)]
    pub enabled: bool,
    /// Folder presigned uploads are staged in before reconciliation moves them.
    #[serde(default = "default_temp_folder")]
    pub temp_folder: String,
    /// Minutes a presigned upload URL stays valid.
    #[serde(default = "default_expire_after")]
    pub expire_after: u64,
    /// Route settings for the presigned upload URL endpoint.
    #[serde(default)]
    pub route: SignedStorageRoute,
}

fn default_temp_folder() -> String {
    "tmp".to_string()
}

fn default_expire_after() -> u64 {
    5
}

impl Default for SignedStorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            temp_folder: default_temp_folder(),
            expire_after: default_expire_after(),
            route: SignedStorageRoute::default(),
        }
    }
}

impl SignedStorageConfig {
    /// Temp folder with leading and trailing slashes removed.
    #[must_use]
    pub fn temp_folder(&self) -> &str {
        self.temp_folder.trim_matches('/')
    }

    /// Lifetime of a presigned upload URL.
    #[must_use]
    pub fn expire_duration(&self) -> Duration {
        Duration::from_secs(self.expire_after.saturating_mul(60))
    }
}

/// Route settings for the presigned upload URL endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedStorageRoute {
    /// Path the endpoint is mounted at.
    #[serde(default = "default_route_url")]
    pub url: String,
}

fn default_route_url() -> String {
    "/attachments/signed-storage-url".to_string()
}

impl Default for SignedStorageRoute {
    fn default() -> Self {
        Self {
            url: default_route_url(),
        }
    }
}
