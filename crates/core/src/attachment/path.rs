//! Storage path generation for new attachments.
//!
//! A generated path is a directory, built from:
//!
//! ```text
//! {base_folder}/{c1}/{c2}/{c3}/{token}
//!               └─ obfuscation ─┘ └─ wrapper folder
//! ```
//!
//! Obfuscation segments are single characters drawn from a fresh random
//! token. The wrapper folder is the whole token, which gives the attachment a
//! private directory. With everything disabled the path is empty and files
//! land at the storage root.

use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::warn;

use attache_shared::config::AttachmentsConfig;

use crate::storage::{StorageError, StorageGateway};

/// Length of the random token, in hex characters.
pub const TOKEN_LEN: usize = 32;

/// Builds unique, optionally obfuscated storage directories.
#[derive(Debug, Clone)]
pub struct PathGenerator {
    base_folder: String,
    obfuscation_levels: Option<usize>,
    wrapper_folder: bool,
}

impl PathGenerator {
    /// Create a generator from attachment configuration.
    #[must_use]
    pub fn new(config: &AttachmentsConfig) -> Self {
        Self {
            base_folder: config.base_folder().to_string(),
            obfuscation_levels: config
                .path_obfuscation
                .enabled
                .then(|| config.path_obfuscation.levels()),
            wrapper_folder: config.wrapper_folder,
        }
    }

    /// Generate a directory for a new attachment.
    ///
    /// With a wrapper folder the directory must not exist yet; on collision a
    /// new token is drawn. Without one the directory is shared between
    /// attachments and uniqueness comes from the leaf name.
    pub async fn generate<S: StorageGateway>(&self, storage: &S) -> Result<String, StorageError> {
        loop {
            let path = self.candidate();
            if !self.wrapper_folder || path.is_empty() {
                return Ok(path);
            }

            if !storage.exists(&format!("{path}/")).await? {
                return Ok(path);
            }

            warn!(path = %path, "generated attachment path already exists, regenerating");
        }
    }

    /// Build a candidate path from a fresh random token, without checking storage.
    #[must_use]
    pub fn candidate(&self) -> String {
        self.build(&random_token())
    }

    /// Build the path for a given token.
    #[must_use]
    pub fn build(&self, token: &str) -> String {
        let mut segments: Vec<&str> = Vec::new();

        if !self.base_folder.is_empty() {
            segments.push(&self.base_folder);
        }

        if let Some(levels) = self.obfuscation_levels.filter(|_| !token.is_empty() && token.is_ascii()) {
            let mut rng = rand::rng();
            for _ in 0..levels {
                let at = rng.random_range(0..token.len());
                segments.push(&token[at..=at]);
            }
        }

        if self.wrapper_folder {
            segments.push(token);
        }

        segments.join("/")
    }
}

/// Random hex token: SHA-256 of the current time and a random seed.
///
/// Collision resistant in practice, not unique by construction.
#[must_use]
pub fn random_token() -> String {
    let mut hasher = Sha256::new();
    hasher.update(Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.update(rand::random::<u64>().to_le_bytes());

    let mut token = format!("{:x}", hasher.finalize());
    token.truncate(TOKEN_LEN);
    token
}
