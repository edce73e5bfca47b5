//! Shared configuration and error types for Attache.
//!
//! This crate provides the pieces every other crate reads:
//! - Attachment lifecycle settings (base folder, obfuscation, appends, signed storage)
//! - Storage provider settings
//! - Application-wide error types
//! - Configuration loading

pub mod config;
pub mod error;

pub use config::{
    AppConfig, AttachmentsAppend, AttachmentsConfig, PathObfuscationConfig, ServerConfig,
    SignedStorageConfig, SignedStorageRoute, StorageConfig, StorageProvider,
};
pub use error::{AppError, AppResult};
