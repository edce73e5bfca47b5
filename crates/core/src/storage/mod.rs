//! Storage gateway for attachment files using Apache OpenDAL.
//!
//! The attachment engine only talks to storage through [`StorageGateway`].
//! [`StorageService`] implements it for every OpenDAL provider we configure:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem (development only)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.write("key", data)      │ op.presign_read("key", duration)   │
//! │ op.rename("from", "to")    │ op.presign_write("key", duration)  │
//! │ op.delete("key")           │ op.stat("key")                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod error;
mod gateway;
mod service;

pub use attache_shared::config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use gateway::{StorageGateway, UploadedFile, file_extension, join_path};
pub use service::{AttachmentMetadata, PresignedUrl, StorageService, UploadRequest};
