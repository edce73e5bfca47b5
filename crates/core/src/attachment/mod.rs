//! Attachment lifecycle engine.
//!
//! A record stores a compact map of named slots to storage paths. This module
//! keeps that map and the storage backend in step:
//!
//! - Path generation for new files (optional obfuscation and wrapper folders)
//! - Reconciliation of the current map against a desired one
//! - Presentation of the map as path / url / exists
//! - Cleanup when a record is permanently deleted
//!
//! ```text
//! desired ──► AttachmentManager::reconcile ──► StorageGateway (put / move / delete)
//!                     │
//!                     └──► RawAttachmentMap ──► record column
//!                                     │
//!                                     └──► AttachmentManager::present ──► PresentedAttachments
//! ```

mod error;
mod path;
mod presenter;
mod record;
mod service;
mod types;
mod validation;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod path_props;
#[cfg(test)]
mod service_props;

pub use error::AttachmentError;
pub use path::{PathGenerator, TOKEN_LEN, random_token};
pub use record::{HasAttachments, SoftDeleteState};
pub use service::AttachmentManager;
pub use types::{
    AttachmentSlot, DesiredAttachment, DesiredAttachments, PreSignedUpload, PresentedAttachment,
    PresentedAttachments, RawAttachmentMap,
};
