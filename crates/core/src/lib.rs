//! Attachment lifecycle engine for Attache.
//!
//! Records keep a compact slot → path map in a single column. This crate
//! turns a caller's desired attachments into that map, moving uploads into a
//! managed storage layout and deleting whatever is replaced or removed.
//!
//! # Modules
//!
//! - `storage` - Storage gateway trait and the OpenDAL-backed implementation
//! - `attachment` - Path generation, reconciliation, presentation, lifecycle hook

pub mod attachment;
pub mod storage;
