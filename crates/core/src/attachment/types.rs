//! Attachment types and data structures.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::storage::UploadedFile;

/// Named logical attachment position on a record, e.g. `avatar`.
pub type AttachmentSlot = String;

/// Caller-supplied desired attachments, keyed by slot.
pub type DesiredAttachments = BTreeMap<AttachmentSlot, DesiredAttachment>;

/// Presented attachments, keyed by slot.
pub type PresentedAttachments = BTreeMap<AttachmentSlot, PresentedAttachment>;

/// The persisted slot → storage path map.
///
/// Stored as a JSON object in a single column. Slots never map to empty
/// values: deletions remove the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RawAttachmentMap(BTreeMap<AttachmentSlot, String>);

impl RawAttachmentMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the map from a column value. `NULL`, an empty string and JSON `null` yield an empty map.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON object of strings or nulls.
    pub fn from_column(value: Option<&str>) -> Result<Self, serde_json::Error> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::new()),
            Some(json) => Ok(serde_json::from_str::<Option<Self>>(json)?.unwrap_or_default()),
        }
    }

    /// Column value for this map. An empty map clears the column.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_column(&self) -> Result<Option<String>, serde_json::Error> {
        if self.0.is_empty() {
            return Ok(None);
        }
        serde_json::to_string(self).map(Some)
    }

    /// Path stored in a slot.
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<&str> {
        self.0.get(slot).map(String::as_str)
    }

    /// Set a slot. An empty path removes the slot instead.
    pub fn insert(&mut self, slot: impl Into<AttachmentSlot>, path: impl Into<String>) {
        let slot = slot.into();
        let path = path.into();
        if path.is_empty() {
            self.0.remove(&slot);
        } else {
            self.0.insert(slot, path);
        }
    }

    /// Remove a slot, returning its path.
    pub fn remove(&mut self, slot: &str) -> Option<String> {
        self.0.remove(slot)
    }

    /// Whether the slot holds a path.
    #[must_use]
    pub fn contains(&self, slot: &str) -> bool {
        self.0.contains_key(slot)
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(slot, path)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(slot, path)| (slot.as_str(), path.as_str()))
    }

    /// Iterate over stored paths.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }
}

impl<'de> Deserialize<'de> for RawAttachmentMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<AttachmentSlot, Option<String>>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .filter_map(|(slot, path)| path.filter(|p| !p.is_empty()).map(|p| (slot, p)))
            .collect())
    }
}

impl<S: Into<AttachmentSlot>, P: Into<String>> FromIterator<(S, P)> for RawAttachmentMap {
    fn from_iter<I: IntoIterator<Item = (S, P)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (slot, path) in iter {
            map.insert(slot, path);
        }
        map
    }
}

/// Descriptor of a file the client already uploaded to the temp folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreSignedUpload {
    /// Temp storage path returned by the presigned upload endpoint.
    pub path: String,
    /// Original client filename; only its extension is kept.
    #[serde(default)]
    pub name: String,
}

impl PreSignedUpload {
    /// Create a descriptor.
    #[must_use]
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

/// What the caller wants a slot to hold after reconciliation.
#[derive(Debug, Clone)]
pub enum DesiredAttachment {
    /// Store a newly uploaded file.
    NewFile(UploadedFile),
    /// Adopt a file uploaded through a presigned URL.
    PreSigned(PreSignedUpload),
    /// Keep the attachment whose path this is. Any other path clears the slot.
    Path(String),
    /// Clear the slot.
    Delete,
}

impl DesiredAttachment {
    /// Classify a JSON value.
    ///
    /// Strings are path literals, objects with a string `path` are presigned
    /// descriptors. Anything else (including `null`) clears the slot.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(path) => Self::Path(path),
            Value::Object(ref object) if object.get("path").is_some_and(Value::is_string) => {
                serde_json::from_value(value).map_or(Self::Delete, Self::PreSigned)
            }
            _ => Self::Delete,
        }
    }

    /// Classify every slot of a JSON object. Non-objects yield no slots.
    #[must_use]
    pub fn map_from_json(value: Value) -> DesiredAttachments {
        match value {
            Value::Object(object) => object
                .into_iter()
                .map(|(slot, value)| (slot, Self::from_json(value)))
                .collect(),
            _ => DesiredAttachments::new(),
        }
    }

    /// Whether this value leaves the given current path untouched.
    #[must_use]
    pub fn keeps(&self, current: &str) -> bool {
        matches!(self, Self::Path(path) if path == current)
    }
}

impl From<UploadedFile> for DesiredAttachment {
    fn from(file: UploadedFile) -> Self {
        Self::NewFile(file)
    }
}

impl From<PreSignedUpload> for DesiredAttachment {
    fn from(upload: PreSignedUpload) -> Self {
        Self::PreSigned(upload)
    }
}

/// Read-side view of one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PresentedAttachment {
    /// Raw storage path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// URL derived from the storage backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Whether the object exists in storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
}

impl PresentedAttachment {
    /// Whether no field was filled in.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.url.is_none() && self.exists.is_none()
    }
}
