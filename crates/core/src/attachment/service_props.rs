//! Property-based tests for AttachmentManager reconciliation.
//!
//! - Slots missing from the desired map are carried over unchanged
//! - Every resulting path exists in storage and none points into the temp folder
//! - Cleared slots disappear and their files are deleted

use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::prelude::*;

use attache_shared::config::AttachmentsConfig;

use super::service::AttachmentManager;
use super::testing::MemoryStorage;
use super::types::{DesiredAttachment, DesiredAttachments, PreSignedUpload, RawAttachmentMap};
use crate::storage::UploadedFile;

/// What a generated desired value should become.
#[derive(Debug, Clone, Copy)]
enum Action {
    Upload,
    PreSigned,
    KeepLiteral,
    Delete,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Upload),
        Just(Action::PreSigned),
        Just(Action::KeepLiteral),
        Just(Action::Delete),
    ]
}

fn slot() -> impl Strategy<Value = String> {
    "[a-e]"
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

/// Current map where slot `s` points at `stored/{s}/file.bin`.
fn current_map(slots: &[String]) -> RawAttachmentMap {
    slots
        .iter()
        .map(|slot| (slot.clone(), format!("stored/{slot}/file.bin")))
        .collect()
}

fn build_desired(actions: &BTreeMap<String, Action>, current: &RawAttachmentMap) -> DesiredAttachments {
    actions
        .iter()
        .map(|(slot, action)| {
            let value = match action {
                Action::Upload => UploadedFile::new(format!("{slot}.txt"), b"x".to_vec()).into(),
                Action::PreSigned => PreSignedUpload::new(format!("tmp/{slot}"), "upload.dat").into(),
                Action::KeepLiteral => match current.get(slot) {
                    Some(path) => DesiredAttachment::Path(path.to_string()),
                    None => DesiredAttachment::Delete,
                },
                Action::Delete => DesiredAttachment::Delete,
            };
            (slot.clone(), value)
        })
        .collect()
}

fn config(wrapper: bool, obfuscation: bool) -> AttachmentsConfig {
    AttachmentsConfig::default()
        .with_base_folder("uploads")
        .with_path_obfuscation(obfuscation, 2)
        .with_wrapper_folder(wrapper)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Reconciliation keeps the raw map consistent with storage.
    #[test]
    fn prop_reconcile_consistent_with_storage(
        existing in prop::collection::btree_set(slot(), 0..4),
        actions in prop::collection::btree_map(slot(), action(), 1..5),
        wrapper in any::<bool>(),
        obfuscation in any::<bool>(),
    ) {
        let existing: Vec<String> = existing.into_iter().collect();
        let current = current_map(&existing);

        let storage = Arc::new(MemoryStorage::new());
        for path in current.paths() {
            storage.put(path);
        }
        for slot in actions.keys() {
            storage.put(&format!("tmp/{slot}"));
        }

        let manager = AttachmentManager::new(storage.clone(), config(wrapper, obfuscation));
        let desired = build_desired(&actions, &current);
        let raw = block_on(manager.reconcile(&current, desired)).unwrap();

        for (slot, path) in raw.iter() {
            prop_assert!(storage.has(path), "missing {} for slot {}", path, slot);
            prop_assert!(!path.starts_with("tmp/"));
        }

        for (slot, path) in current.iter() {
            match actions.get(slot) {
                None | Some(Action::KeepLiteral) => prop_assert_eq!(raw.get(slot), Some(path)),
                Some(Action::Delete) => {
                    prop_assert!(!raw.contains(slot));
                    prop_assert!(!storage.has(path));
                }
                Some(Action::Upload | Action::PreSigned) => {
                    prop_assert!(raw.get(slot).is_some_and(|new| new != path));
                    prop_assert!(!storage.has(path));
                }
            }
        }

        for (slot, action) in &actions {
            if !current.contains(slot) {
                let filled = matches!(action, Action::Upload | Action::PreSigned);
                prop_assert_eq!(raw.contains(slot), filled);
            }
        }
    }

    /// An empty desired map empties both the raw map and storage.
    #[test]
    fn prop_empty_desired_clears_everything(
        existing in prop::collection::btree_set(slot(), 0..5),
        wrapper in any::<bool>(),
    ) {
        let existing: Vec<String> = existing.into_iter().collect();
        let current = current_map(&existing);
        let storage = Arc::new(MemoryStorage::with_files(current.paths()));

        let manager = AttachmentManager::new(storage.clone(), config(wrapper, true));
        let raw = block_on(manager.reconcile(&current, DesiredAttachments::new())).unwrap();

        prop_assert!(raw.is_empty());
        prop_assert!(storage.paths().is_empty());
    }
}
