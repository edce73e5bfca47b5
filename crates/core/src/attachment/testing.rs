//! In-memory storage double for attachment tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bytes::Bytes;
use uuid::Uuid;

use crate::storage::{StorageError, StorageGateway, UploadedFile, join_path};

/// Number of gateway calls made, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub exists: usize,
    pub url: usize,
    pub put: usize,
    pub moves: usize,
    pub deletes: usize,
    pub directory_deletes: usize,
}

impl Calls {
    /// Deletes of any kind.
    pub fn removals(&self) -> usize {
        self.deletes + self.directory_deletes
    }
}

/// Storage double keeping files in a map.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<BTreeMap<String, Bytes>>,
    calls: Mutex<Calls>,
    collisions: AtomicUsize,
    fail_exists: AtomicBool,
    fail_put: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with the given paths.
    pub fn with_files<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let storage = Self::new();
        for path in paths {
            storage.put(path);
        }
        storage
    }

    pub fn put(&self, path: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), Bytes::from_static(b"data"));
    }

    pub fn has(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn calls(&self) -> Calls {
        *self.calls.lock().unwrap()
    }

    pub fn reset_calls(&self) {
        *self.calls.lock().unwrap() = Calls::default();
    }

    /// Make the next `n` existence checks report a collision.
    pub fn collide_next(&self, n: usize) {
        self.collisions.store(n, Ordering::SeqCst);
    }

    pub fn fail_exists(&self) {
        self.fail_exists.store(true, Ordering::SeqCst);
    }

    pub fn fail_put(&self) {
        self.fail_put.store(true, Ordering::SeqCst);
    }

    fn record(&self, f: impl FnOnce(&mut Calls)) {
        f(&mut self.calls.lock().unwrap());
    }
}

impl StorageGateway for MemoryStorage {
    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        self.record(|c| c.exists += 1);
        if self.fail_exists.load(Ordering::SeqCst) {
            return Err(StorageError::operation("backend unreachable"));
        }
        if self
            .collisions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(true);
        }

        let files = self.files.lock().unwrap();
        if path.ends_with('/') {
            Ok(files.keys().any(|key| key.starts_with(path)))
        } else {
            Ok(files.contains_key(path))
        }
    }

    async fn url(&self, path: &str) -> Result<String, StorageError> {
        self.record(|c| c.url += 1);
        Ok(format!("https://files.test/{path}"))
    }

    async fn put_new_file(&self, directory: &str, file: &UploadedFile) -> Result<String, StorageError> {
        self.record(|c| c.put += 1);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(StorageError::operation("disk full"));
        }

        let id = Uuid::new_v4().simple();
        let leaf = match file.extension() {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        };
        let path = join_path(directory, &leaf);
        self.files
            .lock()
            .unwrap()
            .insert(path.clone(), file.contents.clone());
        Ok(path)
    }

    async fn move_file(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.record(|c| c.moves += 1);
        let mut files = self.files.lock().unwrap();
        let contents = files.remove(from).ok_or_else(|| StorageError::not_found(from))?;
        files.insert(to.to_string(), contents);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.record(|c| c.deletes += 1);
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    async fn delete_directory(&self, path: &str) -> Result<(), StorageError> {
        self.record(|c| c.directory_deletes += 1);
        let prefix = format!("{}/", path.trim_matches('/'));
        self.files
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }
}
