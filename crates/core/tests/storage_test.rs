//! Integration tests for StorageService on the local filesystem backend.

use attache_core::storage::{
    StorageConfig, StorageError, StorageGateway, StorageProvider, StorageService, UploadedFile,
};
use tempfile::TempDir;

/// Create a storage service rooted in a fresh temp directory.
fn local_storage() -> (TempDir, StorageService) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = StorageConfig::new(StorageProvider::local_fs(dir.path()))
        .with_public_url("https://cdn.example.com/files/");
    let service = StorageService::from_config(config).expect("Failed to create storage service");
    (dir, service)
}

#[tokio::test]
async fn test_put_new_file_and_exists() {
    let (dir, storage) = local_storage();
    let file = UploadedFile::new("Report.PDF", b"%PDF-1.7".to_vec());

    let path = storage
        .put_new_file("uploads/a/b", &file)
        .await
        .expect("Failed to store file");

    assert!(path.starts_with("uploads/a/b/"));
    assert!(path.ends_with(".pdf"));
    assert!(storage.exists(&path).await.expect("stat"));
    assert!(storage.exists("uploads/a/b/").await.expect("stat"));
    assert!(dir.path().join(&path).is_file());

    let meta = storage.stat(&path).await.expect("Failed to stat file");
    assert_eq!(meta.file_size, 8);
}

#[tokio::test]
async fn test_put_new_file_at_root() {
    let (_dir, storage) = local_storage();
    let path = storage
        .put_new_file("", &UploadedFile::new("notes", b"hello".to_vec()))
        .await
        .expect("Failed to store file");

    assert!(!path.contains('/'));
    assert!(!path.contains('.'));
    assert!(storage.exists(&path).await.expect("stat"));
}

#[tokio::test]
async fn test_exists_missing() {
    let (_dir, storage) = local_storage();
    assert!(!storage.exists("nope.txt").await.expect("stat"));
    assert!(!storage.exists("nope/").await.expect("stat"));
}

#[tokio::test]
async fn test_url_uses_public_base() {
    let (_dir, storage) = local_storage();
    let url = storage.url("/uploads/x.png").await.expect("url");
    assert_eq!(url, "https://cdn.example.com/files/uploads/x.png");
}

#[tokio::test]
async fn test_url_without_public_base_is_root_relative() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let storage = StorageService::from_config(StorageConfig::new(StorageProvider::local_fs(
        dir.path(),
    )))
    .expect("Failed to create storage service");

    let url = storage.url("uploads/x.png").await.expect("url");
    assert_eq!(url, "/uploads/x.png");
}

#[tokio::test]
async fn test_move_file() {
    let (_dir, storage) = local_storage();
    let temp = storage
        .put_new_file("tmp", &UploadedFile::new("x.bin", b"abc".to_vec()))
        .await
        .expect("Failed to store file");

    storage
        .move_file(&temp, "uploads/q/final.bin")
        .await
        .expect("Failed to move file");

    assert!(!storage.exists(&temp).await.expect("stat"));
    assert!(storage.exists("uploads/q/final.bin").await.expect("stat"));
}

#[tokio::test]
async fn test_move_missing_file_is_not_found() {
    let (_dir, storage) = local_storage();
    let err = storage
        .move_file("tmp/missing", "uploads/missing")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (_dir, storage) = local_storage();
    let path = storage
        .put_new_file("docs", &UploadedFile::new("a.txt", b"a".to_vec()))
        .await
        .expect("Failed to store file");

    storage.delete(&path).await.expect("first delete");
    storage.delete(&path).await.expect("second delete");
    assert!(!storage.exists(&path).await.expect("stat"));
}

#[tokio::test]
async fn test_delete_directory_removes_subtree_only() {
    let (_dir, storage) = local_storage();
    let inside = UploadedFile::new("a.txt", b"a".to_vec());
    let first = storage.put_new_file("docs/token", &inside).await.expect("store");
    let nested = storage.put_new_file("docs/token/thumbs", &inside).await.expect("store");
    let outside = storage.put_new_file("docs/other", &inside).await.expect("store");

    storage.delete_directory("docs/token").await.expect("Failed to delete directory");

    assert!(!storage.exists(&first).await.expect("stat"));
    assert!(!storage.exists(&nested).await.expect("stat"));
    assert!(!storage.exists("docs/token/").await.expect("stat"));
    assert!(storage.exists(&outside).await.expect("stat"));

    storage
        .delete_directory("docs/token")
        .await
        .expect("missing directory is not an error");
}
