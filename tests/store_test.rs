//! Version store behavior against a real on-disk SQLite database.

use chrono::DateTime;
use draftd::storage::{Storage, StoreError};

async fn test_storage() -> Storage {
    let data_dir = tempfile::tempdir().unwrap().keep();
    Storage::new(&data_dir).await.unwrap()
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let storage = test_storage().await;
    storage.insert_document_with_id(1, "Hello").await.unwrap();
    let document = storage.get_document(1).await.unwrap();

    let created = storage.create_version(1, "Hello v2").await.unwrap();
    let fetched = storage.get_version(created.id).await.unwrap();

    assert_eq!(fetched.content, "Hello v2");
    assert_eq!(fetched.parent_document_id, 1);

    let doc_ts = DateTime::parse_from_rfc3339(&document.created_at).unwrap();
    let ver_ts = DateTime::parse_from_rfc3339(&fetched.created_at).unwrap();
    assert!(ver_ts >= doc_ts);
}

#[tokio::test]
async fn empty_content_is_accepted() {
    let storage = test_storage().await;
    let version = storage.create_version(1, "").await.unwrap();
    assert_eq!(storage.get_version(version.id).await.unwrap().content, "");
}

#[tokio::test]
async fn delete_then_get_reports_not_found() {
    let storage = test_storage().await;
    let version = storage.create_version(1, "snapshot").await.unwrap();

    storage.delete_version(version.id).await.unwrap();
    assert!(matches!(
        storage.get_version(version.id).await,
        Err(StoreError::VersionNotFound(_))
    ));
}

#[tokio::test]
async fn double_delete_reports_not_found_second_time() {
    let storage = test_storage().await;
    let version = storage.create_version(1, "snapshot").await.unwrap();

    storage.delete_version(version.id).await.unwrap();
    assert!(matches!(
        storage.delete_version(version.id).await,
        Err(StoreError::VersionNotFound(_))
    ));
}

#[tokio::test]
async fn version_ids_are_never_reused() {
    let storage = test_storage().await;
    let first = storage.create_version(1, "a").await.unwrap();
    storage.delete_version(first.id).await.unwrap();
    let second = storage.create_version(1, "b").await.unwrap();
    assert!(second.id > first.id);
}

#[tokio::test]
async fn listing_is_sorted_and_scoped_to_the_document() {
    let storage = test_storage().await;
    // Interleave inserts across two documents.
    let a1 = storage.create_version(1, "a1").await.unwrap();
    let b1 = storage.create_version(2, "b1").await.unwrap();
    let a2 = storage.create_version(1, "a2").await.unwrap();
    let a3 = storage.create_version(1, "a3").await.unwrap();

    let listed = storage.list_versions_for_document(1).await.unwrap();
    assert_eq!(
        listed.iter().map(|v| v.id).collect::<Vec<_>>(),
        vec![a1.id, a2.id, a3.id]
    );
    assert!(listed.iter().all(|v| v.parent_document_id == 1));
    assert!(!listed.iter().any(|v| v.id == b1.id));

    // Non-decreasing created_at regardless of how close the inserts were.
    let stamps: Vec<_> = listed
        .iter()
        .map(|v| DateTime::parse_from_rfc3339(&v.created_at).unwrap())
        .collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn unknown_document_lists_empty_not_error() {
    let storage = test_storage().await;
    assert!(storage.list_versions_for_document(404).await.unwrap().is_empty());
}

#[tokio::test]
async fn grouped_listing_keeps_dangling_parents() {
    let storage = test_storage().await;
    storage.insert_document_with_id(1, "doc").await.unwrap();
    storage.create_version(1, "of doc 1").await.unwrap();
    // No document 99 exists — the version still groups under 99.
    storage.create_version(99, "orphan").await.unwrap();

    let grouped = storage.list_all_versions_grouped().await.unwrap();
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped[&99].len(), 1);
    assert_eq!(grouped[&1].len(), 1);
}

#[tokio::test]
async fn version_content_can_be_amended_in_place() {
    let storage = test_storage().await;
    let version = storage.create_version(1, "first draft").await.unwrap();

    let updated = storage
        .update_version_content(version.id, "amended")
        .await
        .unwrap();
    assert_eq!(updated.id, version.id);
    assert_eq!(updated.content, "amended");
    assert_eq!(storage.get_version(version.id).await.unwrap().content, "amended");

    assert!(matches!(
        storage.update_version_content(9999, "x").await,
        Err(StoreError::VersionNotFound(9999))
    ));
}

#[tokio::test]
async fn document_save_is_idempotent() {
    let storage = test_storage().await;
    storage.insert_document_with_id(1, "Hello").await.unwrap();

    storage.save_document_content(1, "Hello again").await.unwrap();
    storage.save_document_content(1, "Hello again").await.unwrap();
    assert_eq!(storage.get_document(1).await.unwrap().content, "Hello again");

    assert!(matches!(
        storage.get_document(5).await,
        Err(StoreError::DocumentNotFound(5))
    ));
    assert!(matches!(
        storage.save_document_content(5, "x").await,
        Err(StoreError::DocumentNotFound(5))
    ));
}
