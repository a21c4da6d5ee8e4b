//! Trait contract tests for FeedbackStore.
//!
//! Every conforming implementation must pass these; each contract runs
//! against the in-memory fake and the filesystem store.

use chrono::Duration;
use colloquy_store::fakes::MemoryFeedbackStore;
use colloquy_store::storage_traits::*;
use colloquy_store::{FeedbackId, FeedbackRecord, FsFeedbackStore, InputDigest, StorageError};

fn record(summary: &str, age_secs: i64) -> FeedbackRecord {
    let mut rec = FeedbackRecord::new(
        "Hey, um, do you have any plans for the weekend?",
        summary,
        0.64,
        serde_json::json!([
            { "category": "FLUENCY", "score": 0.55 },
            { "category": "PRAGMATICS", "score": 0.73 }
        ]),
        4200,
    );
    rec.created_at -= Duration::seconds(age_secs);
    rec
}

async fn contract_round_trip(store: &dyn FeedbackStore) {
    let rec = record("round trip", 0);
    store.save(&rec).await.unwrap();
    let fetched = store.get(&rec.id).await.unwrap();

    assert_eq!(fetched, rec);
    assert_eq!(fetched.reports[1]["category"], "PRAGMATICS");
    assert_eq!(fetched.elapsed_ms, 4200);
}

async fn contract_not_found(store: &dyn FeedbackStore) {
    let err = store.get(&FeedbackId::new()).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

async fn contract_most_recent(store: &dyn FeedbackStore) {
    assert!(store.most_recent().await.unwrap().is_none());

    let oldest = record("oldest", 300);
    let newest = record("newest", 0);
    let middle = record("middle", 120);
    for rec in [&oldest, &newest, &middle] {
        store.save(rec).await.unwrap();
    }

    let latest = store.most_recent().await.unwrap().unwrap();
    assert_eq!(latest.id, newest.id);
}

async fn contract_save_overwrites_same_id(store: &dyn FeedbackStore) {
    let mut rec = record("draft", 0);
    store.save(&rec).await.unwrap();
    rec.summary = "final".to_string();
    store.save(&rec).await.unwrap();

    assert_eq!(store.get(&rec.id).await.unwrap().summary, "final");
}

#[tokio::test]
async fn memory_store_round_trip() {
    contract_round_trip(&MemoryFeedbackStore::new()).await;
}

#[tokio::test]
async fn memory_store_not_found() {
    contract_not_found(&MemoryFeedbackStore::new()).await;
}

#[tokio::test]
async fn memory_store_most_recent() {
    contract_most_recent(&MemoryFeedbackStore::new()).await;
}

#[tokio::test]
async fn memory_store_overwrite() {
    contract_save_overwrites_same_id(&MemoryFeedbackStore::new()).await;
}

#[tokio::test]
async fn fs_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    contract_round_trip(&FsFeedbackStore::new(dir.path()).unwrap()).await;
}

#[tokio::test]
async fn fs_store_not_found() {
    let dir = tempfile::tempdir().unwrap();
    contract_not_found(&FsFeedbackStore::new(dir.path()).unwrap()).await;
}

#[tokio::test]
async fn fs_store_most_recent() {
    let dir = tempfile::tempdir().unwrap();
    contract_most_recent(&FsFeedbackStore::new(dir.path()).unwrap()).await;
}

#[tokio::test]
async fn fs_store_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    contract_save_overwrites_same_id(&FsFeedbackStore::new(dir.path()).unwrap()).await;
}

#[tokio::test]
async fn fs_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let rec = record("persisted", 0);
    FsFeedbackStore::new(dir.path())
        .unwrap()
        .save(&rec)
        .await
        .unwrap();

    let reopened = FsFeedbackStore::new(dir.path()).unwrap();
    let latest = reopened.most_recent().await.unwrap().unwrap();
    assert_eq!(latest.id, rec.id);
    assert_eq!(
        latest.input_digest,
        InputDigest::of_text("Hey, um, do you have any plans for the weekend?")
    );
}
