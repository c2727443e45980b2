use std::collections::HashSet;
use std::sync::Arc;

use feedback_lib::{Fields, JsonFileStore, MemoryStore, SledStore, SubmissionStore};
use serde_json::json;
use tempfile::TempDir;

fn full_name(name: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert("fullName".to_string(), json!(name));
    fields
}

async fn run_feedback_scenario(store: &dyn SubmissionStore) {
    store.ensure_initialized().await.unwrap();
    assert!(store.list_all().await.unwrap().is_empty());

    let ada = store.append(full_name("Ada")).await.unwrap();
    assert_eq!(ada.field_str("fullName"), Some("Ada"));
    assert!(!ada.id.is_empty());
    assert!(!ada.timestamp.is_empty());
    assert_eq!(store.list_all().await.unwrap().len(), 1);

    let grace = store.append(full_name("Grace")).await.unwrap();
    let all = store.list_all().await.unwrap();
    assert_eq!(all, vec![ada.clone(), grace.clone()]);

    assert!(store.remove(&ada.id).await.unwrap());
    assert_eq!(store.list_all().await.unwrap(), vec![grace.clone()]);

    assert!(!store.remove(&ada.id).await.unwrap());
    assert_eq!(store.list_all().await.unwrap(), vec![grace]);
}

async fn run_uniqueness(store: &dyn SubmissionStore) {
    store.ensure_initialized().await.unwrap();
    let mut ids = HashSet::new();
    for i in 0..25 {
        let mut fields = Fields::new();
        fields.insert("n".to_string(), json!(i));
        ids.insert(store.append(fields).await.unwrap().id);
    }
    assert_eq!(ids.len(), 25);
    assert_eq!(store.list_all().await.unwrap().len(), 25);
}

#[tokio::test]
async fn test_json_file_scenario() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("submissions.json"));
    run_feedback_scenario(&store).await;
}

#[tokio::test]
async fn test_memory_scenario() {
    run_feedback_scenario(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_sled_scenario() {
    let dir = TempDir::new().unwrap();
    let store = SledStore::open(dir.path().join("sled")).unwrap();
    run_feedback_scenario(&store).await;
}

#[tokio::test]
async fn test_ids_unique_across_backends() {
    let dir = TempDir::new().unwrap();
    run_uniqueness(&JsonFileStore::new(dir.path().join("submissions.json"))).await;
    run_uniqueness(&MemoryStore::new()).await;
    run_uniqueness(&SledStore::open(dir.path().join("sled")).unwrap()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_through_trait_object() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SubmissionStore> =
        Arc::new(JsonFileStore::new(dir.path().join("submissions.json")));
    store.ensure_initialized().await.unwrap();

    let tasks: Vec<_> = (0..40)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.append(full_name(&format!("user-{i}"))).await })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        result.unwrap().unwrap();
    }

    assert_eq!(store.list_all().await.unwrap().len(), 40);
}

#[tokio::test]
async fn test_json_file_survives_new_instance() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("submissions.json");

    let created = {
        let store = JsonFileStore::new(&path);
        store.ensure_initialized().await.unwrap();
        store.append(full_name("Ada")).await.unwrap()
    };

    let store = JsonFileStore::new(&path);
    store.ensure_initialized().await.unwrap();
    assert_eq!(store.list_all().await.unwrap(), vec![created]);
}
