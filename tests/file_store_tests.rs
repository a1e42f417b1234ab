//! Durable predicate store tests.

use routewl::{
    FilePredicateStore, PathPredicate, PathSet, PredicateStatus, PredicateStore, RepositoryId,
};

fn id(s: &str) -> RepositoryId {
    RepositoryId::from(s)
}

fn available(paths: &[&str]) -> PathPredicate {
    PathPredicate::available(PathSet::from_paths(paths, 2))
}

#[tokio::test]
async fn put_then_get_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let store = FilePredicateStore::new(dir.path()).expect("store init failed");

    let predicate = available(&["/org/example/widget", "/com/acme/tool"]);
    store.put(&id("central"), &predicate).await.expect("put failed");

    let loaded = store.get(&id("central")).await.expect("get failed");
    assert_eq!(loaded, predicate);
}

#[tokio::test]
async fn absent_record_reads_as_unknown() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let store = FilePredicateStore::new(dir.path()).expect("store init failed");

    let loaded = store.get(&id("nowhere")).await.expect("get failed");
    assert_eq!(loaded.status(), PredicateStatus::Unknown);
}

#[tokio::test]
async fn survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let predicate = available(&["/org/example"]);

    {
        let store = FilePredicateStore::new(dir.path()).expect("store init failed");
        store.put(&id("central"), &predicate).await.expect("put failed");
    }

    let reopened = FilePredicateStore::new(dir.path()).expect("store reopen failed");
    let loaded = reopened.get(&id("central")).await.expect("get failed");
    assert_eq!(loaded, predicate);
}

#[tokio::test]
async fn corrupt_record_degrades_to_unknown() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let store = FilePredicateStore::new(dir.path()).expect("store init failed");

    std::fs::write(dir.path().join("central.json"), b"{not json").expect("write failed");

    let loaded = store.get(&id("central")).await.expect("get failed");
    assert_eq!(loaded.status(), PredicateStatus::Unknown);
}

#[tokio::test]
async fn put_replaces_atomically() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let store = FilePredicateStore::new(dir.path()).expect("store init failed");

    store
        .put(&id("central"), &available(&["/org/old"]))
        .await
        .expect("put failed");
    let replacement = PathPredicate::unavailable();
    store.put(&id("central"), &replacement).await.expect("put failed");

    let loaded = store.get(&id("central")).await.expect("get failed");
    assert_eq!(loaded, replacement);

    // No leftover temp file from the write-then-rename.
    let names: Vec<_> = std::fs::read_dir(dir.path())
        .expect("read_dir failed")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["central.json"]);
}

#[tokio::test]
async fn remove_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let store = FilePredicateStore::new(dir.path()).expect("store init failed");

    store
        .put(&id("central"), &available(&["/org/example"]))
        .await
        .expect("put failed");

    store.remove(&id("central")).await.expect("remove failed");
    store.remove(&id("central")).await.expect("second remove failed");

    let loaded = store.get(&id("central")).await.expect("get failed");
    assert_eq!(loaded.status(), PredicateStatus::Unknown);
}

#[tokio::test]
async fn list_returns_all_records() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let store = FilePredicateStore::new(dir.path()).expect("store init failed");

    store
        .put(&id("central"), &available(&["/org/example"]))
        .await
        .expect("put failed");
    store
        .put(&id("snapshots"), &PathPredicate::unavailable())
        .await
        .expect("put failed");

    let mut entries = store.list().await.expect("list failed");
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, id("central"));
    assert_eq!(entries[1].0, id("snapshots"));
}
