//! Index persistence integration tests.

mod common;

use common::node;
use docqa::index::VectorIndex;

#[test]
fn test_save_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();

    let index = VectorIndex::from_nodes(vec![
        node("a", "alpha content", vec![1.0, 0.0, 0.0, 0.1]),
        node("b", "bravo content", vec![0.0, 1.0, 0.0, 0.1]),
    ])
    .unwrap();
    index.save(dir.path()).unwrap();

    let loaded = VectorIndex::load(dir.path()).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.stats().dimensions, 4);
    assert_eq!(loaded.get("a").unwrap().content, "alpha content");

    let results = loaded.search(&[1.0, 0.0, 0.0, 0.1], 1, 0.5);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].node.id, "a");
}

#[test]
fn test_load_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    // Empty directory: both store files missing
    assert!(VectorIndex::load(dir.path()).is_err());
}

#[test]
fn test_load_corrupt_docstore() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("docstore.json"), "not json").unwrap();
    std::fs::write(
        dir.path().join("vectors.json"),
        r#"{"dimensions": 2, "embeddings": {}}"#,
    )
    .unwrap();

    assert!(VectorIndex::load(dir.path()).is_err());
}

#[test]
fn test_load_rejects_dimension_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("docstore.json"), r#"{"nodes": []}"#).unwrap();
    // Store declares 3 dimensions but the embedding has 2
    std::fs::write(
        dir.path().join("vectors.json"),
        r#"{"dimensions": 3, "embeddings": {"a": [1.0, 0.0]}}"#,
    )
    .unwrap();

    assert!(VectorIndex::load(dir.path()).is_err());
}

#[test]
fn test_sibling_links_survive_roundtrip() {
    let dir = tempfile::tempdir().unwrap();

    let mut first = node("a", "alpha", vec![1.0, 0.0, 0.0, 0.1]);
    let mut second = node("b", "bravo", vec![0.0, 1.0, 0.0, 0.1]);
    first.next_id = Some("b".to_string());
    second.prev_id = Some("a".to_string());

    VectorIndex::from_nodes(vec![first, second])
        .unwrap()
        .save(dir.path())
        .unwrap();

    let loaded = VectorIndex::load(dir.path()).unwrap();
    let (prev, next) = loaded.neighbors("b");
    assert_eq!(prev.unwrap().id, "a");
    assert!(next.is_none());
}
