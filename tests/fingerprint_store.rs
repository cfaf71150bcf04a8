use std::collections::BTreeMap;
use std::fs;

use chrono::{TimeZone, Utc};
use context_assembly::fingerprint::{
    FingerprintManifest, FingerprintRecord, FingerprintState, FingerprintStore, LoadOutcome,
    ManifestFormat,
};
use context_assembly::types::{DocumentId, Fingerprint};
use tempfile::tempdir;

fn id(s: &str) -> DocumentId {
    DocumentId::parse(s).unwrap()
}

fn record(path: &str, content: &str) -> FingerprintRecord {
    FingerprintRecord::excluded(
        id(path),
        Fingerprint::from_content(content.as_bytes()),
        content.len(),
        Utc.timestamp_opt(0, 0).unwrap(),
    )
}

fn current(entries: &[(&str, &str)]) -> BTreeMap<DocumentId, Fingerprint> {
    entries
        .iter()
        .map(|(path, content)| (id(path), Fingerprint::from_content(content.as_bytes())))
        .collect()
}

#[test]
fn diff_classifies_every_document() {
    let store = FingerprintStore::in_memory();
    let state: FingerprintState = vec![record("keep.md", "same"), record("edit.md", "old"), record("gone.md", "x")]
        .into_iter()
        .collect();
    store.commit(state).unwrap();

    let diff = store.diff_against(&current(&[
        ("keep.md", "same"),
        ("edit.md", "new"),
        ("new.md", "fresh"),
    ]));

    assert_eq!(diff.added, vec![id("new.md")]);
    assert_eq!(diff.changed, vec![id("edit.md")]);
    assert_eq!(diff.removed, vec![id("gone.md")]);
    assert_eq!(diff.unchanged, vec![id("keep.md")]);
    assert_eq!(diff.dirty().len(), 3);
    assert!(!diff.is_clean());
}

#[test]
fn empty_store_sees_everything_as_added() {
    let store = FingerprintStore::in_memory();
    let diff = store.diff_against(&current(&[("a.md", "a"), ("b.md", "b")]));
    assert_eq!(diff.added.len(), 2);
    assert!(diff.changed.is_empty() && diff.removed.is_empty() && diff.unchanged.is_empty());
}

#[test]
fn diff_is_pure() {
    let store = FingerprintStore::in_memory();
    let corpus = current(&[("a.md", "a")]);
    let first = store.diff_against(&corpus);
    let second = store.diff_against(&corpus);
    assert_eq!(first, second);
    assert!(store.committed().is_empty());
}

#[test]
fn commit_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state/fingerprints.json");

    let store = FingerprintStore::open(&path);
    assert_eq!(store.load_outcome(), &LoadOutcome::Fresh);
    store
        .commit(vec![record("a.md", "a"), record("b.md", "b")].into_iter().collect())
        .unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists(), "temp file must be renamed away");

    let reopened = FingerprintStore::open(&path);
    assert_eq!(reopened.load_outcome(), &LoadOutcome::Restored { documents: 2 });
    assert_eq!(reopened.committed().as_ref(), store.committed().as_ref());

    let diff = reopened.diff_against(&current(&[("a.md", "a"), ("b.md", "b")]));
    assert_eq!(diff.unchanged.len(), 2);
    assert!(diff.is_clean());
}

#[test]
fn garbage_snapshot_is_corrupted_and_starts_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fingerprints.json");
    fs::write(&path, b"{ not json").unwrap();

    let store = FingerprintStore::open(&path);
    assert!(matches!(store.load_outcome(), LoadOutcome::Corrupted { .. }));
    assert!(store.committed().is_empty());

    let diff = store.diff_against(&current(&[("a.md", "a")]));
    assert_eq!(diff.added, vec![id("a.md")]);
}

#[test]
fn tampered_record_fails_state_hash() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fingerprints.json");

    let store = FingerprintStore::open(&path);
    store.commit(vec![record("a.md", "a")].into_iter().collect()).unwrap();

    let mut manifest: FingerprintManifest = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    manifest.documents[0].version = Fingerprint::from_content(b"something else");
    fs::write(&path, serde_json::to_vec_pretty(&manifest).unwrap()).unwrap();

    let reopened = FingerprintStore::open(&path);
    match reopened.load_outcome() {
        LoadOutcome::Corrupted { cause } => assert!(cause.contains("state hash mismatch"), "{cause}"),
        other => panic!("expected corruption, got {other:?}"),
    }
}

#[test]
fn document_count_mismatch_is_corruption() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fingerprints.json");

    let store = FingerprintStore::open(&path);
    store.commit(vec![record("a.md", "a")].into_iter().collect()).unwrap();

    let mut manifest: FingerprintManifest = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    manifest.document_count = 5;
    fs::write(&path, serde_json::to_vec(&manifest).unwrap()).unwrap();

    assert!(matches!(
        FingerprintStore::open(&path).load_outcome(),
        LoadOutcome::Corrupted { .. }
    ));
}

#[test]
fn failed_write_keeps_previous_commit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fingerprints.json");

    let store = FingerprintStore::open(&path);
    store.commit(vec![record("a.md", "a")].into_iter().collect()).unwrap();

    // A directory where the temp file should go makes the write fail.
    fs::create_dir(path.with_extension("tmp")).unwrap();
    let result = store.commit(vec![record("b.md", "b")].into_iter().collect());

    assert!(result.is_err());
    assert!(store.committed().get(&id("a.md")).is_some());
    assert!(store.committed().get(&id("b.md")).is_none());
}

#[test]
fn golden_state_hash_ignores_insertion_order_and_created_at() {
    let forward: FingerprintState = vec![record("a.md", "a"), record("b.md", "b")].into_iter().collect();
    let backward: FingerprintState = vec![record("b.md", "b"), record("a.md", "a")].into_iter().collect();

    let format = ManifestFormat::v0();
    assert_eq!(forward.state_hash(&format).unwrap(), backward.state_hash(&format).unwrap());

    let mut m1 = forward.to_manifest(format.clone()).unwrap();
    let mut m2 = backward.to_manifest(format).unwrap();
    let fixed_time = Utc.timestamp_opt(0, 0).unwrap();
    m1.created_at = fixed_time;
    m2.created_at = fixed_time;
    assert_eq!(
        serde_json::to_string_pretty(&m1).unwrap(),
        serde_json::to_string_pretty(&m2).unwrap()
    );

    let mut other_format = ManifestFormat::v0();
    other_format.version = "2".to_string();
    assert_ne!(
        forward.state_hash(&ManifestFormat::v0()).unwrap(),
        forward.state_hash(&other_format).unwrap()
    );
}
