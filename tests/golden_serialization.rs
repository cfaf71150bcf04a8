use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use context_assembly::document::{DocumentId, Fingerprint};
use context_assembly::fingerprint::{FingerprintRecord, FingerprintState, ManifestFormat};
use context_assembly::index::IndexFailure;
use context_assembly::transclusion::ResolveError;
use context_assembly::types::{SelectedSection, SelectionMetadata, SelectionResult};
use serde_json::{json, Value};

fn id(s: &str) -> DocumentId {
    DocumentId::parse(s).unwrap()
}

#[test]
fn golden_selection_result_serialization() {
    let result = SelectionResult {
        items: vec![SelectedSection {
            path: "docs/deployment.md".to_string(),
            section_heading: "Rollout".to_string(),
            section_order: 2,
            version: "sha256:mock".to_string(),
            score: 1.0,
            tokens: 12,
            content: "## Rollout\nShip it.\n".to_string(),
        }],
        total_tokens: 12,
        total_score: 1.0,
        selection: SelectionMetadata {
            query: "rollout".to_string(),
            max_tokens: 100,
            min_score: 0.0,
            snapshot_version: 3,
            sections_considered: 5,
            sections_selected: 1,
            sections_excluded_by_score: 0,
            sections_excluded_by_budget: 4,
        },
    };

    let value: Value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value,
        json!({
            "items": [{
                "path": "docs/deployment.md",
                "section_heading": "Rollout",
                "section_order": 2,
                "version": "sha256:mock",
                "score": 1.0,
                "tokens": 12,
                "content": "## Rollout\nShip it.\n"
            }],
            "total_tokens": 12,
            "total_score": 1.0,
            "selection": {
                "query": "rollout",
                "max_tokens": 100,
                "min_score": 0.0,
                "snapshot_version": 3,
                "sections_considered": 5,
                "sections_selected": 1,
                "sections_excluded_by_score": 0,
                "sections_excluded_by_budget": 4
            }
        })
    );

    // Field order is part of the contract.
    let json_str = serde_json::to_string(&result).unwrap();
    let items_pos = json_str.find("\"items\":").unwrap();
    let total_pos = json_str.find("\"total_tokens\":").unwrap();
    let selection_pos = json_str.find("\"selection\":").unwrap();
    assert!(items_pos < total_pos);
    assert!(total_pos < selection_pos);

    let back: SelectionResult = serde_json::from_str(&json_str).unwrap();
    assert_eq!(back, result);
}

#[test]
fn golden_manifest_serialization() {
    let state: FingerprintState = vec![FingerprintRecord::excluded(
        id("docs/deployment.md"),
        Fingerprint::from_content(b"content"),
        7,
        Utc.timestamp_opt(0, 0).unwrap(),
    )]
    .into_iter()
    .collect();

    let manifest = state.to_manifest(ManifestFormat::v0()).unwrap();
    let json_str = serde_json::to_string(&manifest).unwrap();

    // state_hash, format, created_at, document_count, documents
    let sh_pos = json_str.find("\"state_hash\":").unwrap();
    let f_pos = json_str.find("\"format\":").unwrap();
    let ca_pos = json_str.find("\"created_at\":").unwrap();
    let dc_pos = json_str.find("\"document_count\":").unwrap();
    let d_pos = json_str.find("\"documents\":").unwrap();

    assert!(sh_pos < f_pos);
    assert!(f_pos < ca_pos);
    assert!(ca_pos < dc_pos);
    assert!(dc_pos < d_pos);

    let value: Value = serde_json::from_str(&json_str).unwrap();
    assert_eq!(value["document_count"], json!(1));
    assert_eq!(value["format"], json!({ "version": "1", "hash_algorithm": "sha256" }));
    assert_eq!(
        value["documents"][0],
        json!({
            "id": "docs/deployment.md",
            "version": "sha256:ed7002b439e9ac845f22357d822bac1444730fbdb6016d3ec9432297b9ec9f73",
            "byte_len": 7,
            "tokens": 0,
            "scanned_at": "1970-01-01T00:00:00Z",
            "indexed": false,
            "sections": []
        })
    );
    assert!(value["state_hash"].as_str().unwrap().starts_with("sha256:"));
}

#[test]
fn golden_failure_serialization() {
    let failure = IndexFailure::Resolution {
        error: ResolveError::CircularDependency {
            cycle_path: vec![id("a.md"), id("b.md"), id("a.md")],
        },
        excluded: BTreeSet::from([id("a.md"), id("b.md")]),
    };

    assert_eq!(
        serde_json::to_value(&failure).unwrap(),
        json!({
            "kind": "resolution",
            "error": {
                "kind": "circular_dependency",
                "cycle_path": ["a.md", "b.md", "a.md"]
            },
            "excluded": ["a.md", "b.md"]
        })
    );

    let missing = ResolveError::MissingReference {
        from_path: id("guide.md"),
        reference: "ghost.md".to_string(),
    };
    assert_eq!(missing.to_string(), "Missing reference 'ghost.md' in guide.md");
    assert_eq!(
        serde_json::to_value(&missing).unwrap(),
        json!({ "kind": "missing_reference", "from_path": "guide.md", "reference": "ghost.md" })
    );
}
