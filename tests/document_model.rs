use chrono::Utc;
use context_assembly::document::{
    ApproxTokenCounter, Document, DocumentError, DocumentId, Fingerprint, SourceDocument,
};
use std::path::Path;

fn make_source(root: &str, source: &str, content: Vec<u8>) -> Result<SourceDocument, DocumentError> {
    let id = DocumentId::from_path(Path::new(root), Path::new(source)).expect("Test path error");
    SourceDocument::ingest(id, content)
}

#[test]
fn invariant_utf8_rejection() {
    // Invalid UTF-8 sequence
    let invalid_bytes = vec![0, 159, 146, 150];
    let result = make_source("/corpus", "/corpus/doc.md", invalid_bytes);
    assert!(matches!(result, Err(DocumentError::InvalidUtf8(_))));
}

#[test]
fn invariant_same_content_same_version() {
    let content = "Hello world".as_bytes().to_vec();

    let doc1 = make_source("/corpus", "/corpus/a.md", content.clone()).unwrap();
    let doc2 = make_source("/corpus", "/corpus/b.md", content).unwrap();

    assert_eq!(doc1.version, doc2.version);
    assert_ne!(doc1.id, doc2.id);
}

#[test]
fn invariant_no_newline_normalization() {
    let unix = make_source("/corpus", "/corpus/doc.md", b"line\n".to_vec()).unwrap();
    let windows = make_source("/corpus", "/corpus/doc.md", b"line\r\n".to_vec()).unwrap();

    assert_ne!(unix.version, windows.version);
}

#[test]
fn fingerprint_format() {
    let version = Fingerprint::from_content(b"");
    assert_eq!(
        version.as_str(),
        "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert!(version.is_well_formed());
}

#[test]
fn id_normalization() {
    let id = DocumentId::from_path(Path::new("/corpus"), Path::new("/corpus/Rules/Style.MD")).unwrap();
    assert_eq!(id.as_str(), "rules/style.md");

    assert_eq!(DocumentId::parse("./rules/style.md").unwrap(), id);
    assert_eq!(DocumentId::parse("/Rules/Style.md").unwrap(), id);
    assert!(DocumentId::parse("  ").is_err());

    assert!(DocumentId::from_path(Path::new("/corpus"), Path::new("/elsewhere/a.md")).is_err());

    #[cfg(windows)]
    {
        let win = DocumentId::from_path(Path::new("docs"), Path::new("docs\\guide.md")).unwrap();
        assert_eq!(win.as_str(), "guide.md");
    }
}

#[test]
fn invariant_section_tokens_sum_to_document_tokens() {
    let content = "Preamble text.\n# Build\nUse cargo.\n## Test\nRun the suite.\n";
    let source = make_source("/corpus", "/corpus/guide.md", content.as_bytes().to_vec()).unwrap();
    let doc = Document::assemble(&source, &source.content, vec![], Utc::now(), &ApproxTokenCounter);

    assert_eq!(doc.sections.len(), 3);
    let sum: usize = doc.sections.iter().map(|s| s.tokens).sum();
    assert_eq!(sum, doc.tokens);
    assert_eq!(doc.byte_len, content.len());
    assert_eq!(doc.version, source.version);

    // Sections tile the text in order.
    let rebuilt: String = doc.sections.iter().map(|s| s.content.as_str()).collect();
    assert_eq!(rebuilt, content);
    for (i, section) in doc.sections.iter().enumerate() {
        assert_eq!(section.order, i);
    }
}

#[test]
fn empty_document_has_no_sections_and_no_tokens() {
    let source = make_source("/corpus", "/corpus/empty.md", Vec::new()).unwrap();
    let doc = Document::assemble(&source, "", vec![], Utc::now(), &ApproxTokenCounter);
    assert!(doc.sections.is_empty());
    assert_eq!(doc.tokens, 0);
}
