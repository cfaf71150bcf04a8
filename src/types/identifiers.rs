use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Corpus-relative document identity. Unique per document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

#[derive(Debug, Error)]
pub enum DocumentIdError {
    #[error("Source path is outside the corpus root")]
    OutsideRoot,
    #[error("Path involves invalid UTF-8")]
    InvalidUtf8,
    #[error("Document path is empty")]
    Empty,
}

impl DocumentId {
    /// Create a DocumentId from a source path and the corpus root.
    pub fn from_path(root: &Path, source: &Path) -> Result<Self, DocumentIdError> {
        let rel = source
            .strip_prefix(root)
            .map_err(|_| DocumentIdError::OutsideRoot)?;

        let s = rel.to_str().ok_or(DocumentIdError::InvalidUtf8)?;
        Self::parse(s)
    }

    /// Create a DocumentId from an already corpus-relative string, such as
    /// the target of an inclusion directive.
    pub fn parse(relative: &str) -> Result<Self, DocumentIdError> {
        let normalized = normalize(relative);
        if normalized.is_empty() {
            return Err(DocumentIdError::Empty);
        }
        Ok(DocumentId(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the final path component carries an extension.
    pub fn has_extension(&self) -> bool {
        self.0
            .rsplit('/')
            .next()
            .map(|name| name.contains('.'))
            .unwrap_or(false)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Forward slashes, no leading `./` or `/`, lowercase.
fn normalize(path: &str) -> String {
    let replaced = path.trim().replace('\\', "/");
    let mut s = replaced.as_str();
    loop {
        if let Some(rest) = s.strip_prefix("./") {
            s = rest;
        } else if let Some(rest) = s.strip_prefix('/') {
            s = rest;
        } else {
            break;
        }
    }
    s.to_lowercase()
}

/// Content fingerprint: sha256 over the raw bytes, rendered `sha256:<hex>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);

        let hash = hasher.finalize();
        let hex = hex::encode(hash);

        Fingerprint(format!("sha256:{hex}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the `sha256:` + 64 hex digit form produced by `from_content`.
    pub fn is_well_formed(&self) -> bool {
        self.0
            .strip_prefix("sha256:")
            .map(|h| h.len() == 64 && h.bytes().all(|b| b.is_ascii_hexdigit()))
            .unwrap_or(false)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
