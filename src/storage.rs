//! Storage collaborator: corpus listing and raw byte reads.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::warn;
use walkdir::WalkDir;

/// A file found in the corpus folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusFile {
    pub path: PathBuf,
    pub modified: Option<DateTime<Utc>>,
}

pub trait CorpusStorage: Send + Sync {
    /// Every corpus file under `folder`, sorted by path.
    fn list_corpus_files(&self, folder: &Path) -> io::Result<Vec<CorpusFile>>;

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
}

const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target"];

/// Reads the corpus from the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStorage {
    extensions: Vec<String>,
}

impl FsStorage {
    /// `extensions` are matched case-insensitively, without the dot.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_lowercase();
        self.extensions.iter().any(|e| *e == ext)
    }
}

impl CorpusStorage for FsStorage {
    fn list_corpus_files(&self, folder: &Path) -> io::Result<Vec<CorpusFile>> {
        if !folder.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("corpus folder does not exist: {}", folder.display()),
            ));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(folder).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !SKIPPED_DIRS.iter().any(|d| entry.file_name() == *d)
        });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // One bad subtree does not hide the rest of the corpus.
                    warn!(error = %e, "skipping unreadable corpus entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.accepts(entry.path()) {
                continue;
            }
            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from);
            files.push(CorpusFile {
                path: entry.into_path(),
                modified,
            });
        }

        // Sort for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// In-process corpus, for embedding callers that do not keep files on disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: RwLock<BTreeMap<PathBuf, (Vec<u8>, DateTime<Utc>)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(path.into(), (content.into(), Utc::now()));
    }

    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.remove(path.as_ref()).is_some()
    }
}

impl CorpusStorage for MemoryStorage {
    fn list_corpus_files(&self, folder: &Path) -> io::Result<Vec<CorpusFile>> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        Ok(files
            .iter()
            .filter(|(path, _)| path.starts_with(folder))
            .map(|(path, (_, modified))| CorpusFile {
                path: path.clone(),
                modified: Some(*modified),
            })
            .collect())
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files
            .get(path)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}
