use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::directive::{segments, Reference, Segment};
use super::error::{ResolutionFailure, ResolveError};
use crate::document::{section_slice, SourceDocument};
use crate::types::identifiers::{DocumentId, Fingerprint};

/// Resolved text plus every document reached while producing it.
#[derive(Debug, PartialEq, Eq)]
struct ResolvedBody {
    text: String,
    dependencies: BTreeSet<DocumentId>,
}

/// A document with every inclusion directive expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDocument {
    pub id: DocumentId,
    pub version: Fingerprint,
    body: Arc<ResolvedBody>,
}

impl ResolvedDocument {
    pub fn text(&self) -> &str {
        &self.body.text
    }

    /// Sorted transitive dependencies.
    pub fn dependencies(&self) -> Vec<DocumentId> {
        self.body.dependencies.iter().cloned().collect()
    }
}

/// One document on the active expansion path.
struct Frame<'c> {
    source: &'c SourceDocument,
    segments: Vec<Segment<'c>>,
    cursor: usize,
    output: String,
    dependencies: BTreeSet<DocumentId>,
}

impl<'c> Frame<'c> {
    fn new(source: &'c SourceDocument) -> Self {
        Self {
            source,
            segments: segments(&source.content),
            cursor: 0,
            output: String::with_capacity(source.content.len()),
            dependencies: BTreeSet::new(),
        }
    }

    fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.output.push_str(text);
        if !text.ends_with('\n') {
            self.output.push('\n');
        }
    }
}

/// Resolution state for a single refresh pass.
///
/// Expansion is depth-first over an explicit stack. A document is unvisited,
/// in progress (on the stack), or done (memoized by content hash), so nesting
/// depth never touches the call stack. Failures are recorded once per root
/// cause; every document that depends on a failed one is excluded with it.
pub struct ResolutionPass<'c> {
    corpus: &'c BTreeMap<DocumentId, SourceDocument>,
    max_depth: usize,
    memo: HashMap<Fingerprint, Arc<ResolvedBody>>,
    in_progress: HashSet<DocumentId>,
    failed: HashMap<DocumentId, usize>,
    failures: Vec<ResolutionFailure>,
}

impl<'c> ResolutionPass<'c> {
    pub fn new(corpus: &'c BTreeMap<DocumentId, SourceDocument>, max_depth: usize) -> Self {
        Self {
            corpus,
            max_depth,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
            failed: HashMap::new(),
            failures: Vec::new(),
        }
    }

    /// Failures recorded so far, one per root cause.
    pub fn failures(&self) -> &[ResolutionFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<ResolutionFailure> {
        self.failures
    }

    pub fn resolve(&mut self, id: &DocumentId) -> Result<ResolvedDocument, ResolveError> {
        let corpus = self.corpus;
        let Some(source) = corpus.get(id) else {
            return Err(ResolveError::MissingReference {
                from_path: id.clone(),
                reference: id.to_string(),
            });
        };
        if let Some(&index) = self.failed.get(id) {
            return Err(self.failures[index].error.clone());
        }
        if let Some(body) = self.memo.get(&source.version) {
            return Ok(resolved(source, Arc::clone(body)));
        }

        let mut stack = vec![Frame::new(source)];
        self.in_progress.insert(id.clone());

        loop {
            let top = stack.len() - 1;
            let frame = &stack[top];

            let Some(segment) = frame.segments.get(frame.cursor).copied() else {
                let finished = stack.remove(top);
                self.in_progress.remove(&finished.source.id);
                let body = Arc::new(ResolvedBody {
                    text: finished.output,
                    dependencies: finished.dependencies,
                });
                self.memo
                    .insert(finished.source.version.clone(), Arc::clone(&body));

                if stack.is_empty() {
                    return Ok(resolved(finished.source, body));
                }
                // The parent re-reads its directive and finds the memo entry.
                continue;
            };

            match segment {
                Segment::Text(text) => {
                    let frame = &mut stack[top];
                    frame.output.push_str(text);
                    frame.cursor += 1;
                }
                Segment::Include(reference) => {
                    let from = &stack[top].source.id;
                    let Some(target) = self.lookup(reference.target) else {
                        let error = ResolveError::MissingReference {
                            from_path: from.clone(),
                            reference: reference.raw.to_string(),
                        };
                        return Err(self.fail(&stack, error));
                    };

                    if self.in_progress.contains(&target.id) {
                        let error = cycle_error(&stack, &target.id);
                        return Err(self.fail(&stack, error));
                    }
                    if let Some(&index) = self.failed.get(&target.id) {
                        return Err(self.fail_with(&stack, index));
                    }

                    if let Some(body) = self.memo.get(&target.version).cloned() {
                        if let Err(error) = absorb(&mut stack[top], target, &body, reference) {
                            return Err(self.fail(&stack, error));
                        }
                        stack[top].cursor += 1;
                        continue;
                    }

                    if stack.len() > self.max_depth {
                        let error = ResolveError::DepthExceeded {
                            path: target.id.clone(),
                            max_depth: self.max_depth,
                        };
                        return Err(self.fail(&stack, error));
                    }

                    self.in_progress.insert(target.id.clone());
                    stack.push(Frame::new(target));
                }
            }
        }
    }

    fn lookup(&self, target: &str) -> Option<&'c SourceDocument> {
        let id = DocumentId::parse(target).ok()?;
        if let Some(source) = self.corpus.get(&id) {
            return Some(source);
        }
        if id.has_extension() {
            return None;
        }
        let with_ext = DocumentId::parse(&format!("{}.md", id.as_str())).ok()?;
        self.corpus.get(&with_ext)
    }

    fn fail(&mut self, stack: &[Frame<'_>], error: ResolveError) -> ResolveError {
        debug!(error = %error, "resolution failed");
        self.failures.push(ResolutionFailure {
            error: error.clone(),
            excluded: BTreeSet::new(),
        });
        let index = self.failures.len() - 1;
        self.fail_with(stack, index);
        error
    }

    /// Attribute every document on the active path to an existing failure.
    fn fail_with(&mut self, stack: &[Frame<'_>], index: usize) -> ResolveError {
        for frame in stack {
            let id = frame.source.id.clone();
            self.in_progress.remove(&id);
            self.failed.insert(id.clone(), index);
            self.failures[index].excluded.insert(id);
        }
        self.failures[index].error.clone()
    }
}

fn resolved(source: &SourceDocument, body: Arc<ResolvedBody>) -> ResolvedDocument {
    ResolvedDocument {
        id: source.id.clone(),
        version: source.version.clone(),
        body,
    }
}

/// Splice a resolved target into the including frame.
fn absorb(
    frame: &mut Frame<'_>,
    target: &SourceDocument,
    body: &ResolvedBody,
    reference: Reference<'_>,
) -> Result<(), ResolveError> {
    let text = match reference.fragment {
        None => body.text.as_str(),
        Some(fragment) => section_slice(&body.text, fragment).ok_or_else(|| {
            ResolveError::MissingReference {
                from_path: frame.source.id.clone(),
                reference: reference.raw.to_string(),
            }
        })?,
    };
    frame.append(text);
    frame.dependencies.insert(target.id.clone());
    frame
        .dependencies
        .extend(body.dependencies.iter().cloned());
    Ok(())
}

fn cycle_error(stack: &[Frame<'_>], repeated: &DocumentId) -> ResolveError {
    let start = stack
        .iter()
        .position(|f| &f.source.id == repeated)
        .unwrap_or(0);
    let mut cycle_path: Vec<DocumentId> = stack[start..]
        .iter()
        .map(|f| f.source.id.clone())
        .collect();
    cycle_path.push(repeated.clone());
    ResolveError::CircularDependency { cycle_path }
}
