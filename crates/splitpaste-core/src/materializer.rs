//! Writes selected segments of a parsed block to disk.

use crate::SessionStore;
use splitpaste_types::{FileFailure, MaterializeResult, ParsedBlock, WriteFailureKind};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Set of filenames chosen for writing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    names: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every filename in `block`.
    pub fn all_of(block: &ParsedBlock) -> Self {
        block.filenames().collect()
    }

    pub fn insert(&mut self, filename: impl Into<String>) -> bool {
        self.names.insert(filename.into())
    }

    pub fn remove(&mut self, filename: &str) -> bool {
        self.names.remove(filename)
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.names.contains(filename)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Writes segment bodies under a destination root and logs them to the store.
pub struct FileMaterializer<'a> {
    store: &'a SessionStore,
}

impl<'a> FileMaterializer<'a> {
    pub fn new(store: &'a SessionStore) -> Self {
        Self { store }
    }

    /// Write every selected, non-blank segment of `block` under `root`.
    ///
    /// Failures are collected per file; one bad name never stops the batch.
    /// Selected names missing from the block, and blank bodies, are skipped.
    pub fn materialize(
        &self,
        block: &ParsedBlock,
        selection: &Selection,
        root: &Path,
    ) -> MaterializeResult {
        let mut result = MaterializeResult::default();

        for segment in block {
            if !selection.contains(&segment.filename) {
                continue;
            }
            if segment.is_blank() {
                debug!(
                    target: "splitpaste::materializer",
                    "Skipping blank segment {}",
                    segment.filename
                );
                result.skipped.push(segment.filename.clone());
                continue;
            }

            let body = segment.body.trim();
            match write_segment(root, &segment.filename, body) {
                Ok(path) => {
                    debug!(target: "splitpaste::materializer", "Wrote {}", path.display());
                    if let Err(e) = self.store.record_parsed_item(&segment.filename, body) {
                        warn!(
                            target: "splitpaste::materializer",
                            "Failed to log {} to history: {}",
                            segment.filename,
                            e
                        );
                    }
                    result.written.push(segment.filename.clone());
                }
                Err(failure) => {
                    warn!(
                        target: "splitpaste::materializer",
                        "Failed to write {}: {}",
                        failure.filename,
                        failure.detail
                    );
                    result.errors.push(failure);
                }
            }
        }

        for name in selection.iter().filter(|name| !block.contains(name)) {
            debug!(
                target: "splitpaste::materializer",
                "Selected file {} is not in the block",
                name
            );
            result.skipped.push(name.to_string());
        }

        if !result.written.is_empty() {
            if let Err(e) = self.store.record_folder(root) {
                warn!(
                    target: "splitpaste::materializer",
                    "Failed to remember folder {}: {}",
                    root.display(),
                    e
                );
            }
        }

        info!(
            target: "splitpaste::materializer",
            "Materialized into {}: {} written, {} skipped, {} failed",
            root.display(),
            result.written.len(),
            result.skipped.len(),
            result.errors.len()
        );
        result
    }
}

/// Resolve `filename` under `root`, refusing names that would escape it.
fn resolve(root: &Path, filename: &str) -> Option<PathBuf> {
    let relative = Path::new(filename);
    let mut has_file_part = false;
    for component in relative.components() {
        match component {
            Component::Normal(_) => has_file_part = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    has_file_part.then(|| root.join(relative))
}

fn write_segment(root: &Path, filename: &str, body: &str) -> Result<PathBuf, FileFailure> {
    let path = resolve(root, filename).ok_or_else(|| FileFailure {
        filename: filename.to_string(),
        kind: WriteFailureKind::InvalidPath,
        detail: "path escapes the destination folder".to_string(),
    })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| FileFailure::from_io(filename, &e))?;
    }
    std::fs::write(&path, body).map_err(|e| FileFailure::from_io(filename, &e))?;
    Ok(path)
}
