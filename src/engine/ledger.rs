//! In-memory record of candidate paths that have already been published.

use std::collections::BTreeSet;

/// Paths emitted so far by one producer. Grows monotonically; never persisted.
///
/// Keys are the exact candidate strings built by the scanner, so a file that is deleted and
/// recreated under the same name is still treated as processed.
#[derive(Clone, Debug, Default)]
pub struct ProcessedLedger {
    paths: BTreeSet<String>,
}

impl ProcessedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` processed. Returns false if it was already present.
    pub fn insert(&mut self, path: &str) -> bool {
        if self.paths.contains(path) {
            return false;
        }
        self.paths.insert(path.to_string())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}
