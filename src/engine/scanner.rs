//! One-level directory listing: filter by pattern and ledger, return a sorted candidate list.

use log::{debug, warn};
use std::fs;
use std::io;
use walkdir::WalkDir;

use crate::engine::ledger::ProcessedLedger;
use crate::engine::matcher::PathMatcher;
use crate::error::{BridgeError, BridgeResult};

/// List non-directory entries directly under `root` whose bare name matches `matcher` and whose
/// candidate path is not in `exclude`. Result is sorted ascending.
///
/// Only failure to open `root` is an error; an empty result is fine. Entries below the root that
/// cannot be inspected (e.g. a dangling symlink) are logged and skipped.
pub fn scan(
    root: &str,
    matcher: &PathMatcher,
    exclude: &ProcessedLedger,
) -> BridgeResult<Vec<String>> {
    let meta = fs::metadata(root).map_err(|source| scan_error(root, source))?;
    if !meta.is_dir() {
        return Err(scan_error(
            root,
            io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
        ));
    }

    let mut candidates = Vec::new();
    let mut skipped = 0_usize;
    // walkdir never yields `.`/`..`; following links makes a link to a directory look like one.
    for result in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                let msg = err.to_string();
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other(msg));
                return Err(scan_error(root, source));
            }
            Err(err) => {
                warn!("Skipping entry in {}: {}", root, err);
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            warn!("Skipping non UTF-8 file name in {}", root);
            continue;
        };
        if !matcher.matches(name) {
            continue;
        }
        let candidate = candidate_path(root, name);
        if exclude.contains(&candidate) {
            skipped += 1;
            continue;
        }
        candidates.push(candidate);
    }
    candidates.sort();
    debug!(
        "scan {}: {} candidates, {} already processed",
        root,
        candidates.len(),
        skipped
    );
    Ok(candidates)
}

/// `root` and `name` joined by exactly one `/`.
pub fn candidate_path(root: &str, name: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), name)
}

fn scan_error(root: &str, source: io::Error) -> BridgeError {
    BridgeError::Scan {
        path: root.to_string(),
        source,
    }
}
