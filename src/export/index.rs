//! Plain-text index of processed image paths.
//!
//! One path per line in sorted order, with no trailing newline. The index
//! is what makes a session resumable: any path listed here is skipped.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::write_atomic;
use crate::error::LabelError;

/// Reads the path index.
///
/// A missing file yields an empty index. Lines are trimmed and blank lines
/// are ignored.
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn read_path_index(path: &Path) -> Result<BTreeSet<String>, LabelError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(parse_path_index(&text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeSet::new()),
        Err(source) => Err(LabelError::IndexRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Atomically replaces the path index.
pub fn write_path_index(path: &Path, paths: &BTreeSet<String>) -> Result<(), LabelError> {
    write_atomic(path, to_path_index_string(paths).as_bytes())
}

/// Parses index text into a set of paths.
pub fn parse_path_index(text: &str) -> BTreeSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Renders the index text.
pub fn to_path_index_string(paths: &BTreeSet<String>) -> String {
    paths
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}
