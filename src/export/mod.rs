//! Durable export of the labeled dataset.
//!
//! Two artifacts are rewritten in full after every finished image:
//!
//! - the path index ([`index`]), a sorted list of processed image paths;
//! - the COCO manifest ([`coco`]), recomputed from the whole dataset.
//!
//! Each write goes to a temporary file in the destination directory and is
//! then renamed over the target, so a crash leaves either the previous or
//! the new version on disk, never a truncated one.

pub mod coco;
pub mod index;

use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

pub use coco::{
    build_manifest, records_from_manifest, CocoAnnotation, CocoCategory, CocoImage, CocoInfo,
    CocoLicense, CocoManifest,
};
pub use index::{read_path_index, write_path_index};

use crate::dataset::Dataset;
use crate::error::LabelError;

/// Locations of the two persisted artifacts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifacts {
    /// Plain-text index of processed paths.
    pub index: PathBuf,
    /// COCO manifest.
    pub manifest: PathBuf,
}

impl Artifacts {
    pub fn new(index: impl Into<PathBuf>, manifest: impl Into<PathBuf>) -> Self {
        Self {
            index: index.into(),
            manifest: manifest.into(),
        }
    }

    /// Restores the dataset from previously written artifacts.
    ///
    /// Missing files are treated as an empty session. Paths listed in the
    /// index but absent from the manifest stay processed without a record.
    ///
    /// # Errors
    /// Returns an error if either file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Dataset, LabelError> {
        let processed = read_path_index(&self.index)?;

        let records = if self.manifest.is_file() {
            let manifest = read_manifest(&self.manifest)?;
            records_from_manifest(&manifest).inspect_err(|err| {
                log::error!("Cannot resume from {}: {}", self.manifest.display(), err)
            })?
        } else {
            Vec::new()
        };

        let dataset = Dataset::resume(processed, records);
        for path in dataset.processed_paths() {
            if dataset.get(path).is_none() {
                log::warn!(
                    "{} is indexed but has no entry in {}; it will not be relabeled",
                    path,
                    self.manifest.display()
                );
            }
        }
        log::info!(
            "Resumed {} image(s) with {} annotation(s), {} path(s) indexed",
            dataset.len(),
            dataset.annotation_count(),
            dataset.processed_paths().len()
        );
        Ok(dataset)
    }

    /// Rewrites both artifacts from the dataset, manifest first.
    ///
    /// A path only enters the index once its record is on disk. If the
    /// manifest write fails the index is not touched; if the index write
    /// fails, [`Artifacts::load`] still treats every manifest image as
    /// processed.
    ///
    /// # Errors
    /// Returns an error if either file cannot be written. The previous
    /// version of a file that failed to write is left intact.
    pub fn save(&self, dataset: &Dataset) -> Result<(), LabelError> {
        write_manifest(&self.manifest, dataset)?;
        write_path_index(&self.index, dataset.processed_paths())?;
        log::info!(
            "Saved {} image(s) and {} annotation(s) to {}",
            dataset.len(),
            dataset.annotation_count(),
            self.manifest.display()
        );
        Ok(())
    }
}

/// Reads a COCO manifest written by this crate.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_manifest(path: &Path) -> Result<CocoManifest, LabelError> {
    let file = File::open(path).map_err(LabelError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| LabelError::ManifestParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the manifest for a dataset, replacing any previous file.
///
/// # Errors
/// Returns an error if the manifest cannot be serialized or written.
pub fn write_manifest(path: &Path, dataset: &Dataset) -> Result<(), LabelError> {
    let bytes =
        to_sorted_json(&build_manifest(dataset)).map_err(|source| LabelError::ManifestWrite {
            path: path.to_path_buf(),
            source,
        })?;
    write_atomic(path, &bytes)
}

/// Renders the manifest for a dataset.
///
/// Useful for testing without file I/O.
pub fn to_manifest_string(dataset: &Dataset) -> Result<String, serde_json::Error> {
    let bytes = to_sorted_json(&build_manifest(dataset))?;
    // serde_json only emits valid UTF-8.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parses a manifest from a string.
///
/// Useful for testing without file I/O.
pub fn from_manifest_str(json: &str) -> Result<CocoManifest, serde_json::Error> {
    serde_json::from_str(json)
}

/// Serializes with keys sorted at every level and four-space indentation.
///
/// Non-ASCII text is written as-is.
pub(crate) fn to_sorted_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    // Going through `Value` sorts object keys regardless of field order.
    let value = serde_json::to_value(value)?;
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(out)
}

/// Replaces `path` with `bytes` via a temporary file in the same directory.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), LabelError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|source| LabelError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
