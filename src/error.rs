use std::path::PathBuf;
use thiserror::Error;

use crate::check::CheckReport;

/// The main error type for seglabel operations.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read path index {path}: {source}")]
    IndexRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse COCO manifest from {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize COCO manifest for {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid COCO manifest {path}: {message}")]
    ManifestInvalid { path: PathBuf, message: String },

    #[error("Annotation {annotation_id} has unknown category {category_id}")]
    UnknownCategory { annotation_id: u64, category_id: u64 },

    #[error("Annotation {annotation_id} has no usable segmentation ring")]
    MalformedRing { annotation_id: u64 },

    #[error("Annotation {annotation_id} references missing image {image_id}")]
    OrphanAnnotation { annotation_id: u64, image_id: u64 },

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Unreadable image {path}: {message}")]
    UnreadableImage { path: PathBuf, message: String },

    #[error("Failed while traversing {path}: {source}")]
    Traverse {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Invalid input event on line {line}: {message}")]
    EventParse { line: usize, message: String },

    #[error("Manifest check failed with {error_count} error(s) and {warning_count} warning(s)")]
    CheckFailed {
        error_count: usize,
        warning_count: usize,
        report: CheckReport,
    },

    #[error("Unsupported output: {0}")]
    UnsupportedOutput(String),
}
