//! Candidate discovery and image header reading.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::dataset::Dimensions;
use crate::error::LabelError;

/// Extensions considered labelable images (case-insensitive).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];

/// Channel count of the colour decode shown to the operator.
pub const COLOR_CHANNELS: u8 = 3;

/// Yields pixel dimensions for an image path.
pub trait ImageSource {
    /// Reads the dimensions; an error marks the image unreadable.
    fn dimensions(&mut self, path: &Path) -> Result<Dimensions, LabelError>;
}

/// Reads dimensions from the file header without decoding pixels.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImagesizeSource;

impl ImageSource for ImagesizeSource {
    fn dimensions(&mut self, path: &Path) -> Result<Dimensions, LabelError> {
        let size = imagesize::size(path).map_err(|source| LabelError::ImageDimensionRead {
            path: path.to_path_buf(),
            source,
        })?;

        let too_large = |what: &str, value: usize| LabelError::UnreadableImage {
            path: path.to_path_buf(),
            message: format!("image {} {} does not fit in u32", what, value),
        };
        let width: u32 = size
            .width
            .try_into()
            .map_err(|_| too_large("width", size.width))?;
        let height: u32 = size
            .height
            .try_into()
            .map_err(|_| too_large("height", size.height))?;

        Ok(Dimensions::new(height, width, COLOR_CHANNELS))
    }
}

/// Lists candidate images under `root` in a stable order.
///
/// Within each directory, files come first in file-name order, then each
/// subdirectory is walked in file-name order.
///
/// # Errors
/// Returns an error if the directory cannot be traversed.
pub fn collect_candidates(root: &Path) -> Result<Vec<PathBuf>, LabelError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(true).sort_by(|a, b| {
        (a.file_type().is_dir(), a.file_name()).cmp(&(b.file_type().is_dir(), b.file_name()))
    });
    for entry in walker {
        let entry = entry.map_err(|source| LabelError::Traverse {
            path: root.to_path_buf(),
            source,
        })?;

        if entry.file_type().is_file() && has_image_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_has_image_extension() {
        assert!(has_image_extension(Path::new("a/b.JPG")));
        assert!(has_image_extension(Path::new("b.png")));
        assert!(!has_image_extension(Path::new("_annotations.coco.json")));
        assert!(!has_image_extension(Path::new("noext")));
    }

    #[test]
    fn test_collect_candidates_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("b.jpg"), b"").unwrap();
        fs::write(dir.path().join("a.png"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.jpeg"), b"").unwrap();

        let found: Vec<_> = collect_candidates(dir.path())
            .expect("collect")
            .into_iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            found,
            vec![
                PathBuf::from("a.png"),
                PathBuf::from("b.jpg"),
                PathBuf::from("sub/c.jpeg"),
            ]
        );
    }

    #[test]
    fn test_collect_candidates_files_before_subdirectories() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("a_sub")).unwrap();
        fs::write(dir.path().join("a_sub/x.jpg"), b"").unwrap();
        fs::create_dir(dir.path().join("a_sub/nested")).unwrap();
        fs::write(dir.path().join("a_sub/nested/y.jpg"), b"").unwrap();
        fs::write(dir.path().join("a_sub/z.jpg"), b"").unwrap();
        fs::write(dir.path().join("b.jpg"), b"").unwrap();

        let found: Vec<_> = collect_candidates(dir.path())
            .expect("collect")
            .into_iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            found,
            vec![
                PathBuf::from("b.jpg"),
                PathBuf::from("a_sub/x.jpg"),
                PathBuf::from("a_sub/z.jpg"),
                PathBuf::from("a_sub/nested/y.jpg"),
            ]
        );
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = collect_candidates(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, LabelError::Traverse { .. }));
    }

    #[test]
    fn test_unreadable_header_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"not an image").unwrap();
        assert!(ImagesizeSource.dimensions(&path).is_err());
    }
}
