//! Structural checks over a written COCO manifest.
//!
//! The labeling session never rejects a polygon, so this is where
//! questionable output is surfaced:
//! - Integrity (unique ids, valid references, contiguous annotation ids)
//! - Consistency of `bbox`/`area` with the segmentation ring
//! - Degenerate geometry (short rings, zero-area boxes), reported as warnings

mod report;

pub use report::{CheckIssue, CheckReport, IssueCode, IssueContext, Severity};

use std::collections::{HashMap, HashSet};

use crate::export::CocoManifest;
use crate::geometry::{BBox, Polygon};
use crate::label::LabelClass;

/// Checks a manifest and returns every issue found.
pub fn check_manifest(manifest: &CocoManifest) -> CheckReport {
    let mut report = CheckReport::new();

    let image_ids = check_images(manifest, &mut report);
    check_categories(manifest, &mut report);
    check_annotations(manifest, &image_ids, &mut report);

    report
}

fn check_images(manifest: &CocoManifest, report: &mut CheckReport) -> HashSet<u64> {
    let mut seen_ids = HashSet::new();
    let mut seen_names: HashMap<&str, u64> = HashMap::new();

    for image in &manifest.images {
        let id = image.id;

        if !seen_ids.insert(id) {
            report.add(CheckIssue::error(
                IssueCode::DuplicateImageId,
                format!("Duplicate image ID {}", id),
                IssueContext::Image { id },
            ));
        }

        if image.file_name.is_empty() {
            report.add(CheckIssue::warning(
                IssueCode::EmptyFileName,
                "Empty filename",
                IssueContext::Image { id },
            ));
        } else if let Some(first) = seen_names.insert(image.file_name.as_str(), id) {
            report.add(CheckIssue::error(
                IssueCode::DuplicateFileName,
                format!("'{}' is also image {}", image.file_name, first),
                IssueContext::Image { id },
            ));
        }

        if image.width == 0 || image.height == 0 {
            report.add(CheckIssue::error(
                IssueCode::InvalidImageDimensions,
                format!(
                    "Invalid dimensions {}x{} (must be positive)",
                    image.width, image.height
                ),
                IssueContext::Image { id },
            ));
        }
    }

    seen_ids
}

fn check_categories(manifest: &CocoManifest, report: &mut CheckReport) {
    let mut ids: Vec<u64> = manifest.categories.iter().map(|c| c.id).collect();
    ids.sort_unstable();
    let expected: Vec<u64> = LabelClass::ALL.iter().map(|c| c.category_id()).collect();

    if ids != expected {
        report.add(CheckIssue::error(
            IssueCode::UnexpectedCategories,
            format!("Expected categories {:?}, found {:?}", expected, ids),
            IssueContext::Manifest,
        ));
    }
}

fn check_annotations(manifest: &CocoManifest, image_ids: &HashSet<u64>, report: &mut CheckReport) {
    let mut seen_ids = HashSet::new();

    for ann in &manifest.annotations {
        let id = ann.id;
        let context = || IssueContext::Annotation { id };

        if !seen_ids.insert(id) {
            report.add(CheckIssue::error(
                IssueCode::DuplicateAnnotationId,
                format!("Duplicate annotation ID {}", id),
                context(),
            ));
        }

        if !image_ids.contains(&ann.image_id) {
            report.add(CheckIssue::error(
                IssueCode::MissingImageRef,
                format!("References non-existent image {}", ann.image_id),
                context(),
            ));
        }

        if LabelClass::from_category_id(ann.category_id).is_none() {
            report.add(CheckIssue::error(
                IssueCode::UnknownCategory,
                format!("References unknown category {}", ann.category_id),
                context(),
            ));
        }

        let bbox_area = BBox::from_xywh(ann.bbox).area();
        if ann.area != bbox_area {
            report.add(CheckIssue::error(
                IssueCode::AreaMismatch,
                format!("Area {} differs from bbox area {}", ann.area, bbox_area),
                context(),
            ));
        }
        if bbox_area == 0 {
            report.add(CheckIssue::warning(
                IssueCode::ZeroArea,
                format!("Zero-area bbox {:?}", ann.bbox),
                context(),
            ));
        }

        let ring = match ann.segmentation.as_slice() {
            [ring] => Polygon::from_ring(ring).filter(|p| !p.is_empty()),
            _ => None,
        };
        let Some(ring) = ring else {
            report.add(CheckIssue::error(
                IssueCode::MalformedSegmentation,
                format!(
                    "Expected one ring of x,y pairs, found {} ring(s)",
                    ann.segmentation.len()
                ),
                context(),
            ));
            continue;
        };

        if ring.len() < 3 {
            report.add(CheckIssue::warning(
                IssueCode::DegeneratePolygon,
                format!("Polygon has only {} point(s)", ring.len()),
                context(),
            ));
        }

        if let Some(bbox) = ring.bounding_box() {
            if bbox.to_xywh() != ann.bbox {
                report.add(CheckIssue::error(
                    IssueCode::BBoxMismatch,
                    format!(
                        "bbox {:?} does not bound the ring (expected {:?})",
                        ann.bbox,
                        bbox.to_xywh()
                    ),
                    context(),
                ));
            }
        }
    }

    let mut ids: Vec<u64> = manifest.annotations.iter().map(|a| a.id).collect();
    ids.sort_unstable();
    ids.dedup();
    let contiguous = ids.len() == manifest.annotations.len()
        && ids.iter().zip(0u64..).all(|(id, expected)| *id == expected);
    if !contiguous {
        report.add(CheckIssue::error(
            IssueCode::NonContiguousAnnotationIds,
            format!(
                "Annotation ids are not the range 0..{}",
                manifest.annotations.len()
            ),
            IssueContext::Manifest,
        ));
    }
}
