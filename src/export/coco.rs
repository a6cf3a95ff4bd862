//! COCO manifest schema and conversion from the accumulated dataset.
//!
//! # Deterministic Output
//!
//! Image ids follow dataset completion order starting at 0. Annotation ids
//! are assigned by walking images in that order and, within each image,
//! class-1 polygons then class-2 polygons in commit order. Keys are sorted at
//! every nesting level when written, so the same dataset always serializes to
//! the same bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Dimensions, ImageRecord};
use crate::error::LabelError;
use crate::geometry::Polygon;
use crate::label::LabelClass;

/// Channel count assumed for images restored from a manifest.
const RESTORED_CHANNELS: u8 = 3;

/// Top-level COCO manifest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CocoManifest {
    pub annotations: Vec<CocoAnnotation>,
    pub categories: Vec<CocoCategory>,
    pub images: Vec<CocoImage>,
    #[serde(default)]
    pub info: CocoInfo,
    #[serde(default)]
    pub licenses: Vec<CocoLicense>,
}

/// COCO annotation entry with an integer bbox and a single-ring
/// segmentation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub area: i64,
    /// `[x, y, width, height]` with `(x, y)` the top-left corner.
    pub bbox: [i64; 4],
    pub category_id: u64,
    pub id: u64,
    pub image_id: u64,
    #[serde(default)]
    pub iscrowd: u8,
    #[serde(default)]
    pub segmentation: Vec<Vec<i32>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocoCategory {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supercategory: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocoImage {
    pub file_name: String,
    pub height: u32,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<u64>,
    pub width: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocoInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocoLicense {
    pub id: u64,
}

/// Builds the full manifest for a dataset.
pub fn build_manifest(dataset: &Dataset) -> CocoManifest {
    let mut images = Vec::with_capacity(dataset.len());
    let mut annotations = Vec::with_capacity(dataset.annotation_count());

    for (image_id, record) in (0u64..).zip(dataset.records()) {
        let dims = record.dimensions();
        images.push(CocoImage {
            file_name: record.path().to_string(),
            height: dims.height,
            id: image_id,
            license: Some(1),
            width: dims.width,
        });

        for (class, polygon) in record.annotations() {
            // Committed polygons always hold at least one point.
            let Some(bbox) = polygon.bounding_box() else {
                continue;
            };
            annotations.push(CocoAnnotation {
                area: bbox.area(),
                bbox: bbox.to_xywh(),
                category_id: class.category_id(),
                id: annotations.len() as u64,
                image_id,
                iscrowd: 0,
                segmentation: vec![polygon.flatten_ring()],
            });
        }
    }

    CocoManifest {
        annotations,
        categories: fixed_categories(),
        images,
        info: CocoInfo {
            version: Some("1".to_string()),
        },
        licenses: vec![CocoLicense { id: 1 }],
    }
}

/// The two fixed categories, ids 1 and 2.
pub fn fixed_categories() -> Vec<CocoCategory> {
    LabelClass::ALL
        .into_iter()
        .map(|class| CocoCategory {
            id: class.category_id(),
            name: class.category_id().to_string(),
            supercategory: Some("0".to_string()),
        })
        .collect()
}

/// Rebuilds image records from a previously written manifest.
///
/// Images keep their manifest order. Within an image, polygons are grouped by
/// category and ordered by annotation id, which restores commit order for
/// manifests this crate wrote.
///
/// # Errors
/// Returns the first annotation that cannot be mapped back onto an image
/// and class.
pub fn records_from_manifest(manifest: &CocoManifest) -> Result<Vec<ImageRecord>, LabelError> {
    let mut by_image: BTreeMap<u64, Vec<&CocoAnnotation>> = BTreeMap::new();
    for ann in &manifest.annotations {
        by_image.entry(ann.image_id).or_default().push(ann);
    }

    let mut records = Vec::with_capacity(manifest.images.len());
    for image in &manifest.images {
        let mut anns = by_image.remove(&image.id).unwrap_or_default();
        anns.sort_by_key(|ann| ann.id);

        let mut polygons: [Vec<Polygon>; 2] = [Vec::new(), Vec::new()];
        for ann in anns {
            let class = LabelClass::from_category_id(ann.category_id).ok_or(
                LabelError::UnknownCategory {
                    annotation_id: ann.id,
                    category_id: ann.category_id,
                },
            )?;
            let polygon = ann
                .segmentation
                .first()
                .and_then(|ring| Polygon::from_ring(ring))
                .filter(|p| !p.is_empty())
                .ok_or(LabelError::MalformedRing {
                    annotation_id: ann.id,
                })?;
            polygons[class.index()].push(polygon);
        }

        let [first, second] = polygons;
        records.push(ImageRecord::new(
            image.file_name.clone(),
            Dimensions::new(image.height, image.width, RESTORED_CHANNELS),
            first,
            second,
        ));
    }

    if let Some((image_id, anns)) = by_image.into_iter().next() {
        return Err(LabelError::OrphanAnnotation {
            annotation_id: anns[0].id,
            image_id,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn poly(points: &[(i32, i32)]) -> Polygon {
        points.iter().copied().map(Point::from).collect()
    }

    fn sample_dataset() -> Dataset {
        let mut dataset = Dataset::new();
        dataset.record_image(ImageRecord::new(
            "b.jpg",
            Dimensions::new(480, 640, 3),
            vec![poly(&[(0, 0), (10, 0), (10, 5), (0, 5)])],
            vec![poly(&[(1, 1), (3, 1), (3, 3)])],
        ));
        dataset.record_image(ImageRecord::new(
            "a.jpg",
            Dimensions::new(100, 200, 3),
            vec![],
            vec![poly(&[(5, 5), (6, 9)]), poly(&[(2, 2)])],
        ));
        dataset
    }

    #[test]
    fn test_images_follow_completion_order() {
        let manifest = build_manifest(&sample_dataset());
        assert_eq!(manifest.images.len(), 2);
        assert_eq!(manifest.images[0].file_name, "b.jpg");
        assert_eq!(manifest.images[0].id, 0);
        assert_eq!(manifest.images[0].height, 480);
        assert_eq!(manifest.images[0].width, 640);
        assert_eq!(manifest.images[1].file_name, "a.jpg");
        assert_eq!(manifest.images[1].id, 1);
    }

    #[test]
    fn test_annotation_ids_and_grouping() {
        let manifest = build_manifest(&sample_dataset());
        let summary: Vec<_> = manifest
            .annotations
            .iter()
            .map(|a| (a.id, a.image_id, a.category_id))
            .collect();
        assert_eq!(
            summary,
            vec![(0, 0, 1), (1, 0, 2), (2, 1, 2), (3, 1, 2)]
        );
    }

    #[test]
    fn test_annotation_geometry() {
        let manifest = build_manifest(&sample_dataset());
        let first = &manifest.annotations[0];
        assert_eq!(first.bbox, [0, 0, 10, 5]);
        assert_eq!(first.area, 50);
        assert_eq!(first.iscrowd, 0);
        assert_eq!(first.segmentation, vec![vec![0, 0, 10, 0, 10, 5, 0, 5]]);

        // A single point commits as a zero-area box.
        let last = &manifest.annotations[3];
        assert_eq!(last.bbox, [2, 2, 0, 0]);
        assert_eq!(last.area, 0);
    }

    #[test]
    fn test_fixed_sections() {
        let manifest = build_manifest(&Dataset::new());
        assert!(manifest.images.is_empty());
        assert!(manifest.annotations.is_empty());
        assert_eq!(manifest.categories.len(), 2);
        assert_eq!(manifest.categories[0].id, 1);
        assert_eq!(manifest.categories[0].name, "1");
        assert_eq!(manifest.categories[1].id, 2);
        assert_eq!(manifest.categories[1].supercategory.as_deref(), Some("0"));
        assert_eq!(manifest.info.version.as_deref(), Some("1"));
        assert_eq!(manifest.licenses, vec![CocoLicense { id: 1 }]);
    }

    #[test]
    fn test_records_roundtrip_through_manifest() {
        let dataset = sample_dataset();
        let records = records_from_manifest(&build_manifest(&dataset)).expect("restore");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path(), "b.jpg");
        assert_eq!(
            records[0].polygons(LabelClass::First),
            dataset.records()[0].polygons(LabelClass::First)
        );
        assert_eq!(
            records[1].polygons(LabelClass::Second),
            dataset.records()[1].polygons(LabelClass::Second)
        );
        assert_eq!(records[1].dimensions(), Dimensions::new(100, 200, 3));
    }

    #[test]
    fn test_records_reject_unknown_category() {
        let mut manifest = build_manifest(&sample_dataset());
        manifest.annotations[0].category_id = 7;
        let err = records_from_manifest(&manifest).unwrap_err();
        assert!(matches!(
            err,
            LabelError::UnknownCategory {
                annotation_id: 0,
                category_id: 7
            }
        ));
    }

    #[test]
    fn test_records_reject_orphan_annotation() {
        let mut manifest = build_manifest(&sample_dataset());
        manifest.annotations[0].image_id = 42;
        let err = records_from_manifest(&manifest).unwrap_err();
        assert!(matches!(
            err,
            LabelError::OrphanAnnotation {
                annotation_id: 0,
                image_id: 42
            }
        ));
    }

    #[test]
    fn test_records_reject_odd_ring() {
        let mut manifest = build_manifest(&sample_dataset());
        manifest.annotations[1].segmentation = vec![vec![1, 2, 3]];
        let err = records_from_manifest(&manifest).unwrap_err();
        assert!(matches!(err, LabelError::MalformedRing { annotation_id: 1 }));
    }
}
