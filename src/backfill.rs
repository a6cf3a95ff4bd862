//! Rectangle segmentation backfill.
//!
//! Some detection trainers require a segmentation on every annotation. This
//! rewrites each annotation's `segmentation` as the four-corner ring of its
//! `bbox`. The whole document is read, transformed, and written back through
//! the same sorted, atomic writer as the labeling session; fields this crate
//! does not know about are carried through untouched.

use std::fs;
use std::path::Path;

use serde_json::{Number, Value};

use crate::error::LabelError;
use crate::export::{to_sorted_json, write_atomic};
use crate::geometry::BBox;

/// Replaces every annotation segmentation in a manifest file with its bbox
/// rectangle.
///
/// Returns the number of annotations rewritten.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or written, or if an
/// annotation has no usable `bbox`.
pub fn backfill_rect_segmentation(path: &Path) -> Result<usize, LabelError> {
    let text = fs::read_to_string(path)?;
    let mut doc: Value =
        serde_json::from_str(&text).map_err(|source| LabelError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

    let count = backfill_value(&mut doc).map_err(|message| LabelError::ManifestInvalid {
        path: path.to_path_buf(),
        message,
    })?;

    let bytes = to_sorted_json(&doc).map_err(|source| LabelError::ManifestWrite {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, &bytes)?;
    log::info!("Backfilled {} segmentation(s) in {}", count, path.display());
    Ok(count)
}

/// Rewrites segmentations in an already parsed manifest document.
///
/// Integer boxes produce integer rings; any fractional coordinate makes the
/// whole ring floating point.
pub fn backfill_value(doc: &mut Value) -> Result<usize, String> {
    let annotations = doc
        .get_mut("annotations")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| "missing 'annotations' array".to_string())?;

    for (idx, ann) in annotations.iter_mut().enumerate() {
        let ring = rect_ring(ann.get("bbox"))
            .map_err(|reason| format!("annotation at index {} {}", idx, reason))?;
        let obj = ann
            .as_object_mut()
            .ok_or_else(|| format!("annotation at index {} is not an object", idx))?;
        obj.insert("segmentation".to_string(), Value::Array(vec![ring]));
    }

    Ok(annotations.len())
}

fn rect_ring(bbox: Option<&Value>) -> Result<Value, &'static str> {
    let values = bbox.and_then(Value::as_array).ok_or("has no bbox array")?;
    let [x, y, w, h] = values.as_slice() else {
        return Err("has a bbox without four values");
    };

    if let (Some(x), Some(y), Some(w), Some(h)) = (x.as_i64(), y.as_i64(), w.as_i64(), h.as_i64())
    {
        let ring = BBox::from_xywh([x, y, w, h])
            .to_ring()
            .ok_or("has a bbox whose far corner overflows")?;
        return Ok(Value::Array(ring.into_iter().map(Value::from).collect()));
    }

    let (Some(x), Some(y), Some(w), Some(h)) = (x.as_f64(), y.as_f64(), w.as_f64(), h.as_f64())
    else {
        return Err("has no numeric bbox");
    };
    let ring = [x, y, x + w, y, x + w, y + h, x, y + h];
    ring.into_iter()
        .map(|v| Number::from_f64(v).map(Value::Number))
        .collect::<Option<Vec<_>>>()
        .map(Value::Array)
        .ok_or("has a bbox whose far corner is not finite")
}
