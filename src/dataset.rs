//! Session-wide accumulation of labeled images.
//!
//! The [`Dataset`] keeps finished [`ImageRecord`]s in completion order and
//! the set of processed paths backing the resumability index. It only ever
//! grows during a session.

use std::collections::{BTreeSet, HashMap};

use crate::geometry::Polygon;
use crate::label::LabelClass;

/// Pixel dimensions of a decoded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub height: u32,
    pub width: u32,
    pub channels: u8,
}

impl Dimensions {
    /// Creates new dimensions in `(height, width, channels)` order.
    pub fn new(height: u32, width: u32, channels: u8) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }
}

/// A fully labeled image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRecord {
    path: String,
    dimensions: Dimensions,
    polygons: [Vec<Polygon>; 2],
}

impl ImageRecord {
    /// Creates a record from the committed polygons of both classes.
    pub fn new(
        path: impl Into<String>,
        dimensions: Dimensions,
        first: Vec<Polygon>,
        second: Vec<Polygon>,
    ) -> Self {
        Self {
            path: path.into(),
            dimensions,
            polygons: [first, second],
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Returns the committed polygons of a class in commit order.
    pub fn polygons(&self, class: LabelClass) -> &[Polygon] {
        &self.polygons[class.index()]
    }

    /// Returns every polygon with its class: class 1 first, then class 2.
    pub fn annotations(&self) -> impl Iterator<Item = (LabelClass, &Polygon)> {
        LabelClass::ALL
            .into_iter()
            .flat_map(move |class| self.polygons(class).iter().map(move |p| (class, p)))
    }

    /// Returns the number of committed polygons across both classes.
    pub fn annotation_count(&self) -> usize {
        self.polygons.iter().map(Vec::len).sum()
    }
}

/// All images labeled so far, in completion order.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    records: Vec<ImageRecord>,
    positions: HashMap<String, usize>,
    processed: BTreeSet<String>,
}

impl Dataset {
    /// Creates an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a dataset from a persisted index and previously exported
    /// records.
    ///
    /// Every record path is also marked processed, even if the index missed
    /// it.
    pub fn resume(processed: BTreeSet<String>, records: Vec<ImageRecord>) -> Self {
        let mut dataset = Self {
            processed,
            ..Self::default()
        };
        for record in records {
            dataset.record_image(record);
        }
        dataset
    }

    /// Stores a finished image.
    ///
    /// Recording a path again replaces its record in place, keeping its
    /// original position.
    pub fn record_image(&mut self, record: ImageRecord) {
        self.processed.insert(record.path.clone());
        match self.positions.get(&record.path) {
            Some(&idx) => self.records[idx] = record,
            None => {
                self.positions
                    .insert(record.path.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Returns true if the path is in the index or has been recorded.
    pub fn already_processed(&self, path: &str) -> bool {
        self.processed.contains(path)
    }

    /// Returns all records in completion order.
    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    /// Looks up the record for a path.
    pub fn get(&self, path: &str) -> Option<&ImageRecord> {
        self.positions.get(path).map(|&idx| &self.records[idx])
    }

    /// Returns all processed paths in sorted order.
    pub fn processed_paths(&self) -> &BTreeSet<String> {
        &self.processed
    }

    /// Returns the total number of committed polygons.
    pub fn annotation_count(&self) -> usize {
        self.records.iter().map(ImageRecord::annotation_count).sum()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
