//! Per-image labeling state machine.
//!
//! Each image is labeled with two polygon classes. For every class there is
//! an in-progress buffer (the stroke being drawn) and a list of committed
//! polygons. Pointer and key events map onto four transitions:
//!
//! | event         | transition                           |
//! |---------------|--------------------------------------|
//! | left button   | [`LabelState::add_point`] (class 1)  |
//! | right button  | [`LabelState::add_point`] (class 2)  |
//! | `w`           | [`LabelState::commit`]               |
//! | `s`           | [`LabelState::undo`]                 |
//! | `q`           | [`LabelState::finalize`]             |
//!
//! Finalizing consumes the state, so a finished image cannot be edited.
//!
//! # Priority order
//!
//! Commit and undo each pick a single target by a fixed priority:
//!
//! - commit: class-1 buffer, then class-2 buffer.
//! - undo: class-2 buffer, class-1 buffer, class-2 committed list, class-1
//!   committed list.
//!
//! Undoing a committed polygon moves its points back into that class's
//! buffer (both buffers are empty at that point), so the polygon can be
//! continued or trimmed point by point.

use std::fmt;

use crate::dataset::{Dimensions, ImageRecord};
use crate::geometry::{Point, Polygon};

/// One of the two fixed label classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LabelClass {
    /// Drawn with the left button; COCO category 1.
    First,
    /// Drawn with the right button; COCO category 2.
    Second,
}

impl LabelClass {
    /// Both classes in category order.
    pub const ALL: [LabelClass; 2] = [LabelClass::First, LabelClass::Second];

    /// Returns the COCO category id (1 or 2).
    #[inline]
    pub fn category_id(self) -> u64 {
        self.index() as u64 + 1
    }

    /// Returns the class for a COCO category id.
    pub fn from_category_id(id: u64) -> Option<Self> {
        match id {
            1 => Some(LabelClass::First),
            2 => Some(LabelClass::Second),
            _ => None,
        }
    }

    /// Returns the stroke colour as a BGR triple.
    pub fn color(self) -> [u8; 3] {
        match self {
            LabelClass::First => [0, 0, 255],
            LabelClass::Second => [0, 255, 0],
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            LabelClass::First => 0,
            LabelClass::Second => 1,
        }
    }
}

impl fmt::Display for LabelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {}", self.category_id())
    }
}

/// What a successful [`LabelState::undo`] removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The tail point of a class buffer was dropped.
    Point { class: LabelClass, point: Point },
    /// The last committed polygon of a class was reopened into its buffer.
    Polygon { class: LabelClass, points: usize },
}

/// Borrowed view of everything that is drawn on the current image.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    pub committed: [&'a [Polygon]; 2],
    pub buffers: [&'a Polygon; 2],
}

impl<'a> Snapshot<'a> {
    /// Returns every stroke in redraw order: per class, the committed
    /// polygons followed by the live buffer.
    pub fn strokes(self) -> impl Iterator<Item = (LabelClass, &'a Polygon)> + 'a {
        LabelClass::ALL.into_iter().flat_map(move |class| {
            let committed: &'a [Polygon] = self.committed[class.index()];
            let buffer: &'a Polygon = self.buffers[class.index()];
            committed
                .iter()
                .chain(std::iter::once(buffer))
                .map(move |polygon| (class, polygon))
        })
    }
}

/// Labeling state for the image currently on screen.
#[derive(Clone, Debug, Default)]
pub struct LabelState {
    buffers: [Polygon; 2],
    committed: [Vec<Polygon>; 2],
}

impl LabelState {
    /// Creates an idle state with nothing drawn.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a point to the class buffer.
    ///
    /// Returns the previous tail of that buffer, if any, so the caller can
    /// draw the new edge.
    pub fn add_point(&mut self, class: LabelClass, point: Point) -> Option<Point> {
        let buffer = &mut self.buffers[class.index()];
        let previous = buffer.last();
        buffer.push(point);
        previous
    }

    /// Commits the class-1 buffer if it holds points, else the class-2
    /// buffer.
    ///
    /// Returns the committed class, or `None` when both buffers are empty.
    pub fn commit(&mut self) -> Option<LabelClass> {
        let class = LabelClass::ALL
            .into_iter()
            .find(|class| !self.buffers[class.index()].is_empty())?;
        let i = class.index();
        let polygon = self.buffers[i].take();
        self.committed[i].push(polygon);
        Some(class)
    }

    /// Reverts the most recent edit following the undo priority order.
    ///
    /// Returns `None` when there is nothing left to undo.
    pub fn undo(&mut self) -> Option<UndoOutcome> {
        for class in [LabelClass::Second, LabelClass::First] {
            if let Some(point) = self.buffers[class.index()].pop() {
                return Some(UndoOutcome::Point { class, point });
            }
        }
        for class in [LabelClass::Second, LabelClass::First] {
            let i = class.index();
            if let Some(polygon) = self.committed[i].pop() {
                let points = polygon.len();
                self.buffers[i] = polygon;
                return Some(UndoOutcome::Polygon { class, points });
            }
        }
        None
    }

    /// Returns the in-progress polygon for a class.
    pub fn buffer(&self, class: LabelClass) -> &Polygon {
        &self.buffers[class.index()]
    }

    /// Returns the committed polygons for a class in commit order.
    pub fn committed(&self, class: LabelClass) -> &[Polygon] {
        &self.committed[class.index()]
    }

    /// Returns true if neither buffer holds a point.
    pub fn is_idle(&self) -> bool {
        self.buffers.iter().all(Polygon::is_empty)
    }

    /// Returns a view of everything drawn, for a full redraw.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            committed: [&self.committed[0], &self.committed[1]],
            buffers: [&self.buffers[0], &self.buffers[1]],
        }
    }

    /// Finishes the image.
    ///
    /// Points still sitting in either buffer are discarded; only committed
    /// polygons become annotations.
    pub fn finalize(self, path: impl Into<String>, dimensions: Dimensions) -> ImageRecord {
        let [first, second] = self.committed;
        ImageRecord::new(path, dimensions, first, second)
    }
}
