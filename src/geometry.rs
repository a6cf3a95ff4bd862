//! Polygon geometry for COCO export.
//!
//! Points are integer pixel positions as delivered by the pointer. A
//! [`Polygon`] keeps its points in drawing order; that order defines both the
//! segmentation ring and the edges redrawn after an undo.
//!
//! The COCO `area` field is the bounding-box area, not the ring area.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer pixel position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Creates a new point.
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned bounding box in COCO `[x, y, width, height]` layout.
///
/// Fields are `i64` so the extent of any pair of `i32` points fits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl BBox {
    /// Creates a box from COCO `[x, y, width, height]` values.
    pub fn from_xywh([x, y, width, height]: [i64; 4]) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the rectangle area, which is zero for degenerate boxes.
    ///
    /// Saturates at `i64::MAX`.
    #[inline]
    pub fn area(&self) -> i64 {
        self.width.saturating_mul(self.height)
    }

    /// Returns the box as `[x, y, width, height]`.
    #[inline]
    pub fn to_xywh(&self) -> [i64; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Returns the closed rectangle ring, clockwise from the top-left corner.
    ///
    /// Returns `None` if the far corner does not fit in `i64`.
    pub fn to_ring(&self) -> Option<Vec<i64>> {
        let (x0, y0) = (self.x, self.y);
        let x1 = x0.checked_add(self.width)?;
        let y1 = y0.checked_add(self.height)?;
        Some(vec![x0, y0, x1, y0, x1, y1, x0, y1])
    }
}

/// An ordered sequence of points.
///
/// Polygons with fewer than three points are allowed: they exist while a
/// stroke is in progress and may even be committed. Geometry on such a
/// polygon degenerates to a line or a point but is still well-defined.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Creates an empty polygon.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Appends a point to the tail.
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Removes and returns the tail point.
    pub fn pop(&mut self) -> Option<Point> {
        self.points.pop()
    }

    /// Returns the tail point.
    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Returns the points in drawing order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Removes every point, returning them as a new polygon.
    pub fn take(&mut self) -> Polygon {
        Polygon {
            points: std::mem::take(&mut self.points),
        }
    }

    /// Returns consecutive point pairs. The ring is not closed.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Returns the bounding box of all points, or `None` for an empty polygon.
    pub fn bounding_box(&self) -> Option<BBox> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(BBox {
            x: i64::from(min_x),
            y: i64::from(min_y),
            width: i64::from(max_x) - i64::from(min_x),
            height: i64::from(max_y) - i64::from(min_y),
        })
    }

    /// Interleaves the coordinates as `[x0, y0, x1, y1, ...]`.
    pub fn flatten_ring(&self) -> Vec<i32> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }

    /// Rebuilds a polygon from an interleaved ring.
    ///
    /// Returns `None` when the ring has an odd number of values.
    pub fn from_ring(ring: &[i32]) -> Option<Polygon> {
        if ring.len() % 2 != 0 {
            return None;
        }
        Some(
            ring.chunks_exact(2)
                .map(|xy| Point::new(xy[0], xy[1]))
                .collect(),
        )
    }
}

impl FromIterator<Point> for Polygon {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self { points }
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, "]")
    }
}
