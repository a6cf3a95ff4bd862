//! Display surface seam.

use std::path::Path;

use crate::geometry::Point;
use crate::label::{LabelClass, Snapshot};

/// Receives rendering commands. Nothing is ever read back.
pub trait Surface {
    /// Shows the unannotated image, clearing anything drawn on it.
    fn show_image(&mut self, path: &Path);

    /// Draws one polygon edge in the class colour.
    fn draw_line(&mut self, from: Point, to: Point, class: LabelClass);
}

/// Surface that logs commands instead of rendering them.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSurface;

impl Surface for LogSurface {
    fn show_image(&mut self, path: &Path) {
        log::trace!("show {}", path.display());
    }

    fn draw_line(&mut self, from: Point, to: Point, class: LabelClass) {
        log::trace!("line {} -> {} color {:?}", from, to, class.color());
    }
}

/// Clears the surface and draws every stroke in the snapshot.
pub fn redraw(surface: &mut impl Surface, path: &Path, snapshot: Snapshot<'_>) {
    surface.show_image(path);
    for (class, polygon) in snapshot.strokes() {
        for (from, to) in polygon.edges() {
            surface.draw_line(from, to, class);
        }
    }
}
