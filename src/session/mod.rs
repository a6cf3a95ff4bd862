//! Labeling session driver.
//!
//! The driver walks the image directory, skips paths already in the index,
//! and feeds input events into a fresh [`LabelState`] for each image. When
//! the operator finalizes an image, its record is added to the
//! [`Dataset`](crate::dataset::Dataset)
//! and both artifacts are rewritten, so an interrupted session loses at most
//! the image that was open.
//!
//! The three external services are traits so that a GUI, a terminal, or a
//! test can drive the same loop:
//! - [`ImageSource`] yields dimensions (or fails for unreadable files)
//! - [`InputSource`] yields pointer and key events
//! - [`Surface`] receives rendering commands

pub mod image;
pub mod input;
pub mod surface;

pub use image::{collect_candidates, ImageSource, ImagesizeSource};
pub use input::{Action, Button, InputEvent, InputSource, ScriptedInput};
pub use surface::{redraw, LogSurface, Surface};

use std::path::{Path, PathBuf};

use crate::error::LabelError;
use crate::export::Artifacts;
use crate::label::{LabelState, UndoOutcome};

/// Where a session reads images and writes its artifacts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Directory searched recursively for images.
    pub images: PathBuf,
    pub artifacts: Artifacts,
}

/// Counters for a finished session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Images finalized and saved in this session.
    pub labeled: usize,
    /// Images skipped because they were already indexed.
    pub skipped: usize,
    /// Images skipped because their header could not be read.
    pub unreadable: usize,
    /// Image that was open when input ran out; nothing was saved for it.
    pub abandoned: Option<String>,
}

/// Runs a labeling session until every candidate is handled or input ends.
///
/// # Errors
/// Returns an error if the artifacts cannot be loaded or saved, the image
/// directory cannot be traversed, or the input source fails. Unreadable
/// images are not errors; they are logged and skipped.
pub fn run_session(
    config: &SessionConfig,
    images: &mut impl ImageSource,
    input: &mut impl InputSource,
    surface: &mut impl Surface,
) -> Result<SessionSummary, LabelError> {
    let mut dataset = config.artifacts.load()?;
    let mut summary = SessionSummary::default();

    for path in collect_candidates(&config.images)? {
        let key = path.to_string_lossy().into_owned();
        log::info!("{}", key);

        if dataset.already_processed(&key) {
            log::debug!("{} already indexed, skipping", key);
            summary.skipped += 1;
            continue;
        }

        let dimensions = match images.dimensions(&path) {
            Ok(dimensions) => dimensions,
            Err(err) => {
                log::warn!("Skipping unreadable image: {}", err);
                summary.unreadable += 1;
                continue;
            }
        };

        surface.show_image(&path);
        let Some(state) = label_image(&path, input, surface)? else {
            log::info!("Input closed while labeling {}; nothing saved for it", key);
            summary.abandoned = Some(key);
            break;
        };

        let record = state.finalize(key, dimensions);
        log::info!(
            "Finished {} with {} polygon(s)",
            record.path(),
            record.annotation_count()
        );
        dataset.record_image(record);
        config.artifacts.save(&dataset)?;
        summary.labeled += 1;
    }

    Ok(summary)
}

/// Applies input events to one image until it is finalized.
///
/// Returns `None` if the input source closes first.
pub fn label_image(
    path: &Path,
    input: &mut impl InputSource,
    surface: &mut impl Surface,
) -> Result<Option<LabelState>, LabelError> {
    let mut state = LabelState::new();

    while let Some(event) = input.next_event()? {
        let Some(action) = event.action() else {
            continue;
        };
        match action {
            Action::AddPoint(class, point) => {
                if let Some(previous) = state.add_point(class, point) {
                    surface.draw_line(previous, point, class);
                }
            }
            Action::Commit => {
                if let Some(class) = state.commit() {
                    if let Some(polygon) = state.committed(class).last() {
                        log::info!("saved {} {}", class, polygon);
                    }
                }
            }
            Action::Undo => match state.undo() {
                Some(outcome) => {
                    match outcome {
                        UndoOutcome::Point { class, point } => {
                            log::debug!("undo: removed {} from {}", point, class)
                        }
                        UndoOutcome::Polygon { class, points } => {
                            log::debug!("undo: reopened {}-point polygon of {}", points, class)
                        }
                    }
                    redraw(surface, path, state.snapshot());
                }
                None => log::debug!("undo: nothing to undo"),
            },
            Action::Finalize => return Ok(Some(state)),
        }
    }

    Ok(None)
}
