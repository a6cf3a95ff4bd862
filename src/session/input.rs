//! Input events and the line-based event script reader.
//!
//! # Script format
//!
//! One event per line. Blank lines and lines starting with `#` are skipped.
//! Pointer coordinates must lie within [`MAX_COORDINATE`] of the origin.
//!
//! ```text
//! # left button at (10, 20), right button at (5, 7), then commit
//! left 10 20
//! right 5 7
//! key w
//! ```

use std::io::BufRead;

use crate::error::LabelError;
use crate::geometry::Point;
use crate::label::LabelClass;

/// Key that commits the active buffer.
pub const KEY_COMMIT: char = 'w';
/// Key that undoes the last edit.
pub const KEY_UNDO: char = 's';
/// Key that finishes the current image.
pub const KEY_FINALIZE: char = 'q';

/// Largest accepted pointer coordinate magnitude, in pixels.
pub const MAX_COORDINATE: i32 = 1 << 20;

/// A pointer button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
}

impl Button {
    /// Returns the class a button draws.
    pub fn class(self) -> LabelClass {
        match self {
            Button::Left => LabelClass::First,
            Button::Right => LabelClass::Second,
        }
    }
}

/// A discrete event from the input source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// Button pressed at a pixel position.
    Pointer { button: Button, point: Point },
    /// Key pressed.
    Key(char),
}

/// A labeling transition requested by an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    AddPoint(LabelClass, Point),
    Commit,
    Undo,
    Finalize,
}

impl InputEvent {
    /// Maps the event to a transition; unbound keys map to `None`.
    pub fn action(self) -> Option<Action> {
        match self {
            InputEvent::Pointer { button, point } => Some(Action::AddPoint(button.class(), point)),
            InputEvent::Key(KEY_COMMIT) => Some(Action::Commit),
            InputEvent::Key(KEY_UNDO) => Some(Action::Undo),
            InputEvent::Key(KEY_FINALIZE) => Some(Action::Finalize),
            InputEvent::Key(_) => None,
        }
    }
}

/// A blocking source of input events.
pub trait InputSource {
    /// Waits for the next event; `None` means the source is closed.
    fn next_event(&mut self) -> Result<Option<InputEvent>, LabelError>;
}

/// Reads events from a line-based script, such as a file or stdin.
pub struct ScriptedInput<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> ScriptedInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> InputSource for ScriptedInput<R> {
    fn next_event(&mut self) -> Result<Option<InputEvent>, LabelError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if let Some(event) = parse_event_line(&self.buf, self.line_no)? {
                return Ok(Some(event));
            }
        }
    }
}

/// Parses one script line; blank and comment lines yield `None`.
pub fn parse_event_line(line: &str, line_no: usize) -> Result<Option<InputEvent>, LabelError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let err = |message: String| LabelError::EventParse {
        line: line_no,
        message,
    };

    let mut parts = line.split_whitespace();
    let kind = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let event = match kind {
        "left" | "right" => {
            let [x, y] = args.as_slice() else {
                return Err(err(format!("'{}' takes X and Y, got '{}'", kind, line)));
            };
            let parse = |v: &str| -> Result<i32, LabelError> {
                let value = v
                    .parse::<i32>()
                    .map_err(|e| err(format!("invalid coordinate '{}': {}", v, e)))?;
                if value.unsigned_abs() > MAX_COORDINATE.unsigned_abs() {
                    return Err(err(format!(
                        "coordinate {} is outside -{max}..={max}",
                        value,
                        max = MAX_COORDINATE
                    )));
                }
                Ok(value)
            };
            let button = if kind == "left" {
                Button::Left
            } else {
                Button::Right
            };
            InputEvent::Pointer {
                button,
                point: Point::new(parse(*x)?, parse(*y)?),
            }
        }
        "key" => {
            let [key] = args.as_slice() else {
                return Err(err(format!("'key' takes one character, got '{}'", line)));
            };
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => InputEvent::Key(c),
                _ => return Err(err(format!("'{}' is not a single character", key))),
            }
        }
        other => return Err(err(format!("unknown event '{}'", other))),
    };

    Ok(Some(event))
}
