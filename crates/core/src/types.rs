//! Domain types for decks, shapes, and agenda board rows.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Sentinel cell value for empty or unmatched agenda fields.
pub const EMPTY_CELL: &str = "N/A";

/// Sentinel cell value written into every field of a failed row.
pub const ERROR_CELL: &str = "ERROR";

/// A parsed slide deck, identified by the roster's document id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    /// Document id the deck was opened under.
    pub document_id: String,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Deck {
    /// Create an empty deck for the given document id.
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            slides: Vec::new(),
        }
    }

    /// Add a slide to the deck.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }
}

/// A single slide with its text-bearing shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,

    /// Shapes in source order.
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create a new slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            shapes: Vec::new(),
        }
    }

    /// Add a shape to this slide.
    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }
}

/// A shape observed on a slide: where it sits and what it says.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    /// Observed bounding rectangle, in points.
    pub rect: Rect,

    /// Styled text runs in document order.
    pub runs: Vec<TextRun>,

    /// Paragraph-joined plain text of the whole shape.
    pub text: String,
}

impl Shape {
    /// Create a shape at the given rectangle with no text.
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            runs: Vec::new(),
            text: String::new(),
        }
    }

    /// Whether the shape carries any non-whitespace text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A contiguous styled span of shape text, optionally hyperlinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    /// The run's text content.
    pub text: String,

    /// Hyperlink URL attached to the run, if any.
    pub hyperlink: Option<String>,
}

impl TextRun {
    /// Create a plain text run.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hyperlink: None,
        }
    }

    /// Create a run carrying a hyperlink.
    pub fn linked(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hyperlink: Some(url.into()),
        }
    }
}

/// One roster entry driving one extraction attempt per run.
///
/// The roster file is exported by the deck platform, so field names stay
/// camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    /// Deck document id; empty means the record is skipped.
    #[serde(default)]
    pub document_id: String,

    pub teacher_last_name: String,

    pub class_name: String,

    #[serde(default)]
    pub grade_level: String,
}

/// One row of the current-day agenda board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaRow {
    pub teacher_last_name: String,
    pub class_name: String,

    /// Weekday name the row was extracted for ("Monday".."Friday").
    pub day: String,

    pub turn_in: String,
    pub activities: String,
    pub practice_work: String,
    pub upcoming: String,
    pub grade_level: String,

    /// Failure message, present only on rows whose extraction failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_note: Option<String>,
}

impl AgendaRow {
    /// Row for a successfully opened deck, all cells defaulted to [`EMPTY_CELL`].
    pub fn empty(record: &SourceRecord, day: &str) -> Self {
        Self {
            teacher_last_name: record.teacher_last_name.clone(),
            class_name: record.class_name.clone(),
            day: day.to_string(),
            turn_in: EMPTY_CELL.to_string(),
            activities: EMPTY_CELL.to_string(),
            practice_work: EMPTY_CELL.to_string(),
            upcoming: EMPTY_CELL.to_string(),
            grade_level: record.grade_level.clone(),
            error_note: None,
        }
    }

    /// Row for a failed record: every cell is [`ERROR_CELL`], the note says why.
    pub fn error(record: &SourceRecord, day: &str, note: impl Into<String>) -> Self {
        Self {
            teacher_last_name: record.teacher_last_name.clone(),
            class_name: record.class_name.clone(),
            day: day.to_string(),
            turn_in: ERROR_CELL.to_string(),
            activities: ERROR_CELL.to_string(),
            practice_work: ERROR_CELL.to_string(),
            upcoming: ERROR_CELL.to_string(),
            grade_level: record.grade_level.clone(),
            error_note: Some(note.into()),
        }
    }

    /// Whether this row records a failed extraction.
    pub fn is_error(&self) -> bool {
        self.error_note.is_some()
    }
}
