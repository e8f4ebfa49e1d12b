//! Core domain types, target-box geometry, and extraction logic
//! for the weekly agenda board.

pub mod dates;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod richtext;
pub mod types;
pub mod week;

pub use error::{Error, Result};
pub use extract::{day_name, AgendaExtractor, DeckSource};
pub use geometry::{BoxRole, BoxTable, DayBoxes, Rect, DEFAULT_TOLERANCE};
pub use types::{AgendaRow, Deck, Shape, Slide, SourceRecord, TextRun, EMPTY_CELL, ERROR_CELL};
pub use week::{find_week_slide, monday_of_week, WeekLabels};
