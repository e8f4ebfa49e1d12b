//! Error types for agenda extraction.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting agenda data from decks.
///
/// Deck-scoped variants ([`Error::DeckAccess`], [`Error::SlideNotFound`]
/// and the parse errors underneath them) are contained per roster record
/// and become ERROR rows; the rest abort the run.
#[derive(Error, Debug)]
pub enum Error {
    /// Required configuration (roster, library, coordinate table) is
    /// missing or unreadable. Fatal to the whole run.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No target boxes are configured for the requested day.
    #[error("No agenda boxes configured for {0}")]
    UnsupportedDay(String),

    /// The deck could not be opened, or it has no slides.
    #[error("Cannot read deck '{document_id}': {reason}")]
    DeckAccess { document_id: String, reason: String },

    /// No slide carried the current week's banner.
    #[error("No slide found for \"{english}\" or \"{spanish}\"")]
    SlideNotFound { english: String, spanish: String },

    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error (deck container).
    #[error("ZIP error: {0}")]
    Zip(String),

    /// XML parsing error (slide content).
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// Failed to extract text from a slide.
    #[error("Text extraction error: {0}")]
    Extraction(String),
}
