//! PPTX (Office Open XML) deck backend for agenda extraction.
//!
//! Parses .pptx files, which are ZIP archives containing XML documents,
//! into decks of positioned shapes with hyperlink-aware text runs.

pub mod library;
pub mod parser;

pub use library::DeckLibrary;
pub use parser::DeckParser;
