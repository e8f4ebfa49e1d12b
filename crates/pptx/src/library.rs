//! Filesystem-backed deck library.
//!
//! Resolves a document id to a `.pptx` file under a root directory and
//! opens it through [`DeckParser`].

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use agenda_core::{Deck, DeckSource, Error, Result};

use crate::parser::DeckParser;

/// Deck library rooted at a directory of `.pptx` files.
///
/// Document id `abc123` resolves to `<root>/abc123.pptx`.
pub struct DeckLibrary {
    root: PathBuf,
    parser: DeckParser,
}

impl DeckLibrary {
    /// Create a library rooted at `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            parser: DeckParser::new(),
        }
    }

    /// Path a document id resolves to.
    pub fn deck_path(&self, document_id: &str) -> PathBuf {
        self.root.join(format!("{}.pptx", document_id))
    }
}

impl DeckSource for DeckLibrary {
    fn open(&self, document_id: &str) -> Result<Deck> {
        let id = document_id.trim();
        if id.is_empty() {
            return Err(Error::DeckAccess {
                document_id: document_id.to_string(),
                reason: "empty document id".to_string(),
            });
        }
        // Ids are opaque tokens, not paths.
        if id.contains('/') || id.contains('\\') || id.contains("..") {
            return Err(Error::DeckAccess {
                document_id: id.to_string(),
                reason: "document id must not contain path separators".to_string(),
            });
        }

        let path = self.deck_path(id);
        let file = File::open(&path).map_err(|e| Error::DeckAccess {
            document_id: id.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;

        self.parser.parse(BufReader::new(file), id)
    }
}
