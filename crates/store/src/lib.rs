//! SQLite-backed storage for the agenda board.
//!
//! One database holds the always-current board (`agenda_current`) and a
//! month-partitioned history (`agenda_archive_YYYY_MM`). Publishing
//! replaces the current board atomically; archival is idempotent per
//! date key.

mod archive;
mod board;
mod error;

pub use archive::{ArchiveOutcome, PARTITION_PREFIX};
pub use board::AgendaStore;
pub use error::{Result, StoreError};
