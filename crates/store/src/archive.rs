//! Month-partitioned agenda archive.
//!
//! Every archived day lands in a table named for its month, e.g.
//! `agenda_archive_2025_09`, with an `archived_on` date-key column ahead
//! of the board columns. Partitions written by earlier tools stored that
//! column inconsistently (text keys, locale strings, spreadsheet
//! serials), so every comparison here goes through
//! [`agenda_core::dates::normalize`] instead of raw equality.

use std::collections::BTreeSet;

use agenda_core::dates::{self, DateValue};
use agenda_core::AgendaRow;
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::board::{row_to_agenda, AgendaStore};
use crate::error::{Result, StoreError};

/// Common prefix of all archive partition tables.
pub const PARTITION_PREFIX: &str = "agenda_archive_";

/// What an archive call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Rows were written to the month partition.
    Archived { rows: usize },
    /// The partition already held rows for the date; nothing was written.
    Skipped,
}

impl AgendaStore {
    /// Archive `rows` under `date_key`, one batch per date.
    ///
    /// Creates the month partition if needed. When the partition already
    /// holds rows for the date, returns [`ArchiveOutcome::Skipped`]
    /// without writing, so re-running an archival is safe. The duplicate
    /// check and the append share one write transaction, so overlapping
    /// runs serialize instead of double-appending.
    pub fn archive_rows(&mut self, date_key: &str, rows: &[AgendaRow]) -> Result<ArchiveOutcome> {
        let table = partition_for_key(date_key)?;
        self.ensure_partition(&table)?;

        // Take the write lock before the guard: a run that loses the race
        // must see the winner's committed batch, not a pre-insert view.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if partition_has_date(&tx, &table, date_key)? {
            info!("Archive for {date_key} already present in {table}, skipping");
            return Ok(ArchiveOutcome::Skipped);
        }

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table}
                 (archived_on, teacher_last_name, class_name, day, turn_in,
                  activities, practice_work, upcoming, grade_level, error_note)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    date_key,
                    row.teacher_last_name,
                    row.class_name,
                    row.day,
                    row.turn_in,
                    row.activities,
                    row.practice_work,
                    row.upcoming,
                    row.grade_level,
                    row.error_note,
                ])?;
            }
        }
        tx.commit()?;

        Ok(ArchiveOutcome::Archived { rows: rows.len() })
    }

    /// Read the archived board for `date_key`, in stored order.
    ///
    /// A month partition that does not exist yields an empty board, not
    /// an error; only a malformed key is rejected.
    pub fn archived_agenda(&self, date_key: &str) -> Result<Vec<AgendaRow>> {
        let table = partition_for_key(date_key)?;
        if !self.table_exists(&table)? {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT archived_on, teacher_last_name, class_name, day, turn_in,
                    activities, practice_work, upcoming, grade_level, error_note
             FROM {table}
             ORDER BY id"
        ))?;

        let mut rows = stmt.query([])?;
        let mut agenda = Vec::new();
        while let Some(row) = rows.next()? {
            let stored: Value = row.get("archived_on")?;
            if normalized_key(&stored).as_deref() == Some(date_key) {
                agenda.push(row_to_agenda(row)?);
            }
        }
        Ok(agenda)
    }

    /// Every date key present in the archive, canonical and ascending.
    pub fn archived_dates(&self) -> Result<Vec<String>> {
        let mut keys = BTreeSet::new();
        for table in self.partitions()? {
            let mut stmt = self
                .conn
                .prepare(&format!("SELECT DISTINCT archived_on FROM {table}"))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let stored: Value = row.get(0)?;
                if let Some(key) = normalized_key(&stored) {
                    keys.insert(key);
                }
            }
        }
        Ok(keys.into_iter().collect())
    }

    fn ensure_partition(&self, table: &str) -> Result<()> {
        // Table names cannot be bound; `table` only ever comes from
        // partition_for_key, which has validated the key shape.
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                archived_on TEXT NOT NULL,
                teacher_last_name TEXT NOT NULL,
                class_name TEXT NOT NULL,
                day TEXT NOT NULL,
                turn_in TEXT NOT NULL,
                activities TEXT NOT NULL,
                practice_work TEXT NOT NULL,
                upcoming TEXT NOT NULL,
                grade_level TEXT NOT NULL,
                error_note TEXT
            );"
        ))?;
        Ok(())
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Archive partition tables present in the database.
    fn partitions(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name LIKE ?1
             ORDER BY name",
        )?;

        let pattern = format!("{PARTITION_PREFIX}%");
        let mut rows = stmt.query(params![pattern])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            if is_partition_name(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

/// Whether `table` already holds rows archived under `date_key`.
///
/// Takes the connection as a parameter so the archival path can run it
/// through its own transaction.
fn partition_has_date(conn: &Connection, table: &str, date_key: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("SELECT DISTINCT archived_on FROM {table}"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let stored: Value = row.get(0)?;
        if normalized_key(&stored).as_deref() == Some(date_key) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Partition table name for a canonical date key.
fn partition_for_key(date_key: &str) -> Result<String> {
    if !dates::is_date_key(date_key) {
        return Err(StoreError::BadDateKey(date_key.to_string()));
    }
    Ok(format!(
        "{}{}_{}",
        PARTITION_PREFIX,
        &date_key[..4],
        &date_key[5..7]
    ))
}

/// Whether a table name has the exact `agenda_archive_YYYY_MM` shape.
fn is_partition_name(name: &str) -> bool {
    let Some(suffix) = name.strip_prefix(PARTITION_PREFIX) else {
        return false;
    };
    let bytes = suffix.as_bytes();
    bytes.len() == 7
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'_'
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

/// Canonical date key for a stored `archived_on` value, if it reads as a
/// date at all.
fn normalized_key(value: &Value) -> Option<String> {
    let date_value = match value {
        Value::Integer(serial) => DateValue::Serial(*serial as f64),
        Value::Real(serial) => DateValue::Serial(*serial),
        Value::Text(text) => DateValue::Text(text.clone()),
        Value::Null | Value::Blob(_) => return None,
    };
    dates::normalize(&date_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenda_core::SourceRecord;
    use tempfile::tempdir;

    fn sample_row(teacher: &str, day: &str) -> AgendaRow {
        let record = SourceRecord {
            document_id: "deck-1".to_string(),
            teacher_last_name: teacher.to_string(),
            class_name: "Algebra I".to_string(),
            grade_level: "8".to_string(),
        };
        AgendaRow::empty(&record, day)
    }

    #[test]
    fn test_archive_writes_then_skips_same_date() {
        let mut store = AgendaStore::open_in_memory().unwrap();
        let rows = vec![sample_row("Rivera", "Friday"), sample_row("Cole", "Friday")];

        let first = store.archive_rows("2025-09-05", &rows).unwrap();
        assert_eq!(first, ArchiveOutcome::Archived { rows: 2 });

        let second = store.archive_rows("2025-09-05", &rows).unwrap();
        assert_eq!(second, ArchiveOutcome::Skipped);

        assert_eq!(store.archived_agenda("2025-09-05").unwrap().len(), 2);

        // Two rows share the date; the listing carries it once.
        assert_eq!(store.archived_dates().unwrap(), vec!["2025-09-05"]);
    }

    #[test]
    fn test_overlapping_archive_writes_exactly_one_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("board.db");
        let mut winner = AgendaStore::open(&path).unwrap();
        let mut racer = AgendaStore::open(&path).unwrap();

        // The month partition exists before the contended date shows up.
        winner
            .archive_rows("2025-09-04", &[sample_row("Seed", "Thursday")])
            .unwrap();

        // One run is mid-archive: write lock held, batch not yet committed.
        let tx = winner
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();
        tx.execute(
            "INSERT INTO agenda_archive_2025_09
             (archived_on, teacher_last_name, class_name, day, turn_in,
              activities, practice_work, upcoming, grade_level, error_note)
             VALUES ('2025-09-05', 'Rivera', 'Algebra I', 'Friday', 'N/A', 'N/A', 'N/A', 'N/A', '8', NULL)",
            [],
        )
        .unwrap();

        // An overlapping run cannot even reach the duplicate check while
        // the lock is held, much less append a second batch.
        let err = racer
            .archive_rows("2025-09-05", &[sample_row("Cole", "Friday")])
            .unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));

        tx.commit().unwrap();

        // Its retry sees the committed batch and skips.
        assert_eq!(
            racer
                .archive_rows("2025-09-05", &[sample_row("Cole", "Friday")])
                .unwrap(),
            ArchiveOutcome::Skipped
        );
        assert_eq!(racer.archived_agenda("2025-09-05").unwrap().len(), 1);
    }

    #[test]
    fn test_same_month_different_dates_share_partition() {
        let mut store = AgendaStore::open_in_memory().unwrap();
        store
            .archive_rows("2025-09-05", &[sample_row("Rivera", "Friday")])
            .unwrap();
        store
            .archive_rows("2025-09-08", &[sample_row("Rivera", "Monday")])
            .unwrap();

        assert_eq!(store.archived_agenda("2025-09-05").unwrap().len(), 1);
        assert_eq!(store.archived_agenda("2025-09-08").unwrap().len(), 1);
        assert_eq!(store.archived_agenda("2025-09-08").unwrap()[0].day, "Monday");
    }

    #[test]
    fn test_bad_date_key_rejected() {
        let mut store = AgendaStore::open_in_memory().unwrap();
        let err = store
            .archive_rows("9/5/2025", &[sample_row("Rivera", "Friday")])
            .unwrap_err();
        assert!(matches!(err, StoreError::BadDateKey(_)));

        let err = store.archived_agenda("not-a-date").unwrap_err();
        assert!(matches!(err, StoreError::BadDateKey(_)));
    }

    #[test]
    fn test_missing_partition_reads_empty() {
        let store = AgendaStore::open_in_memory().unwrap();
        assert!(store.archived_agenda("2031-01-15").unwrap().is_empty());
    }

    #[test]
    fn test_archived_dates_sorted_across_partitions() {
        let mut store = AgendaStore::open_in_memory().unwrap();
        store
            .archive_rows("2025-10-01", &[sample_row("Rivera", "Wednesday")])
            .unwrap();
        store
            .archive_rows("2025-09-05", &[sample_row("Rivera", "Friday")])
            .unwrap();
        store
            .archive_rows("2025-09-08", &[sample_row("Rivera", "Monday")])
            .unwrap();

        assert_eq!(
            store.archived_dates().unwrap(),
            vec!["2025-09-05", "2025-09-08", "2025-10-01"]
        );
    }

    #[test]
    fn test_legacy_date_values_normalize_for_guard_and_listing() {
        let mut store = AgendaStore::open_in_memory().unwrap();
        store
            .archive_rows("2025-09-05", &[sample_row("Rivera", "Friday")])
            .unwrap();

        // Rows written by older tools: a spreadsheet serial and a locale
        // string (2025-09-01 / 2025-09-02), plus a serial duplicating the
        // already-archived 2025-09-05.
        store
            .conn
            .execute(
                "INSERT INTO agenda_archive_2025_09
                 (archived_on, teacher_last_name, class_name, day, turn_in,
                  activities, practice_work, upcoming, grade_level, error_note)
                 VALUES (?1, 'Old', 'Olden Class', 'Monday', 'N/A', 'N/A', 'N/A', 'N/A', '6', NULL)",
                params![45_901_i64],
            )
            .unwrap();
        store
            .conn
            .execute(
                "INSERT INTO agenda_archive_2025_09
                 (archived_on, teacher_last_name, class_name, day, turn_in,
                  activities, practice_work, upcoming, grade_level, error_note)
                 VALUES ('9/2/2025', 'Old', 'Olden Class', 'Tuesday', 'N/A', 'N/A', 'N/A', 'N/A', '6', NULL)",
                [],
            )
            .unwrap();
        store
            .conn
            .execute(
                "INSERT INTO agenda_archive_2025_09
                 (archived_on, teacher_last_name, class_name, day, turn_in,
                  activities, practice_work, upcoming, grade_level, error_note)
                 VALUES (?1, 'Old', 'Olden Class', 'Friday', 'N/A', 'N/A', 'N/A', 'N/A', '6', NULL)",
                params![45_905_i64],
            )
            .unwrap();

        // 2025-09-05 is stored both as text and as a serial; the listing
        // still carries it once.
        assert_eq!(
            store.archived_dates().unwrap(),
            vec!["2025-09-01", "2025-09-02", "2025-09-05"]
        );

        // The guard sees the legacy rows through normalization.
        assert_eq!(
            store
                .archive_rows("2025-09-01", &[sample_row("Rivera", "Monday")])
                .unwrap(),
            ArchiveOutcome::Skipped
        );

        // Reads match on the normalized key, too.
        let monday = store.archived_agenda("2025-09-01").unwrap();
        assert_eq!(monday.len(), 1);
        assert_eq!(monday[0].teacher_last_name, "Old");

        // Both storage formats of 2025-09-05 surface under one key.
        assert_eq!(store.archived_agenda("2025-09-05").unwrap().len(), 2);
    }

    #[test]
    fn test_unreadable_legacy_values_are_skipped() {
        let mut store = AgendaStore::open_in_memory().unwrap();
        store
            .archive_rows("2025-09-05", &[sample_row("Rivera", "Friday")])
            .unwrap();
        store
            .conn
            .execute(
                "INSERT INTO agenda_archive_2025_09
                 (archived_on, teacher_last_name, class_name, day, turn_in,
                  activities, practice_work, upcoming, grade_level, error_note)
                 VALUES ('garbage', 'Old', 'Olden Class', 'Monday', 'N/A', 'N/A', 'N/A', 'N/A', '6', NULL)",
                [],
            )
            .unwrap();

        assert_eq!(store.archived_dates().unwrap(), vec!["2025-09-05"]);
    }

    #[test]
    fn test_is_partition_name() {
        assert!(is_partition_name("agenda_archive_2025_09"));
        assert!(!is_partition_name("agenda_archive_2025_9"));
        assert!(!is_partition_name("agenda_archive_backup"));
        assert!(!is_partition_name("agenda_current"));
        assert!(!is_partition_name("agenda_archive_2025_09_old"));
    }

    #[test]
    fn test_partition_for_key() {
        assert_eq!(
            partition_for_key("2025-09-05").unwrap(),
            "agenda_archive_2025_09"
        );
        assert!(partition_for_key("2025-9-5").is_err());
    }
}
