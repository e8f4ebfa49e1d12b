//! Current agenda board table.
//!
//! The `agenda_current` table always holds exactly one day's board: a
//! publish replaces its contents wholesale, and reads return rows in the
//! order they were written.

use std::path::Path;

use agenda_core::AgendaRow;
use log::error;
use rusqlite::{params, Connection, Row};

use crate::error::Result;

/// SQLite-backed store for the agenda board.
pub struct AgendaStore {
    pub(crate) conn: Connection,
}

impl AgendaStore {
    /// Open (or create) the store at `path`, creating parent directories
    /// as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        configure(&conn);
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Replace the current board with `rows`, preserving their order.
    ///
    /// Clear and insert run in one transaction, so readers never observe
    /// a half-replaced board. Returns the number of rows written.
    pub fn replace_current(&mut self, rows: &[AgendaRow]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM agenda_current", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO agenda_current
                 (teacher_last_name, class_name, day, turn_in, activities,
                  practice_work, upcoming, grade_level, error_note)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for row in rows {
                stmt.execute(params![
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
        Ok(rows.len())
    }

    /// Read the current board in publish order.
    pub fn current_agenda(&self) -> Result<Vec<AgendaRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT teacher_last_name, class_name, day, turn_in, activities,
                    practice_work, upcoming, grade_level, error_note
             FROM agenda_current
             ORDER BY id",
        )?;

        let mut rows = stmt.query([])?;
        let mut agenda = Vec::new();
        while let Some(row) = rows.next()? {
            agenda.push(row_to_agenda(row)?);
        }
        Ok(agenda)
    }
}

fn configure(conn: &Connection) {
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        error!("Failed to enable WAL mode: {err}");
    }
    if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
        error!("Failed to enable foreign keys: {err}");
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS agenda_current (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            teacher_last_name TEXT NOT NULL,
            class_name TEXT NOT NULL,
            day TEXT NOT NULL,
            turn_in TEXT NOT NULL,
            activities TEXT NOT NULL,
            practice_work TEXT NOT NULL,
            upcoming TEXT NOT NULL,
            grade_level TEXT NOT NULL,
            error_note TEXT
        );",
    )?;
    Ok(())
}

/// Map a result row holding the agenda columns to an [`AgendaRow`].
pub(crate) fn row_to_agenda(row: &Row) -> rusqlite::Result<AgendaRow> {
    Ok(AgendaRow {
        teacher_last_name: row.get("teacher_last_name")?,
        class_name: row.get("class_name")?,
        day: row.get("day")?,
        turn_in: row.get("turn_in")?,
        activities: row.get("activities")?,
        practice_work: row.get("practice_work")?,
        upcoming: row.get("upcoming")?,
        grade_level: row.get("grade_level")?,
        error_note: row.get("error_note")?,
    })
}
