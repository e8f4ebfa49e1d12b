//! Batch agenda extraction across the roster.
//!
//! One run opens each roster record's deck, finds the current week's
//! slide, and classifies its shapes into the day's agenda cells. Records
//! fail independently: a deck that cannot be read becomes an ERROR row
//! and the batch keeps going.

use chrono::{Datelike, NaiveDate, Weekday};
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::geometry::{BoxRole, BoxTable, DayTargets};
use crate::richtext::cell_text;
use crate::types::{AgendaRow, Deck, SourceRecord};
use crate::week::{find_week_slide, monday_of_week, WeekLabels};

/// Backend that resolves a roster document id to a parsed deck.
pub trait DeckSource {
    fn open(&self, document_id: &str) -> Result<Deck>;
}

/// Runs one extraction pass over the roster.
pub struct AgendaExtractor<'a, S: DeckSource> {
    source: &'a S,
    boxes: &'a BoxTable,
}

impl<'a, S: DeckSource> AgendaExtractor<'a, S> {
    /// Create an extractor over a deck source and a coordinate table.
    pub fn new(source: &'a S, boxes: &'a BoxTable) -> Self {
        Self { source, boxes }
    }

    /// Extract one agenda row per usable roster record.
    ///
    /// `day` overrides the weekday for manual runs; it defaults to
    /// `today`'s weekday. A day with no configured boxes aborts before any
    /// deck is opened. Output order follows roster order; records with an
    /// empty document id produce no row at all.
    pub fn run(
        &self,
        today: NaiveDate,
        day: Option<Weekday>,
        roster: &[SourceRecord],
    ) -> Result<Vec<AgendaRow>> {
        let day = day.unwrap_or_else(|| today.weekday());
        let targets = self
            .boxes
            .for_day(day)
            .ok_or_else(|| Error::UnsupportedDay(day_name(day).to_string()))?;

        let labels = WeekLabels::for_monday(monday_of_week(today));
        debug!(
            "Extracting {} ({} roster records, banner \"{}\")",
            day_name(day),
            roster.len(),
            labels.english
        );

        let mut rows = Vec::new();
        for record in roster {
            if record.document_id.trim().is_empty() {
                debug!(
                    "Skipping {} / {}: no document id",
                    record.teacher_last_name, record.class_name
                );
                continue;
            }

            match self.extract_record(record, &targets, &labels, day) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    warn!(
                        "{} / {}: {}",
                        record.teacher_last_name, record.class_name, e
                    );
                    rows.push(AgendaRow::error(record, day_name(day), e.to_string()));
                }
            }
        }

        Ok(rows)
    }

    fn extract_record(
        &self,
        record: &SourceRecord,
        targets: &DayTargets,
        labels: &WeekLabels,
        day: Weekday,
    ) -> Result<AgendaRow> {
        let deck = self.source.open(&record.document_id)?;
        if deck.slides.is_empty() {
            return Err(Error::DeckAccess {
                document_id: record.document_id.clone(),
                reason: "deck has no slides".to_string(),
            });
        }

        let slide = find_week_slide(&deck, labels)?;
        debug!(
            "{} / {}: week slide is #{} with {} shapes",
            record.teacher_last_name,
            record.class_name,
            slide.number,
            slide.shapes.len()
        );

        let mut row = AgendaRow::empty(record, day_name(day));
        for shape in &slide.shapes {
            if !shape.has_text() {
                continue;
            }

            let cell = cell_text(&shape.runs, &shape.text);
            // Later shapes overwrite earlier ones landing in the same box,
            // matching slide stacking order.
            match targets.classify(&shape.rect) {
                Some(BoxRole::TurnIn) => row.turn_in = cell,
                Some(BoxRole::Activities) => row.activities = cell,
                Some(BoxRole::PracticeWork) => row.practice_work = cell,
                Some(BoxRole::Upcoming) => row.upcoming = cell,
                None => {}
            }
        }

        Ok(row)
    }
}

/// Board-facing weekday name.
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::types::{Shape, Slide, TextRun, EMPTY_CELL, ERROR_CELL};
    use std::collections::HashMap;

    /// In-memory deck source for extractor tests.
    struct FakeDecks {
        decks: HashMap<String, Deck>,
    }

    impl FakeDecks {
        fn new() -> Self {
            Self {
                decks: HashMap::new(),
            }
        }

        fn insert(&mut self, deck: Deck) {
            self.decks.insert(deck.document_id.clone(), deck);
        }
    }

    impl DeckSource for FakeDecks {
        fn open(&self, document_id: &str) -> Result<Deck> {
            self.decks
                .get(document_id)
                .cloned()
                .ok_or_else(|| Error::DeckAccess {
                    document_id: document_id.to_string(),
                    reason: "no such deck".to_string(),
                })
        }
    }

    fn record(id: &str, teacher: &str) -> SourceRecord {
        SourceRecord {
            document_id: id.to_string(),
            teacher_last_name: teacher.to_string(),
            class_name: format!("{teacher} 101"),
            grade_level: "7".to_string(),
        }
    }

    fn shape_at(rect: Rect, text: &str) -> Shape {
        let mut shape = Shape::new(rect);
        shape.text = text.to_string();
        shape.runs = vec![TextRun::new(text)];
        shape
    }

    /// Monday 2025-09-01; banner "WEEK OF 9/1/2025".
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    /// A deck whose week slide fills Monday's turn-in and activities boxes.
    fn good_deck(id: &str) -> Deck {
        let mut slide = Slide::new(1);
        slide.add_shape(shape_at(
            Rect::new(400.0, 20.0, 200.0, 30.0),
            "WEEK OF 9/1/2025",
        ));
        slide.add_shape(shape_at(Rect::new(10.0, 60.0, 135.0, 65.0), "Lab notebook"));
        slide.add_shape(shape_at(
            Rect::new(10.0, 135.0, 135.0, 140.0),
            "Density stations",
        ));

        let mut deck = Deck::new(id);
        deck.add_slide(slide);
        deck
    }

    #[test]
    fn test_run_fills_matched_cells_and_defaults_rest() {
        let mut decks = FakeDecks::new();
        decks.insert(good_deck("d1"));
        let boxes = BoxTable::standard();
        let extractor = AgendaExtractor::new(&decks, &boxes);

        let rows = extractor
            .run(monday(), None, &[record("d1", "Okafor")])
            .unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.day, "Monday");
        assert_eq!(row.turn_in, "Lab notebook");
        assert_eq!(row.activities, "Density stations");
        assert_eq!(row.practice_work, EMPTY_CELL);
        assert_eq!(row.upcoming, EMPTY_CELL);
        assert!(!row.is_error());
    }

    #[test]
    fn test_bad_deck_yields_error_row_and_batch_continues() {
        let mut decks = FakeDecks::new();
        decks.insert(Deck::new("empty")); // zero slides
        decks.insert(good_deck("d2"));
        let boxes = BoxTable::standard();
        let extractor = AgendaExtractor::new(&decks, &boxes);

        let roster = [record("empty", "Adams"), record("d2", "Baker")];
        let rows = extractor.run(monday(), None, &roster).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].turn_in, ERROR_CELL);
        assert_eq!(rows[0].practice_work, ERROR_CELL);
        assert!(rows[0]
            .error_note
            .as_deref()
            .unwrap()
            .contains("no slides"));
        assert_eq!(rows[1].turn_in, "Lab notebook");
        assert!(!rows[1].is_error());
    }

    #[test]
    fn test_missing_week_slide_becomes_error_row() {
        let mut stale = Slide::new(1);
        stale.add_shape(shape_at(
            Rect::new(400.0, 20.0, 200.0, 30.0),
            "WEEK OF 8/25/2025",
        ));
        let mut deck = Deck::new("stale");
        deck.add_slide(stale);

        let mut decks = FakeDecks::new();
        decks.insert(deck);
        let boxes = BoxTable::standard();
        let extractor = AgendaExtractor::new(&decks, &boxes);

        let rows = extractor
            .run(monday(), None, &[record("stale", "Chen")])
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_error());
        assert!(rows[0]
            .error_note
            .as_deref()
            .unwrap()
            .contains("WEEK OF 9/1/2025"));
    }

    #[test]
    fn test_empty_document_id_skipped_entirely() {
        let mut decks = FakeDecks::new();
        decks.insert(good_deck("d1"));
        let boxes = BoxTable::standard();
        let extractor = AgendaExtractor::new(&decks, &boxes);

        let roster = [record("", "NoDeck"), record("d1", "Okafor")];
        let rows = extractor.run(monday(), None, &roster).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].teacher_last_name, "Okafor");
    }

    #[test]
    fn test_weekend_aborts_without_opening_decks() {
        struct PanicSource;
        impl DeckSource for PanicSource {
            fn open(&self, _: &str) -> Result<Deck> {
                panic!("no deck should be opened for an unsupported day");
            }
        }

        let boxes = BoxTable::standard();
        let extractor = AgendaExtractor::new(&PanicSource, &boxes);
        // 2025-09-06 is a Saturday.
        let saturday = NaiveDate::from_ymd_opt(2025, 9, 6).unwrap();

        let err = extractor
            .run(saturday, None, &[record("d1", "Okafor")])
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedDay(_)));
        assert!(err.to_string().contains("Saturday"));
    }

    #[test]
    fn test_day_override_selects_column() {
        let mut slide = Slide::new(1);
        slide.add_shape(shape_at(
            Rect::new(400.0, 20.0, 200.0, 30.0),
            "WEEK OF 9/1/2025",
        ));
        // Tuesday's turn-in column.
        slide.add_shape(shape_at(Rect::new(150.0, 60.0, 135.0, 65.0), "Vocab list"));
        let mut deck = Deck::new("d1");
        deck.add_slide(slide);

        let mut decks = FakeDecks::new();
        decks.insert(deck);
        let boxes = BoxTable::standard();
        let extractor = AgendaExtractor::new(&decks, &boxes);

        // Run on Monday but extract Tuesday's column.
        let rows = extractor
            .run(monday(), Some(Weekday::Tue), &[record("d1", "Diaz")])
            .unwrap();

        assert_eq!(rows[0].day, "Tuesday");
        assert_eq!(rows[0].turn_in, "Vocab list");
    }

    #[test]
    fn test_later_shape_wins_shared_box() {
        let mut slide = Slide::new(1);
        slide.add_shape(shape_at(
            Rect::new(400.0, 20.0, 200.0, 30.0),
            "WEEK OF 9/1/2025",
        ));
        slide.add_shape(shape_at(Rect::new(10.0, 60.0, 135.0, 65.0), "old text"));
        slide.add_shape(shape_at(Rect::new(11.0, 61.0, 135.0, 65.0), "new text"));
        let mut deck = Deck::new("d1");
        deck.add_slide(slide);

        let mut decks = FakeDecks::new();
        decks.insert(deck);
        let boxes = BoxTable::standard();
        let extractor = AgendaExtractor::new(&decks, &boxes);

        let rows = extractor
            .run(monday(), None, &[record("d1", "Ito")])
            .unwrap();
        assert_eq!(rows[0].turn_in, "new text");
    }
}
