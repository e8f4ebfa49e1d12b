//! Subcommand implementations for the agenda board CLI.
//!
//! Pipeline commands (`extract`, `archive`) report to stderr/stdout like
//! any build tool and fail with a nonzero exit. Query commands always
//! print a JSON body: the payload on success, an error envelope (or an
//! empty list for `dates`) on failure, so downstream consumers never
//! have to parse anything but JSON.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use agenda_core::dates::{self, DateValue};
use agenda_core::{
    day_name, find_week_slide, monday_of_week, AgendaExtractor, AgendaRow, BoxTable, DeckSource,
    SourceRecord, WeekLabels,
};
use agenda_pptx::DeckLibrary;
use agenda_store::{AgendaStore, ArchiveOutcome};
use anyhow::{Context, Result};
use chrono::{Datelike, Local, Weekday};
use serde::Serialize;

use crate::Cli;

/// Wire shape of a query reply: a payload envelope or an error envelope.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum QueryResponse<T: Serialize> {
    Payload { payload: T },
    Failure { error: String },
}

/// Extract the day's agenda for every roster record and publish it as
/// the current board.
pub fn extract(cli: &Cli, day: Option<&str>) -> Result<()> {
    let today = Local::now().date_naive();
    let weekday = match parse_day(day)? {
        Some(weekday) => weekday,
        None => today.weekday(),
    };

    let roster = load_roster(&cli.roster)?;
    let library = DeckLibrary::new(&cli.library);
    let boxes = BoxTable::standard();
    let extractor = AgendaExtractor::new(&library, &boxes);

    let rows = extractor.run(today, Some(weekday), &roster)?;

    let mut store = AgendaStore::open(&cli.db)?;
    store.replace_current(&rows)?;

    let failed = rows.iter().filter(|row| row.is_error()).count();
    println!(
        "Published {} rows for {} ({} failed)",
        rows.len(),
        day_name(weekday),
        failed
    );
    Ok(())
}

/// Archive the current board into its month partition.
pub fn archive(cli: &Cli, date: Option<&str>) -> Result<()> {
    let date_key = match date {
        Some(text) => parse_date_key(text)?,
        None => dates::format_key(Local::now().date_naive()),
    };

    let mut store = AgendaStore::open(&cli.db)?;
    let rows = store.current_agenda()?;

    match store.archive_rows(&date_key, &rows)? {
        ArchiveOutcome::Archived { rows } => {
            println!("Archived {rows} rows under {date_key}");
        }
        ArchiveOutcome::Skipped => {
            println!("Archive for {date_key} already exists, skipped");
        }
    }
    Ok(())
}

/// Print the current board as JSON.
pub fn current(cli: &Cli) -> Result<()> {
    let response = match read_current(cli) {
        Ok(rows) => QueryResponse::Payload { payload: rows },
        Err(err) => {
            log::error!("Current board query failed: {err:#}");
            QueryResponse::Failure {
                error: format!("{err:#}"),
            }
        }
    };
    print_json(&response)
}

/// Print the archived board for a date as JSON.
pub fn archived(cli: &Cli, date: &str) -> Result<()> {
    let response = match read_archived(cli, date) {
        Ok(rows) => QueryResponse::Payload { payload: rows },
        Err(err) => {
            log::error!("Archive query for '{date}' failed: {err:#}");
            QueryResponse::Failure {
                error: format!("{err:#}"),
            }
        }
    };
    print_json(&response)
}

/// Print every archived date key as a JSON list.
///
/// Date pickers drive themselves off this list, so a storage failure
/// degrades to an empty list rather than an error body.
pub fn dates(cli: &Cli) -> Result<()> {
    let keys = match read_dates(cli) {
        Ok(keys) => keys,
        Err(err) => {
            log::error!("Archived date listing failed: {err:#}");
            Vec::new()
        }
    };
    print_json(&keys)
}

/// Dump one deck's shapes with their geometry and box classification.
pub fn inspect(cli: &Cli, document_id: &str, day: Option<&str>) -> Result<()> {
    let today = Local::now().date_naive();
    let weekday = match parse_day(day)? {
        Some(weekday) => weekday,
        None => today.weekday(),
    };

    let boxes = BoxTable::standard();
    let targets = boxes
        .for_day(weekday)
        .with_context(|| format!("No agenda boxes configured for {}", day_name(weekday)))?;

    let library = DeckLibrary::new(&cli.library);
    let deck = library.open(document_id)?;

    let labels = WeekLabels::for_monday(monday_of_week(today));
    let week_slide = find_week_slide(&deck, &labels).ok().map(|slide| slide.number);

    println!("Deck {} ({} slides)", deck.document_id, deck.slides.len());
    println!("Banners: \"{}\" / \"{}\"", labels.english, labels.spanish);
    println!("Boxes: {} (tolerance {})", day_name(weekday), boxes.tolerance());

    for slide in &deck.slides {
        let marker = if Some(slide.number) == week_slide {
            "  <- week slide"
        } else {
            ""
        };
        println!("\nSlide {}{}", slide.number, marker);

        for shape in &slide.shapes {
            if !shape.has_text() {
                continue;
            }
            let role = targets
                .classify(&shape.rect)
                .map(|role| role.as_str())
                .unwrap_or("-");
            println!(
                "  [{:>13}] x={:>6.1} y={:>6.1} w={:>6.1} h={:>6.1}  {}",
                role,
                shape.rect.x,
                shape.rect.y,
                shape.rect.width,
                shape.rect.height,
                preview(&shape.text)
            );
        }
    }
    Ok(())
}

fn read_current(cli: &Cli) -> Result<Vec<AgendaRow>> {
    let store = AgendaStore::open(&cli.db)?;
    Ok(store.current_agenda()?)
}

fn read_archived(cli: &Cli, date: &str) -> Result<Vec<AgendaRow>> {
    let date_key = parse_date_key(date)?;
    let store = AgendaStore::open(&cli.db)?;
    Ok(store.archived_agenda(&date_key)?)
}

fn read_dates(cli: &Cli) -> Result<Vec<String>> {
    let store = AgendaStore::open(&cli.db)?;
    Ok(store.archived_dates()?)
}

/// Load the roster file exported by the deck platform.
fn load_roster(path: &Path) -> Result<Vec<SourceRecord>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open roster {}", path.display()))?;
    let records: Vec<SourceRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse roster {}", path.display()))?;
    Ok(records)
}

fn parse_day(day: Option<&str>) -> Result<Option<Weekday>> {
    match day {
        Some(text) => Weekday::from_str(text)
            .map(Some)
            .map_err(|_| anyhow::anyhow!("Unrecognized weekday '{}'", text)),
        None => Ok(None),
    }
}

/// Canonicalize a user-supplied date argument into a date key.
fn parse_date_key(text: &str) -> Result<String> {
    dates::normalize(&DateValue::Text(text.to_string()))
        .ok_or_else(|| anyhow::anyhow!("Unrecognized date '{}' (want YYYY-MM-DD)", text))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode response")?;
    println!("{json}");
    Ok(())
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 48;
    let flat = text.replace('\n', " / ");
    if flat.chars().count() <= LIMIT {
        return flat;
    }
    let cut: String = flat.chars().take(LIMIT).collect();
    format!("{cut}...")
}
