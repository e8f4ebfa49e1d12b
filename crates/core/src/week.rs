//! Week banners and week-slide location.
//!
//! Every deck carries one slide per week, tagged by a banner shape reading
//! "WEEK OF M/D/YYYY" (or "SEMANA DE M/D/YYYY" in Spanish-language
//! classrooms). Extraction finds the current week's slide by that banner.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{Error, Result};
use crate::types::{Deck, Slide};

/// The Monday on or before `today`.
///
/// Sundays belong to the week that started six days earlier, so a Sunday
/// run still lands on the previous Monday.
pub fn monday_of_week(today: NaiveDate) -> NaiveDate {
    let days_back = today.weekday().num_days_from_monday() as i64;
    today - Duration::days(days_back)
}

/// The two banner strings announcing a given week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekLabels {
    pub english: String,
    pub spanish: String,
}

impl WeekLabels {
    /// Labels for the week starting at `monday`, dated `M/D/YYYY` with no
    /// leading zeros.
    pub fn for_monday(monday: NaiveDate) -> Self {
        let date = format!("{}/{}/{}", monday.month(), monday.day(), monday.year());
        Self {
            english: format!("WEEK OF {date}"),
            spanish: format!("SEMANA DE {date}"),
        }
    }

    /// Case-insensitive containment test against a shape's text.
    pub fn matches(&self, text: &str) -> bool {
        let upper = text.to_uppercase();
        upper.contains(&self.english) || upper.contains(&self.spanish)
    }
}

/// Find the first slide whose shapes carry either week banner.
///
/// Slides and shapes are scanned in source order; the first hit wins.
pub fn find_week_slide<'a>(deck: &'a Deck, labels: &WeekLabels) -> Result<&'a Slide> {
    deck.slides
        .iter()
        .find(|slide| slide.shapes.iter().any(|shape| labels.matches(&shape.text)))
        .ok_or_else(|| Error::SlideNotFound {
            english: labels.english.clone(),
            spanish: labels.spanish.clone(),
        })
}
