//! Target-box geometry and tolerance matching.
//!
//! Agenda decks place each field in a fixed rectangle on the week slide.
//! A shape belongs to a field when its observed rectangle sits within the
//! match tolerance of the field's configured box on all four measures.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Default match tolerance, in points.
pub const DEFAULT_TOLERANCE: f64 = 5.0;

/// An axis-aligned rectangle in document points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from position and size.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether this rectangle sits within `tolerance` of `target`.
    ///
    /// All four deviations must be strictly below the tolerance; a shape
    /// that is off by exactly the tolerance does not match.
    pub fn matches(&self, target: &Rect, tolerance: f64) -> bool {
        (self.x - target.x).abs() < tolerance
            && (self.y - target.y).abs() < tolerance
            && (self.width - target.width).abs() < tolerance
            && (self.height - target.height).abs() < tolerance
    }
}

/// The agenda field a target box feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxRole {
    /// Top box: what students turn in today.
    TurnIn,
    /// Middle box: today's class activities.
    Activities,
    /// Bottom box: practice work / homework.
    PracticeWork,
    /// Day-independent box: upcoming dates and reminders.
    Upcoming,
}

impl BoxRole {
    /// Column-style name used in logs and inspect output.
    pub fn as_str(&self) -> &'static str {
        match self {
            BoxRole::TurnIn => "turn_in",
            BoxRole::Activities => "activities",
            BoxRole::PracticeWork => "practice_work",
            BoxRole::Upcoming => "upcoming",
        }
    }
}

/// The three day-specific boxes of one weekday column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayBoxes {
    pub turn_in: Rect,
    pub activities: Rect,
    pub practice_work: Rect,
}

/// The full configured coordinate table: five weekday columns plus the
/// shared upcoming box and the match tolerance.
///
/// This is data, not logic: the coordinates mirror the deployed deck
/// template and are carried verbatim, quirks included.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxTable {
    monday: DayBoxes,
    tuesday: DayBoxes,
    wednesday: DayBoxes,
    thursday: DayBoxes,
    friday: DayBoxes,
    upcoming: Rect,
    tolerance: f64,
}

/// Width of every day box in the standard template.
const DAY_BOX_WIDTH: f64 = 135.0;

/// Left edges of the Monday..Friday columns in the standard template.
const COLUMN_X: [f64; 5] = [10.0, 150.0, 290.0, 430.0, 570.0];

const fn day_boxes(x: f64) -> DayBoxes {
    DayBoxes {
        turn_in: Rect::new(x, 60.0, DAY_BOX_WIDTH, 65.0),
        activities: Rect::new(x, 135.0, DAY_BOX_WIDTH, 140.0),
        practice_work: Rect::new(x, 285.0, DAY_BOX_WIDTH, 60.0),
    }
}

impl Default for BoxTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl BoxTable {
    /// The coordinate table of the standard weekly agenda template.
    pub fn standard() -> Self {
        let mut wednesday = day_boxes(COLUMN_X[2]);
        // The deployed template's Wednesday practice-work box sits at
        // Tuesday's x coordinate. This is a known quirk of the template;
        // the value is carried as configured so existing decks keep
        // matching.
        wednesday.practice_work.x = COLUMN_X[1];

        Self {
            monday: day_boxes(COLUMN_X[0]),
            tuesday: day_boxes(COLUMN_X[1]),
            wednesday,
            thursday: day_boxes(COLUMN_X[3]),
            friday: day_boxes(COLUMN_X[4]),
            upcoming: Rect::new(10.0, 355.0, 695.0, 40.0),
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Replace the match tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Build a table from explicit coordinates (tests, alternate templates).
    pub fn custom(
        days: [DayBoxes; 5],
        upcoming: Rect,
        tolerance: f64,
    ) -> Self {
        let [monday, tuesday, wednesday, thursday, friday] = days;
        Self {
            monday,
            tuesday,
            wednesday,
            thursday,
            friday,
            upcoming,
            tolerance,
        }
    }

    /// The configured match tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// The four target boxes consulted for `day`, or `None` when the day
    /// has no agenda column (weekends).
    pub fn for_day(&self, day: Weekday) -> Option<DayTargets> {
        let boxes = match day {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat | Weekday::Sun => return None,
        };

        Some(DayTargets {
            targets: [
                (BoxRole::TurnIn, boxes.turn_in),
                (BoxRole::Activities, boxes.activities),
                (BoxRole::PracticeWork, boxes.practice_work),
                (BoxRole::Upcoming, self.upcoming),
            ],
            tolerance: self.tolerance,
        })
    }
}

/// One day's target boxes in match order.
#[derive(Debug, Clone, Copy)]
pub struct DayTargets {
    targets: [(BoxRole, Rect); 4],
    tolerance: f64,
}

impl DayTargets {
    /// Classify an observed rectangle against the day's boxes.
    ///
    /// Roles are tried in declaration order (turn-in, activities,
    /// practice-work, upcoming) and the first match wins, so a shape never
    /// lands in more than one cell. If two configured boxes overlap within
    /// tolerance the earlier role takes the shape; that ordering is part of
    /// the template contract.
    pub fn classify(&self, observed: &Rect) -> Option<BoxRole> {
        self.targets
            .iter()
            .find(|(_, target)| observed.matches(target, self.tolerance))
            .map(|(role, _)| *role)
    }

    /// The boxes this day consults, in match order.
    pub fn targets(&self) -> &[(BoxRole, Rect); 4] {
        &self.targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_position_matches() {
        let target = Rect::new(100.0, 200.0, 135.0, 65.0);
        assert!(target.matches(&target, DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_within_tolerance_matches() {
        let target = Rect::new(100.0, 200.0, 135.0, 65.0);
        let observed = Rect::new(104.0, 196.5, 133.0, 68.0);
        assert!(observed.matches(&target, 5.0));
    }

    #[test]
    fn test_deviation_equal_to_tolerance_rejected() {
        let target = Rect::new(100.0, 200.0, 135.0, 65.0);
        let observed = Rect::new(105.0, 200.0, 135.0, 65.0);
        assert!(!observed.matches(&target, 5.0));

        let just_inside = Rect::new(104.999, 200.0, 135.0, 65.0);
        assert!(just_inside.matches(&target, 5.0));
    }

    #[test]
    fn test_any_axis_out_of_tolerance_rejects() {
        let target = Rect::new(100.0, 200.0, 135.0, 65.0);
        for observed in [
            Rect::new(106.0, 200.0, 135.0, 65.0),
            Rect::new(100.0, 206.0, 135.0, 65.0),
            Rect::new(100.0, 200.0, 141.0, 65.0),
            Rect::new(100.0, 200.0, 135.0, 59.0),
        ] {
            assert!(!observed.matches(&target, 5.0));
        }
    }

    #[test]
    fn test_classify_first_role_wins() {
        let shared = Rect::new(50.0, 50.0, 100.0, 40.0);
        let days = [DayBoxes {
            turn_in: shared,
            activities: shared,
            practice_work: Rect::new(50.0, 300.0, 100.0, 40.0),
        }; 5];
        let table = BoxTable::custom(days, Rect::new(400.0, 400.0, 100.0, 40.0), 5.0);
        let targets = table.for_day(Weekday::Mon).unwrap();

        // Both turn-in and activities would match; turn-in is declared first.
        assert_eq!(targets.classify(&shared), Some(BoxRole::TurnIn));
    }

    #[test]
    fn test_classify_unmatched_shape_is_none() {
        let table = BoxTable::standard();
        let targets = table.for_day(Weekday::Tue).unwrap();
        let nowhere = Rect::new(900.0, 900.0, 10.0, 10.0);
        assert_eq!(targets.classify(&nowhere), None);
    }

    #[test]
    fn test_standard_table_matches_each_role() {
        let table = BoxTable::standard();
        let targets = table.for_day(Weekday::Mon).unwrap();

        assert_eq!(
            targets.classify(&Rect::new(10.0, 60.0, 135.0, 65.0)),
            Some(BoxRole::TurnIn)
        );
        assert_eq!(
            targets.classify(&Rect::new(11.5, 136.0, 134.0, 138.0)),
            Some(BoxRole::Activities)
        );
        assert_eq!(
            targets.classify(&Rect::new(10.0, 285.0, 135.0, 60.0)),
            Some(BoxRole::PracticeWork)
        );
        assert_eq!(
            targets.classify(&Rect::new(10.0, 355.0, 695.0, 40.0)),
            Some(BoxRole::Upcoming)
        );
    }

    #[test]
    fn test_weekends_have_no_targets() {
        let table = BoxTable::standard();
        assert!(table.for_day(Weekday::Sat).is_none());
        assert!(table.for_day(Weekday::Sun).is_none());
    }

    #[test]
    fn test_wednesday_practice_work_sits_in_tuesday_column() {
        // Known template quirk, carried as configured.
        let table = BoxTable::standard();
        let wednesday = table.for_day(Weekday::Wed).unwrap();
        let tuesday_practice = Rect::new(150.0, 285.0, 135.0, 60.0);
        assert_eq!(
            wednesday.classify(&tuesday_practice),
            Some(BoxRole::PracticeWork)
        );
    }

    #[test]
    fn test_upcoming_box_shared_across_days() {
        let table = BoxTable::standard();
        let upcoming = Rect::new(10.0, 355.0, 695.0, 40.0);
        for day in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ] {
            let targets = table.for_day(day).unwrap();
            assert_eq!(targets.classify(&upcoming), Some(BoxRole::Upcoming));
        }
    }
}
