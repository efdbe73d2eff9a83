//! School week model.
//!
//! A week is identified by its Monday. Only Monday through Friday are
//! scheduled.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Number of scheduled days per week (Monday..Friday).
pub const SCHOOL_DAYS_PER_WEEK: u64 = 5;

/// A school week, anchored on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "NaiveDate", into = "NaiveDate")]
pub struct Week {
    start: NaiveDate,
}

impl Week {
    /// Creates a week starting on `start`.
    ///
    /// Returns `None` unless `start` is a Monday and the Friday of the same
    /// week is representable.
    pub fn new(start: NaiveDate) -> Option<Self> {
        if start.weekday() != Weekday::Mon {
            return None;
        }
        start.checked_add_days(Days::new(SCHOOL_DAYS_PER_WEEK - 1))?;
        Some(Self { start })
    }

    /// The week containing `date`.
    pub fn containing(date: NaiveDate) -> Option<Self> {
        let offset = u64::from(date.weekday().num_days_from_monday());
        Self::new(date.checked_sub_days(Days::new(offset))?)
    }

    /// Monday of this week.
    #[inline]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Friday of this week.
    pub fn last_school_day(&self) -> NaiveDate {
        self.start + Days::new(SCHOOL_DAYS_PER_WEEK - 1)
    }

    /// Monday..Friday in calendar order.
    pub fn school_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..SCHOOL_DAYS_PER_WEEK).map(move |offset| self.start + Days::new(offset))
    }

    /// Whether `date` is a school day of this week.
    pub fn contains_school_day(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.last_school_day()
    }

    /// The following week, if representable.
    pub fn next(&self) -> Option<Self> {
        Self::new(self.start.checked_add_days(Days::new(7))?)
    }
}

impl TryFrom<NaiveDate> for Week {
    type Error = String;

    fn try_from(start: NaiveDate) -> Result<Self, Self::Error> {
        Week::new(start).ok_or_else(|| format!("week must start on a Monday, got {start}"))
    }
}

impl From<Week> for NaiveDate {
    fn from(week: Week) -> Self {
        week.start
    }
}
