//! Conflict summary for group administrators.
//!
//! Pure aggregation over the conflicts of one or more generator runs.
//!
//! | Field | Definition |
//! |-------|-----------|
//! | `counts_by_reason` | Number of conflicts per reason |
//! | `unresolved_dates` | Dates someone needed a ride but nobody could drive |
//! | `idle_dates` | Dates reported with nobody riding or driving |

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Conflict, ConflictReason, WeeklySchedule};

/// Aggregated view of conflicts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictReport {
    /// Conflict count per reason.
    pub counts_by_reason: BTreeMap<ConflictReason, usize>,
    /// Dates with no candidate drivers, ascending, deduplicated.
    pub unresolved_dates: Vec<NaiveDate>,
    /// Idle dates, ascending, deduplicated.
    pub idle_dates: Vec<NaiveDate>,
}

impl ConflictReport {
    /// Summarizes a list of conflicts.
    pub fn from_conflicts<'a, I>(conflicts: I) -> Self
    where
        I: IntoIterator<Item = &'a Conflict>,
    {
        let mut report = Self::default();
        for conflict in conflicts {
            *report.counts_by_reason.entry(conflict.reason).or_insert(0) += 1;
            match conflict.reason {
                ConflictReason::NoCandidateDrivers => report.unresolved_dates.push(conflict.date),
                ConflictReason::NoRidersAndNoDrivers => report.idle_dates.push(conflict.date),
            }
        }
        report.unresolved_dates.sort();
        report.unresolved_dates.dedup();
        report.idle_dates.sort();
        report.idle_dates.dedup();
        report
    }

    /// Summarizes the conflicts of one schedule.
    pub fn from_schedule(schedule: &WeeklySchedule) -> Self {
        Self::from_conflicts(schedule.conflicts())
    }

    /// Conflicts recorded for a reason.
    pub fn count(&self, reason: ConflictReason) -> usize {
        self.counts_by_reason.get(&reason).copied().unwrap_or(0)
    }

    /// Total number of conflicts.
    pub fn total(&self) -> usize {
        self.counts_by_reason.values().sum()
    }

    /// Whether any day still needs a driver.
    pub fn has_unresolved(&self) -> bool {
        !self.unresolved_dates.is_empty()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total() == 0 {
            return f.write_str("no conflicts");
        }
        let counts: Vec<String> = self
            .counts_by_reason
            .iter()
            .map(|(reason, count)| format!("{reason}={count}"))
            .collect();
        write!(f, "{} conflict(s) [{}]", self.total(), counts.join(", "))?;
        if self.has_unresolved() {
            let dates: Vec<String> = self.unresolved_dates.iter().map(|d| d.to_string()).collect();
            write!(f, "; unresolved: {}", dates.join(", "))?;
        }
        Ok(())
    }
}
