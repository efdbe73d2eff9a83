//! Weekly schedule (solution) model.
//!
//! A weekly schedule holds exactly one outcome per school day: a driver
//! assignment, a conflict, or a skipped day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{FamilyId, GroupId, ParentId, Week};

/// A concrete driver assignment for one group on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Carpool group.
    pub group_id: GroupId,
    /// Date driven.
    pub date: NaiveDate,
    /// Family providing the driver.
    pub driver_family_id: FamilyId,
    /// Parent behind the wheel (first parent of the driving family).
    pub driver_parent_id: ParentId,
    /// Families riding as passengers, sorted by id.
    pub passenger_family_ids: Vec<FamilyId>,
}

impl Assignment {
    /// Number of passenger families.
    #[inline]
    pub fn passenger_count(&self) -> usize {
        self.passenger_family_ids.len()
    }

    /// Whether `family_id` rides on this assignment.
    pub fn carries(&self, family_id: &str) -> bool {
        self.passenger_family_ids.iter().any(|f| f == family_id)
    }
}

/// Why no assignment was produced for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    /// Someone needs a ride but nobody can drive.
    NoCandidateDrivers,
    /// Nobody needs a ride and nobody offered to drive.
    NoRidersAndNoDrivers,
}

impl ConflictReason {
    /// Whether this reason is a real failure to staff the day.
    #[inline]
    pub fn is_unresolved(self) -> bool {
        self == ConflictReason::NoCandidateDrivers
    }

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictReason::NoCandidateDrivers => "no_candidate_drivers",
            ConflictReason::NoRidersAndNoDrivers => "no_riders_and_no_drivers",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A day for which no assignment was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Carpool group.
    pub group_id: GroupId,
    /// Affected date.
    pub date: NaiveDate,
    /// Cause.
    pub reason: ConflictReason,
}

impl Conflict {
    /// Creates a conflict record.
    pub fn new(group_id: impl Into<GroupId>, date: NaiveDate, reason: ConflictReason) -> Self {
        Self {
            group_id: group_id.into(),
            date,
            reason,
        }
    }
}

/// Outcome of one school day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOutcome {
    /// A driver was assigned.
    Assigned(Assignment),
    /// The day could not be scheduled (or was reported as idle).
    Conflict(Conflict),
    /// Nothing to schedule; no record is kept.
    Skipped {
        /// The skipped date.
        date: NaiveDate,
    },
}

impl DayOutcome {
    /// Date this outcome refers to.
    pub fn date(&self) -> NaiveDate {
        match self {
            DayOutcome::Assigned(a) => a.date,
            DayOutcome::Conflict(c) => c.date,
            DayOutcome::Skipped { date } => *date,
        }
    }
}

/// The result of one generator run for one group and week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    /// Carpool group.
    pub group_id: GroupId,
    /// Scheduled week.
    pub week: Week,
    /// One outcome per school day, Monday first.
    pub days: Vec<DayOutcome>,
}

/// Wire shape handed to downstream collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyScheduleOutput {
    /// Produced assignments in calendar order.
    pub assignments: Vec<Assignment>,
    /// Recorded conflicts in calendar order.
    pub conflicts: Vec<Conflict>,
}

impl WeeklySchedule {
    /// Creates an empty schedule.
    pub fn new(group_id: impl Into<GroupId>, week: Week) -> Self {
        Self {
            group_id: group_id.into(),
            week,
            days: Vec::new(),
        }
    }

    /// Appends a day outcome.
    pub fn push(&mut self, outcome: DayOutcome) {
        self.days.push(outcome);
    }

    /// All assignments, in calendar order.
    pub fn assignments(&self) -> Vec<&Assignment> {
        self.days
            .iter()
            .filter_map(|d| match d {
                DayOutcome::Assigned(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    /// All conflicts, in calendar order.
    pub fn conflicts(&self) -> Vec<&Conflict> {
        self.days
            .iter()
            .filter_map(|d| match d {
                DayOutcome::Conflict(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// Dates skipped without a record.
    pub fn skipped_dates(&self) -> Vec<NaiveDate> {
        self.days
            .iter()
            .filter_map(|d| match d {
                DayOutcome::Skipped { date } => Some(*date),
                _ => None,
            })
            .collect()
    }

    /// Outcome for a given date.
    pub fn outcome_for(&self, date: NaiveDate) -> Option<&DayOutcome> {
        self.days.iter().find(|d| d.date() == date)
    }

    /// Driver family assigned on `date`, if any.
    pub fn driver_on(&self, date: NaiveDate) -> Option<&str> {
        match self.outcome_for(date)? {
            DayOutcome::Assigned(a) => Some(a.driver_family_id.as_str()),
            _ => None,
        }
    }

    /// Number of days driven per family.
    pub fn driver_counts(&self) -> BTreeMap<FamilyId, usize> {
        let mut counts = BTreeMap::new();
        for a in self.assignments() {
            *counts.entry(a.driver_family_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Whether every day produced an assignment or was skipped.
    pub fn is_fully_staffed(&self) -> bool {
        self.conflicts().iter().all(|c| !c.reason.is_unresolved())
    }

    /// Assignments and conflicts for downstream persistence.
    pub fn to_output(&self) -> WeeklyScheduleOutput {
        WeeklyScheduleOutput {
            assignments: self.assignments().into_iter().cloned().collect(),
            conflicts: self.conflicts().into_iter().cloned().collect(),
        }
    }
}
