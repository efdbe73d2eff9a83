//! Greedy weekly schedule generator.
//!
//! # Algorithm
//!
//! For each school day, Monday to Friday, strictly in calendar order:
//! 1. If no family stated anything for the day, skip it (no carpool).
//! 2. Riders-needed: families with no entry for the day, or `Unavailable`.
//! 3. Candidate drivers: families whose entry permits driving.
//! 4. No candidates → record a `no_candidate_drivers` conflict, move on.
//! 5. Otherwise pick the candidate ranked first by the [`DriverSelector`]
//!    (highest debt, ties by family id), assign it with the riders as
//!    passengers, and record the trip in the ledger before the next day.
//!
//! Each day is decided once and never revisited. Because step 5 writes
//! the ledger, day `d + 1` sees the debt produced by day `d`, so days are
//! never processed in parallel.
//!
//! # Complexity
//! O(d * n * r) where d=5 days, n=families, r=selection rules.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, ValidationError};
use crate::fairness::FairnessLedger;
use crate::models::{
    Assignment, Conflict, ConflictReason, DayOutcome, Family, FamilyId, GroupId, PreferenceEntry,
    PreferenceLevel, Week, WeeklySchedule,
};
use crate::selection::{Candidate, DriverSelector, SelectionContext};
use crate::validation::validate_roster;

/// Input container for one generator run.
#[derive(Debug, Clone)]
pub struct WeekRequest {
    /// Carpool group.
    pub group_id: GroupId,
    /// Week to schedule.
    pub week: Week,
    /// Group roster.
    pub families: Vec<Family>,
    /// Validated preference entries for the week.
    pub preferences: Vec<PreferenceEntry>,
}

impl WeekRequest {
    /// Creates a request with no families or preferences.
    pub fn new(group_id: impl Into<GroupId>, week: Week) -> Self {
        Self {
            group_id: group_id.into(),
            week,
            families: Vec::new(),
            preferences: Vec::new(),
        }
    }

    /// Sets the roster.
    pub fn with_families(mut self, families: Vec<Family>) -> Self {
        self.families = families;
        self
    }

    /// Adds one family.
    pub fn with_family(mut self, family: Family) -> Self {
        self.families.push(family);
        self
    }

    /// Sets the preference entries.
    pub fn with_preferences(mut self, preferences: Vec<PreferenceEntry>) -> Self {
        self.preferences = preferences;
        self
    }

    /// Adds one preference entry.
    pub fn with_preference(mut self, entry: PreferenceEntry) -> Self {
        self.preferences.push(entry);
        self
    }
}

/// Day-by-day greedy driver assignment.
///
/// # Example
///
/// ```
/// use carpool_schedule::fairness::FairnessLedger;
/// use carpool_schedule::models::{Family, PreferenceEntry, Week};
/// use carpool_schedule::scheduler::{WeekRequest, WeeklyScheduler};
/// use chrono::NaiveDate;
///
/// let week = Week::new(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()).unwrap();
/// let request = WeekRequest::new("G1", week)
///     .with_family(Family::new("A").with_parent("A1"))
///     .with_family(Family::new("B").with_parent("B1"))
///     .with_preference(PreferenceEntry::new("A", week.start(), true));
///
/// let ledger = FairnessLedger::in_memory();
/// let schedule = WeeklyScheduler::new().generate(&request, &ledger).unwrap();
/// assert_eq!(schedule.days.len(), 5);
/// assert_eq!(schedule.driver_on(week.start()), Some("A"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct WeeklyScheduler {
    selector: DriverSelector,
    report_idle_days: bool,
}

impl WeeklyScheduler {
    /// Creates a scheduler with the default selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheduler from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            selector: DriverSelector::from_config(&config.selection),
            report_idle_days: config.report_idle_days,
        }
    }

    /// Sets the driver selector.
    pub fn with_selector(mut self, selector: DriverSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Records idle days as `no_riders_and_no_drivers` conflicts.
    pub fn with_report_idle_days(mut self, enabled: bool) -> Self {
        self.report_idle_days = enabled;
        self
    }

    /// Generates the week's schedule, updating the ledger after each
    /// assignment.
    ///
    /// Always yields one outcome per school day. Fails only on malformed
    /// input or a storage error.
    pub fn generate(
        &self,
        request: &WeekRequest,
        ledger: &FairnessLedger,
    ) -> Result<WeeklySchedule, EngineError> {
        validate_roster(&request.families)?;

        let group_id = request.group_id.as_str();
        let mut families: Vec<&Family> = request.families.iter().collect();
        families.sort_by(|a, b| a.id.cmp(&b.id));
        let family_ids: Vec<FamilyId> = families.iter().map(|f| f.id.clone()).collect();

        let levels = index_preferences(request, &family_ids)?;
        ledger.observe(group_id, &family_ids)?;

        info!(
            group_id,
            week_start = %request.week.start(),
            families = families.len(),
            entries = levels.len(),
            "generating weekly schedule"
        );

        let mut schedule = WeeklySchedule::new(group_id, request.week);
        for date in request.week.school_days() {
            let outcome =
                self.schedule_day(group_id, date, &families, &family_ids, &levels, ledger)?;
            schedule.push(outcome);
        }

        info!(
            group_id,
            week_start = %request.week.start(),
            assigned = schedule.assignments().len(),
            conflicts = schedule.conflicts().len(),
            skipped = schedule.skipped_dates().len(),
            "weekly schedule generated"
        );
        Ok(schedule)
    }

    fn schedule_day(
        &self,
        group_id: &str,
        date: NaiveDate,
        families: &[&Family],
        family_ids: &[FamilyId],
        levels: &HashMap<(FamilyId, NaiveDate), PreferenceLevel>,
        ledger: &FairnessLedger,
    ) -> Result<DayOutcome, EngineError> {
        let mut riders: Vec<FamilyId> = Vec::new();
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut stated = 0usize;

        for family in families {
            match levels.get(&(family.id.clone(), date)) {
                Some(level) if level.can_drive() => {
                    stated += 1;
                    candidates.push(Candidate::new(family.id.clone(), *level));
                }
                Some(_) => {
                    stated += 1;
                    riders.push(family.id.clone());
                }
                None => riders.push(family.id.clone()),
            }
        }

        if stated == 0 {
            debug!(group_id, %date, "no preferences stated, skipping day");
            return Ok(if self.report_idle_days {
                DayOutcome::Conflict(Conflict::new(
                    group_id,
                    date,
                    ConflictReason::NoRidersAndNoDrivers,
                ))
            } else {
                DayOutcome::Skipped { date }
            });
        }

        if candidates.is_empty() {
            warn!(group_id, %date, riders = riders.len(), "no candidate drivers");
            return Ok(DayOutcome::Conflict(Conflict::new(
                group_id,
                date,
                ConflictReason::NoCandidateDrivers,
            )));
        }

        let context = SelectionContext::from_debts(ledger.debts_for(group_id, family_ids)?);
        let chosen = self
            .selector
            .select(&candidates, &context)
            .map(|i| &candidates[i])
            .ok_or_else(|| EngineError::InvalidInput(format!("no driver selectable on {date}")))?;

        let driver = families
            .iter()
            .find(|f| f.id == chosen.family_id)
            .ok_or_else(|| {
                EngineError::InvalidInput(format!("unknown driver family '{}'", chosen.family_id))
            })?;
        let parent = driver.designated_driver().ok_or_else(|| {
            EngineError::from(ValidationError::MissingParent {
                family_id: driver.id.clone(),
            })
        })?;

        debug!(
            group_id,
            %date,
            driver = %driver.id,
            debt = context.debt_of(&driver.id),
            candidates = candidates.len(),
            "selected driver"
        );

        let assignment = Assignment {
            group_id: group_id.to_string(),
            date,
            driver_family_id: driver.id.clone(),
            driver_parent_id: parent.clone(),
            passenger_family_ids: riders,
        };

        ledger.record_driving(group_id, &driver.id, family_ids)?;
        Ok(DayOutcome::Assigned(assignment))
    }
}

/// Indexes entries by (family, date).
///
/// Entries for families outside the roster or dates outside the week are
/// ignored. Two entries for the same family and date are an input error.
fn index_preferences(
    request: &WeekRequest,
    family_ids: &[FamilyId],
) -> Result<HashMap<(FamilyId, NaiveDate), PreferenceLevel>, EngineError> {
    let mut levels = HashMap::new();
    let mut errors = Vec::new();

    for entry in &request.preferences {
        if !family_ids.contains(&entry.family_id) {
            warn!(
                group_id = %request.group_id,
                family_id = %entry.family_id,
                "ignoring preference from family outside the group"
            );
            continue;
        }
        if !request.week.contains_school_day(entry.date) {
            warn!(
                group_id = %request.group_id,
                family_id = %entry.family_id,
                date = %entry.date,
                "ignoring preference outside the scheduled week"
            );
            continue;
        }
        let key = (entry.family_id.clone(), entry.date);
        if levels.insert(key, entry.level).is_some() {
            errors.push(ValidationError::DuplicateDate { date: entry.date });
        }
    }

    if errors.is_empty() {
        Ok(levels)
    } else {
        Err(EngineError::Validation(errors))
    }
}
