//! Engine facade.
//!
//! Wires the collaborators together and exposes the two operations
//! callers use: submitting a family's weekly preferences and generating
//! a group's weekly schedule. Authentication and authorization happen
//! before these calls.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::{EngineConfig, ResubmissionPolicy};
use crate::error::EngineError;
use crate::fairness::FairnessLedger;
use crate::models::{DrivingSignal, PreferenceEntry, Week, WeeklySchedule};
use crate::scheduler::{ConflictReport, WeekRequest, WeeklyScheduler};
use crate::store::{DebtStore, FamilyDirectory, PreferenceStore, ScheduleSink};
use crate::validation::{PreferenceValidator, SubmissionKind};

/// The weekly carpool scheduling engine.
///
/// # Concurrency
/// Runs for different groups proceed in parallel. Runs for the same group
/// are serialized by the ledger's per-group lock, held for the whole week,
/// so no debt update is lost between them.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use carpool_schedule::engine::CarpoolEngine;
/// use carpool_schedule::models::{Family, PreferenceLevel};
/// use carpool_schedule::store::{InMemoryDebtStore, InMemoryDirectory, InMemoryPreferenceStore};
/// use chrono::NaiveDate;
///
/// let directory = InMemoryDirectory::new()
///     .with_family("G1", Family::new("A").with_parent("A1"))
///     .with_family("G1", Family::new("B").with_parent("B1"));
/// let engine = CarpoolEngine::new(
///     Arc::new(directory),
///     Arc::new(InMemoryPreferenceStore::new()),
///     Arc::new(InMemoryDebtStore::new()),
/// );
///
/// let monday = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
/// engine
///     .submit_preferences("G1", "B", monday, vec![(monday, PreferenceLevel::Preferable.into())])
///     .unwrap();
///
/// let schedule = engine.generate_weekly_schedule("G1", monday).unwrap();
/// assert_eq!(schedule.driver_on(monday), Some("B"));
/// ```
pub struct CarpoolEngine {
    directory: Arc<dyn FamilyDirectory>,
    preferences: Arc<dyn PreferenceStore>,
    ledger: FairnessLedger,
    sink: Option<Arc<dyn ScheduleSink>>,
    config: EngineConfig,
}

impl CarpoolEngine {
    /// Creates an engine with the default configuration and no sink.
    pub fn new(
        directory: Arc<dyn FamilyDirectory>,
        preferences: Arc<dyn PreferenceStore>,
        debts: Arc<dyn DebtStore>,
    ) -> Self {
        Self {
            directory,
            preferences,
            ledger: FairnessLedger::new(debts),
            sink: None,
            config: EngineConfig::default(),
        }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Sets the schedule sink.
    pub fn with_sink(mut self, sink: Arc<dyn ScheduleSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The fairness ledger.
    pub fn ledger(&self) -> &FairnessLedger {
        &self.ledger
    }

    /// Validates and stores one family's preferences for a week.
    ///
    /// Both signal representations are accepted and converted to levels
    /// before validation. Whether a second batch replaces the first or is
    /// rejected follows [`EngineConfig::resubmission`].
    pub fn submit_preferences(
        &self,
        group_id: &str,
        family_id: &str,
        week_start: NaiveDate,
        signals: Vec<(NaiveDate, DrivingSignal)>,
    ) -> Result<SubmissionKind, EngineError> {
        let week = parse_week(week_start)?;
        check_group_id(group_id)?;

        let members = self.directory.get_families_in_group(group_id)?;
        if members.is_empty() {
            return Err(EngineError::InvalidGroupId(group_id.to_string()));
        }
        if !members.iter().any(|f| f.id == family_id) {
            return Err(EngineError::InvalidInput(format!(
                "family '{family_id}' is not a member of group '{group_id}'"
            )));
        }

        let entries: Vec<PreferenceEntry> = signals
            .into_iter()
            .map(|(date, signal)| PreferenceEntry::new(family_id, date, signal))
            .collect();

        let validator = PreferenceValidator::from_config(&self.config);
        if let Err(errors) = validator.validate_batch(family_id, &week, &entries) {
            warn!(group_id, family_id, errors = errors.len(), "preference batch rejected");
            return Err(EngineError::Validation(errors));
        }

        let replace_existing = self.config.resubmission == ResubmissionPolicy::Replace;
        let already_submitted = self.preferences.put_family_preferences(
            group_id,
            &week,
            family_id,
            entries,
            replace_existing,
        )?;
        let kind = validator.check_resubmission(family_id, already_submitted)?;
        info!(group_id, family_id, week_start = %week.start(), ?kind, "preferences accepted");
        Ok(kind)
    }

    /// Generates the schedule for one group and week.
    ///
    /// Every weekday gets an outcome. Fails only on malformed input or a
    /// storage error; days without a driver are reported as conflicts.
    ///
    /// # Errors
    /// Each assignment is written to the ledger as soon as it is made. If
    /// the sink then fails to publish, the error is returned but the debts
    /// have already moved: retrying the same week records every trip a
    /// second time. Recover by republishing, not by regenerating.
    pub fn generate_weekly_schedule(
        &self,
        group_id: &str,
        week_start: NaiveDate,
    ) -> Result<WeeklySchedule, EngineError> {
        let week = parse_week(week_start)?;
        check_group_id(group_id)?;

        let families = self.directory.get_families_in_group(group_id)?;
        if families.is_empty() {
            return Err(EngineError::InvalidGroupId(group_id.to_string()));
        }

        let schedule = self.ledger.with_group_lock(group_id, || -> Result<_, EngineError> {
            let preferences = self.preferences.get_preferences_for_week(group_id, &week)?;
            let request = WeekRequest::new(group_id, week)
                .with_families(families)
                .with_preferences(preferences);
            WeeklyScheduler::from_config(&self.config).generate(&request, &self.ledger)
        })?;

        let report = ConflictReport::from_schedule(&schedule);
        if report.has_unresolved() {
            warn!(group_id, week_start = %week.start(), %report, "schedule has unresolved days");
        }

        if let Some(sink) = &self.sink {
            sink.publish(&schedule)?;
        }
        Ok(schedule)
    }
}

impl std::fmt::Debug for CarpoolEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarpoolEngine")
            .field("config", &self.config)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

fn parse_week(week_start: NaiveDate) -> Result<Week, EngineError> {
    Week::new(week_start).ok_or(EngineError::InvalidWeekStart(week_start))
}

fn check_group_id(group_id: &str) -> Result<(), EngineError> {
    if group_id.trim().is_empty() {
        return Err(EngineError::InvalidGroupId(group_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, ValidationError};
    use crate::models::{ConflictReason, Family, FamilyId, PreferenceLevel};
    use crate::store::{
        CollectingSink, InMemoryDebtStore, InMemoryDirectory, InMemoryPreferenceStore,
    };
    use chrono::Days;
    use std::collections::HashMap;
    use std::sync::Barrier;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }

    fn day(offset: u64) -> NaiveDate {
        monday() + Days::new(offset)
    }

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_family("G1", Family::new("A").with_parent("A1"))
            .with_family("G1", Family::new("B").with_parent("B1"))
            .with_family("G1", Family::new("C").with_parent("C1"))
    }

    fn engine() -> CarpoolEngine {
        CarpoolEngine::new(
            Arc::new(directory()),
            Arc::new(InMemoryPreferenceStore::new()),
            Arc::new(InMemoryDebtStore::new()),
        )
    }

    fn same_signal(days: u64, can_drive: bool) -> Vec<(NaiveDate, DrivingSignal)> {
        (0..days).map(|i| (day(i), DrivingSignal::from(can_drive))).collect()
    }

    #[derive(Debug)]
    struct FailingDebtStore;

    impl DebtStore for FailingDebtStore {
        fn load_group(&self, _group_id: &str) -> Result<HashMap<FamilyId, f64>, StoreError> {
            Err(StoreError::Unavailable("debt store offline".into()))
        }

        fn apply_deltas(
            &self,
            _group_id: &str,
            _deltas: &[(FamilyId, f64)],
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("debt store offline".into()))
        }
    }

    #[derive(Debug)]
    struct FailingSink;

    impl ScheduleSink for FailingSink {
        fn publish(&self, _schedule: &WeeklySchedule) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("sink offline".into()))
        }
    }

    /// Holds each writer at a barrier until all overlapping writers arrive.
    struct GatedPreferenceStore {
        inner: InMemoryPreferenceStore,
        gate: Barrier,
    }

    impl PreferenceStore for GatedPreferenceStore {
        fn get_preferences_for_week(
            &self,
            group_id: &str,
            week: &Week,
        ) -> Result<Vec<PreferenceEntry>, StoreError> {
            self.inner.get_preferences_for_week(group_id, week)
        }

        fn has_submission(
            &self,
            group_id: &str,
            week: &Week,
            family_id: &str,
        ) -> Result<bool, StoreError> {
            self.inner.has_submission(group_id, week, family_id)
        }

        fn put_family_preferences(
            &self,
            group_id: &str,
            week: &Week,
            family_id: &str,
            entries: Vec<PreferenceEntry>,
            replace_existing: bool,
        ) -> Result<bool, StoreError> {
            self.gate.wait();
            self.inner
                .put_family_preferences(group_id, week, family_id, entries, replace_existing)
        }
    }

    #[test]
    fn test_submit_and_generate() {
        let engine = engine();
        engine
            .submit_preferences("G1", "A", monday(), same_signal(2, true))
            .unwrap();
        engine
            .submit_preferences("G1", "B", monday(), same_signal(2, true))
            .unwrap();
        engine
            .submit_preferences("G1", "C", monday(), same_signal(2, false))
            .unwrap();

        let schedule = engine.generate_weekly_schedule("G1", monday()).unwrap();
        assert_eq!(schedule.driver_on(day(0)), Some("A"));
        assert_eq!(schedule.driver_on(day(1)), Some("B"));
        assert_eq!(schedule.skipped_dates().len(), 3);
    }

    #[test]
    fn test_overlapping_submissions_accept_one_batch() {
        let preferences = Arc::new(GatedPreferenceStore {
            inner: InMemoryPreferenceStore::new(),
            gate: Barrier::new(2),
        });
        let engine = CarpoolEngine::new(
            Arc::new(directory()),
            preferences.clone(),
            Arc::new(InMemoryDebtStore::new()),
        );

        let results: Vec<Result<SubmissionKind, EngineError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = [true, false]
                .into_iter()
                .map(|can_drive| {
                    let engine = &engine;
                    scope.spawn(move || {
                        engine.submit_preferences("G1", "A", monday(), same_signal(1, can_drive))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(accepted, 1);
        assert!(results.contains(&Ok(SubmissionKind::Initial)));
        assert!(results.contains(&Err(EngineError::from(
            ValidationError::DuplicateSubmission {
                family_id: "A".into()
            }
        ))));

        let week = Week::new(monday()).unwrap();
        let stored = preferences.get_preferences_for_week("G1", &week).unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn test_sink_failure_keeps_recorded_trips() {
        let engine = engine().with_sink(Arc::new(FailingSink));
        engine
            .submit_preferences("G1", "A", monday(), same_signal(1, true))
            .unwrap();

        let err = engine.generate_weekly_schedule("G1", monday()).unwrap_err();
        assert_eq!(
            err,
            EngineError::Store(StoreError::Unavailable("sink offline".into()))
        );
        assert!((engine.ledger().debt_for("G1", "A").unwrap() + 2.0 / 3.0).abs() < 1e-10);
        assert_eq!(engine.ledger().locked_groups(), 0);
    }

    #[test]
    fn test_invalid_week_start() {
        let err = engine().generate_weekly_schedule("G1", day(1)).unwrap_err();
        assert_eq!(err, EngineError::InvalidWeekStart(day(1)));

        let err = engine()
            .submit_preferences("G1", "A", day(2), vec![])
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidWeekStart(day(2)));
    }

    #[test]
    fn test_invalid_group_id() {
        assert_eq!(
            engine().generate_weekly_schedule("  ", monday()).unwrap_err(),
            EngineError::InvalidGroupId("  ".into())
        );
        assert_eq!(
            engine().generate_weekly_schedule("G404", monday()).unwrap_err(),
            EngineError::InvalidGroupId("G404".into())
        );
    }

    #[test]
    fn test_submit_limit_exceeded() {
        let signals: Vec<(NaiveDate, DrivingSignal)> = (0..4)
            .map(|i| (day(i), DrivingSignal::from(PreferenceLevel::Preferable)))
            .collect();
        let err = engine()
            .submit_preferences("G1", "A", monday(), signals)
            .unwrap_err();
        assert_eq!(
            err.validation_errors(),
            &[ValidationError::LimitExceeded {
                level: PreferenceLevel::Preferable,
                count: 4,
                max: 3,
            }]
        );
    }

    #[test]
    fn test_submit_unknown_family() {
        let err = engine()
            .submit_preferences("G1", "Z", monday(), vec![(day(0), true.into())])
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn test_duplicate_submission_rejected_by_default() {
        let engine = engine();
        assert_eq!(
            engine
                .submit_preferences("G1", "A", monday(), vec![(day(0), true.into())])
                .unwrap(),
            SubmissionKind::Initial
        );
        let err = engine
            .submit_preferences("G1", "A", monday(), vec![(day(1), true.into())])
            .unwrap_err();
        assert_eq!(
            err.validation_errors(),
            &[ValidationError::DuplicateSubmission {
                family_id: "A".into()
            }]
        );

        // First batch still in force
        let schedule = engine.generate_weekly_schedule("G1", monday()).unwrap();
        assert_eq!(schedule.driver_on(day(0)), Some("A"));
        assert_eq!(schedule.driver_on(day(1)), None);
    }

    #[test]
    fn test_resubmission_replaces_when_configured() {
        let engine = engine()
            .with_config(EngineConfig::new().with_resubmission(ResubmissionPolicy::Replace))
            .unwrap();
        engine
            .submit_preferences("G1", "A", monday(), vec![(day(0), true.into())])
            .unwrap();
        assert_eq!(
            engine
                .submit_preferences("G1", "A", monday(), vec![(day(1), true.into())])
                .unwrap(),
            SubmissionKind::Replacement
        );

        let schedule = engine.generate_weekly_schedule("G1", monday()).unwrap();
        assert_eq!(schedule.driver_on(day(0)), None);
        assert_eq!(schedule.driver_on(day(1)), Some("A"));
    }

    #[test]
    fn test_store_errors_propagate() {
        let engine = CarpoolEngine::new(
            Arc::new(directory()),
            Arc::new(InMemoryPreferenceStore::new()),
            Arc::new(FailingDebtStore),
        );
        let err = engine.generate_weekly_schedule("G1", monday()).unwrap_err();
        assert_eq!(
            err,
            EngineError::Store(StoreError::Unavailable("debt store offline".into()))
        );
    }

    #[test]
    fn test_sink_receives_schedule() {
        let sink = Arc::new(CollectingSink::new());
        let engine = engine().with_sink(sink.clone());
        engine
            .submit_preferences("G1", "A", monday(), vec![(day(0), false.into())])
            .unwrap();

        let schedule = engine.generate_weekly_schedule("G1", monday()).unwrap();
        let published = sink.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0], schedule);
        assert_eq!(
            schedule.conflicts()[0].reason,
            ConflictReason::NoCandidateDrivers
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(engine()
            .with_config(EngineConfig::new().with_debt_epsilon(f64::NAN))
            .is_err());
    }
}
