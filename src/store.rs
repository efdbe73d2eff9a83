//! Collaborator interfaces and in-memory implementations.
//!
//! The engine never owns persistence. It talks to four collaborators:
//!
//! | Trait | Role |
//! |-------|------|
//! | [`FamilyDirectory`] | Group rosters (read-only) |
//! | [`PreferenceStore`] | Weekly preference batches |
//! | [`DebtStore`] | Fairness debt keyed by (group, family) |
//! | [`ScheduleSink`] | Receives generated schedules |
//!
//! The `InMemory*` types back tests and single-process embedding.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, RwLock};

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::models::{Family, FamilyId, GroupId, PreferenceEntry, Week, WeeklySchedule};

/// Group membership lookup.
pub trait FamilyDirectory: Send + Sync {
    /// Families currently in the group. Unknown groups yield an empty list.
    fn get_families_in_group(&self, group_id: &str) -> Result<Vec<Family>, StoreError>;
}

/// Storage for accepted preference batches.
pub trait PreferenceStore: Send + Sync {
    /// Every entry stored for the group and week.
    fn get_preferences_for_week(
        &self,
        group_id: &str,
        week: &Week,
    ) -> Result<Vec<PreferenceEntry>, StoreError>;

    /// Whether the family has an accepted batch for the week.
    fn has_submission(
        &self,
        group_id: &str,
        week: &Week,
        family_id: &str,
    ) -> Result<bool, StoreError>;

    /// Stores the family's batch for the week.
    ///
    /// An earlier batch is overwritten only when `replace_existing` is set;
    /// otherwise it is kept and `entries` are dropped. Returns whether an
    /// earlier batch existed.
    ///
    /// # Concurrency
    /// The existence check and the write must be one atomic step, so that
    /// of two overlapping first submissions exactly one sees no earlier
    /// batch.
    fn put_family_preferences(
        &self,
        group_id: &str,
        week: &Week,
        family_id: &str,
        entries: Vec<PreferenceEntry>,
        replace_existing: bool,
    ) -> Result<bool, StoreError>;
}

/// Durable fairness debt, keyed by (group, family).
///
/// # Concurrency
/// `apply_deltas` must be an atomic read-modify-write over all entries it
/// touches. Concurrent calls for different groups must not interfere.
pub trait DebtStore: Send + Sync {
    /// All recorded debts for a group.
    fn load_group(&self, group_id: &str) -> Result<HashMap<FamilyId, f64>, StoreError>;

    /// Adds each delta to the family's debt, creating missing entries at 0.0.
    fn apply_deltas(&self, group_id: &str, deltas: &[(FamilyId, f64)]) -> Result<(), StoreError>;
}

/// Downstream consumer of generated schedules.
pub trait ScheduleSink: Send + Sync {
    /// Accepts one generated schedule.
    fn publish(&self, schedule: &WeeklySchedule) -> Result<(), StoreError>;
}

fn poisoned(what: &str) -> StoreError {
    StoreError::Backend(format!("{what} lock poisoned"))
}

/// In-memory [`FamilyDirectory`].
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    groups: RwLock<HashMap<GroupId, Vec<Family>>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a family to a group (builder form).
    pub fn with_family(self, group_id: impl Into<GroupId>, family: Family) -> Self {
        if let Ok(mut groups) = self.groups.write() {
            groups.entry(group_id.into()).or_default().push(family);
        }
        self
    }

    /// Adds a family to a group.
    pub fn add_family(
        &self,
        group_id: impl Into<GroupId>,
        family: Family,
    ) -> Result<(), StoreError> {
        let mut groups = self.groups.write().map_err(|_| poisoned("directory"))?;
        groups.entry(group_id.into()).or_default().push(family);
        Ok(())
    }
}

impl FamilyDirectory for InMemoryDirectory {
    fn get_families_in_group(&self, group_id: &str) -> Result<Vec<Family>, StoreError> {
        let groups = self.groups.read().map_err(|_| poisoned("directory"))?;
        Ok(groups.get(group_id).cloned().unwrap_or_default())
    }
}

type PreferenceKey = (GroupId, NaiveDate, FamilyId);

/// In-memory [`PreferenceStore`].
///
/// Entries come back ordered by family id, then date.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    batches: RwLock<BTreeMap<PreferenceKey, Vec<PreferenceEntry>>>,
}

impl InMemoryPreferenceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get_preferences_for_week(
        &self,
        group_id: &str,
        week: &Week,
    ) -> Result<Vec<PreferenceEntry>, StoreError> {
        let batches = self.batches.read().map_err(|_| poisoned("preference"))?;
        let mut entries: Vec<PreferenceEntry> = batches
            .iter()
            .filter(|((g, start, _), _)| g == group_id && *start == week.start())
            .flat_map(|(_, batch)| batch.iter().cloned())
            .collect();
        entries.sort_by(|a, b| a.family_id.cmp(&b.family_id).then(a.date.cmp(&b.date)));
        Ok(entries)
    }

    fn has_submission(
        &self,
        group_id: &str,
        week: &Week,
        family_id: &str,
    ) -> Result<bool, StoreError> {
        let batches = self.batches.read().map_err(|_| poisoned("preference"))?;
        let key = (group_id.to_string(), week.start(), family_id.to_string());
        Ok(batches.contains_key(&key))
    }

    fn put_family_preferences(
        &self,
        group_id: &str,
        week: &Week,
        family_id: &str,
        entries: Vec<PreferenceEntry>,
        replace_existing: bool,
    ) -> Result<bool, StoreError> {
        let mut batches = self.batches.write().map_err(|_| poisoned("preference"))?;
        let key = (group_id.to_string(), week.start(), family_id.to_string());
        let existed = batches.contains_key(&key);
        if !existed || replace_existing {
            batches.insert(key, entries);
        }
        Ok(existed)
    }
}

/// In-memory [`DebtStore`].
///
/// A single mutex covers the whole map, which makes `apply_deltas` atomic.
#[derive(Debug, Default)]
pub struct InMemoryDebtStore {
    debts: Mutex<HashMap<GroupId, HashMap<FamilyId, f64>>>,
}

impl InMemoryDebtStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<GroupId, HashMap<FamilyId, f64>>>, StoreError> {
        self.debts.lock().map_err(|_| poisoned("debt"))
    }

    /// Overwrites one debt value (seeding history in tests and migrations).
    pub fn set_debt(&self, group_id: &str, family_id: &str, debt: f64) -> Result<(), StoreError> {
        self.lock()?
            .entry(group_id.to_string())
            .or_default()
            .insert(family_id.to_string(), debt);
        Ok(())
    }
}

impl DebtStore for InMemoryDebtStore {
    fn load_group(&self, group_id: &str) -> Result<HashMap<FamilyId, f64>, StoreError> {
        Ok(self.lock()?.get(group_id).cloned().unwrap_or_default())
    }

    fn apply_deltas(&self, group_id: &str, deltas: &[(FamilyId, f64)]) -> Result<(), StoreError> {
        let mut debts = self.lock()?;
        let group = debts.entry(group_id.to_string()).or_default();
        for (family_id, delta) in deltas {
            *group.entry(family_id.clone()).or_insert(0.0) += delta;
        }
        Ok(())
    }
}

/// [`ScheduleSink`] that keeps every published schedule.
#[derive(Debug, Default)]
pub struct CollectingSink {
    published: Mutex<Vec<WeeklySchedule>>,
}

impl CollectingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules published so far.
    pub fn published(&self) -> Vec<WeeklySchedule> {
        self.published
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl ScheduleSink for CollectingSink {
    fn publish(&self, schedule: &WeeklySchedule) -> Result<(), StoreError> {
        self.published
            .lock()
            .map_err(|_| poisoned("sink"))?
            .push(schedule.clone());
        Ok(())
    }
}
