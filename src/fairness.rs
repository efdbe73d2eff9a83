//! Fairness ledger.
//!
//! Tracks a per-group, per-family driving debt. Higher debt means the
//! family has driven less than its share and should drive next.
//!
//! # Update Rule
//! With `n` families in the group and `fair_share = 1/n`, each trip:
//! - the driver's debt decreases by `1 - fair_share`
//! - every other family's debt increases by `fair_share`
//!
//! The deltas of one trip sum to zero, so debts measure relative driving
//! frequency rather than absolute trip counts. Debts are scoped to a group
//! and are not comparable across groups.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::{EngineError, StoreError};
use crate::models::{FamilyId, GroupId};
use crate::store::{DebtStore, InMemoryDebtStore};

/// Debt changes for one trip, in family id order.
///
/// Duplicate ids in `all_family_ids` are counted once.
///
/// # Errors
/// `InvalidInput` if the family list is empty or does not contain the driver.
pub fn driving_deltas(
    driver_family_id: &str,
    all_family_ids: &[FamilyId],
) -> Result<Vec<(FamilyId, f64)>, EngineError> {
    let families: BTreeSet<&str> = all_family_ids.iter().map(String::as_str).collect();
    if families.is_empty() {
        return Err(EngineError::InvalidInput(
            "cannot record driving for an empty group".into(),
        ));
    }
    if !families.contains(driver_family_id) {
        return Err(EngineError::InvalidInput(format!(
            "driver '{driver_family_id}' is not a member of the group"
        )));
    }

    let fair_share = 1.0 / families.len() as f64;
    Ok(families
        .into_iter()
        .map(|family_id| {
            let delta = if family_id == driver_family_id {
                -(1.0 - fair_share)
            } else {
                fair_share
            };
            (family_id.to_string(), delta)
        })
        .collect())
}

/// Reads and updates fairness debt through an injected [`DebtStore`].
///
/// Holds no debt in memory; every read goes to the store. The only
/// in-process state is one lock per group, used to serialize concurrent
/// schedule runs for the same group.
pub struct FairnessLedger {
    store: Arc<dyn DebtStore>,
    group_locks: Mutex<HashMap<GroupId, Arc<Mutex<()>>>>,
}

impl FairnessLedger {
    /// Creates a ledger over a store.
    pub fn new(store: Arc<dyn DebtStore>) -> Self {
        Self {
            store,
            group_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a ledger over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryDebtStore::new()))
    }

    /// Debt of one family (0.0 if never observed).
    pub fn debt_for(&self, group_id: &str, family_id: &str) -> Result<f64, StoreError> {
        Ok(self
            .store
            .load_group(group_id)?
            .get(family_id)
            .copied()
            .unwrap_or(0.0))
    }

    /// Debts of the given families, defaulting unseen ones to 0.0.
    pub fn debts_for(
        &self,
        group_id: &str,
        family_ids: &[FamilyId],
    ) -> Result<HashMap<FamilyId, f64>, StoreError> {
        let stored = self.store.load_group(group_id)?;
        Ok(family_ids
            .iter()
            .map(|id| (id.clone(), stored.get(id).copied().unwrap_or(0.0)))
            .collect())
    }

    /// Initializes unseen families at 0.0.
    ///
    /// Returns the number of families that were newly initialized.
    pub fn observe(&self, group_id: &str, family_ids: &[FamilyId]) -> Result<usize, StoreError> {
        let stored = self.store.load_group(group_id)?;
        let unseen: Vec<(FamilyId, f64)> = family_ids
            .iter()
            .filter(|id| !stored.contains_key(*id))
            .map(|id| (id.clone(), 0.0))
            .collect();
        if !unseen.is_empty() {
            debug!(group_id, count = unseen.len(), "initializing fairness debt");
            self.store.apply_deltas(group_id, &unseen)?;
        }
        Ok(unseen.len())
    }

    /// Records that `driver_family_id` drove for the group.
    ///
    /// Returns the applied deltas.
    pub fn record_driving(
        &self,
        group_id: &str,
        driver_family_id: &str,
        all_family_ids: &[FamilyId],
    ) -> Result<Vec<(FamilyId, f64)>, EngineError> {
        let deltas = driving_deltas(driver_family_id, all_family_ids)?;
        self.store.apply_deltas(group_id, &deltas)?;
        debug!(
            group_id,
            driver = driver_family_id,
            families = deltas.len(),
            "recorded driving"
        );
        Ok(deltas)
    }

    /// All recorded debts, highest first, ties by family id.
    pub fn standings(&self, group_id: &str) -> Result<Vec<(FamilyId, f64)>, StoreError> {
        let mut standings: Vec<(FamilyId, f64)> =
            self.store.load_group(group_id)?.into_iter().collect();
        standings.sort_by(|(id_a, debt_a), (id_b, debt_b)| {
            debt_b.total_cmp(debt_a).then_with(|| id_a.cmp(id_b))
        });
        Ok(standings)
    }

    /// Runs `f` while holding the group's lock.
    ///
    /// Runs for the same group are serialized; runs for different groups
    /// never contend. A group's lock entry is dropped as soon as no run
    /// holds or awaits it.
    pub fn with_group_lock<T>(&self, group_id: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_entry(group_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        drop(lock);
        self.release_entry(group_id);
        result
    }

    /// Number of groups with a live lock entry.
    pub fn locked_groups(&self) -> usize {
        self.group_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn lock_entry(&self, group_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .group_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(group_id.to_string()).or_default())
    }

    // Entries are only cloned under the map lock, so a strong count of 1
    // means nobody else holds this group's lock.
    fn release_entry(&self, group_id: &str) {
        let mut locks = self
            .group_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(group_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(group_id);
        }
    }
}

impl std::fmt::Debug for FairnessLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FairnessLedger").finish_non_exhaustive()
    }
}
