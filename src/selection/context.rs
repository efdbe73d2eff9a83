//! Selection context and candidates.

use std::collections::HashMap;

use crate::models::{FamilyId, PreferenceLevel};

/// A family able to drive on the day being scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Candidate family.
    pub family_id: FamilyId,
    /// Stated level for the day (never `Unavailable`).
    pub level: PreferenceLevel,
}

impl Candidate {
    /// Creates a candidate.
    pub fn new(family_id: impl Into<FamilyId>, level: PreferenceLevel) -> Self {
        Self {
            family_id: family_id.into(),
            level,
        }
    }
}

/// Ledger state visible to selection rules.
///
/// Families without a recorded debt count as 0.0.
#[derive(Debug, Clone, Default)]
pub struct SelectionContext {
    /// Current debt per family.
    pub debts: HashMap<FamilyId, f64>,
}

impl SelectionContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context from a debt snapshot.
    pub fn from_debts(debts: HashMap<FamilyId, f64>) -> Self {
        Self { debts }
    }

    /// Sets the debt of one family.
    pub fn with_debt(mut self, family_id: impl Into<FamilyId>, debt: f64) -> Self {
        self.debts.insert(family_id.into(), debt);
        self
    }

    /// Debt of a family (0.0 if unseen).
    pub fn debt_of(&self, family_id: &str) -> f64 {
        self.debts.get(family_id).copied().unwrap_or(0.0)
    }
}
