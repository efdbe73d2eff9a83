//! Built-in selection rules.
//!
//! # Score Convention
//! All rules return lower scores for candidates that should drive first.

use super::{Candidate, RuleScore, SelectionContext, SelectionRule};
use crate::models::PreferenceLevel;

/// Highest fairness debt first.
///
/// A family with higher debt has driven less than its share and has the
/// strongest claim to the next trip.
#[derive(Debug, Clone, Copy)]
pub struct HighestDebt;

impl SelectionRule for HighestDebt {
    fn name(&self) -> &'static str {
        "DEBT"
    }

    fn evaluate(&self, candidate: &Candidate, context: &SelectionContext) -> RuleScore {
        -context.debt_of(&candidate.family_id)
    }

    fn description(&self) -> &'static str {
        "Highest Fairness Debt"
    }
}

/// Most willing stated level first.
///
/// Preferable (0) before less-preferable (1) before neutral (2).
#[derive(Debug, Clone, Copy)]
pub struct StatedPreference;

impl SelectionRule for StatedPreference {
    fn name(&self) -> &'static str {
        "PREF"
    }

    fn evaluate(&self, candidate: &Candidate, _context: &SelectionContext) -> RuleScore {
        match candidate.level {
            PreferenceLevel::Preferable => 0.0,
            PreferenceLevel::LessPreferable => 1.0,
            PreferenceLevel::Neutral => 2.0,
            PreferenceLevel::Unavailable => f64::MAX,
        }
    }

    fn description(&self) -> &'static str {
        "Stated Preference Level"
    }
}
