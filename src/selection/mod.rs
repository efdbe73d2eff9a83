//! Driver selection rules and rule engine.
//!
//! Ranks the candidate drivers of one day. The default ranking is by
//! descending fairness debt, with ties broken by ascending family id so the
//! outcome never depends on input order.
//!
//! # Usage
//!
//! ```
//! use carpool_schedule::selection::{rules, Candidate, DriverSelector, SelectionContext};
//! use carpool_schedule::models::PreferenceLevel;
//!
//! let selector = DriverSelector::new().with_rule(rules::HighestDebt);
//! let candidates = vec![
//!     Candidate::new("B", PreferenceLevel::Neutral),
//!     Candidate::new("A", PreferenceLevel::Neutral),
//! ];
//! let context = SelectionContext::new().with_debt("B", 0.5);
//! assert_eq!(selector.select(&candidates, &context), Some(0));
//! ```

mod context;
mod engine;
pub mod rules;

pub use context::{Candidate, SelectionContext};
pub use engine::DriverSelector;

use std::fmt::Debug;

/// Score returned by a selection rule.
///
/// Lower scores = higher priority (selected first).
pub type RuleScore = f64;

/// A rule that scores how strongly a candidate should drive next.
///
/// # Score Convention
/// **Lower score = higher priority.**
pub trait SelectionRule: Send + Sync + Debug {
    /// Rule name (e.g., "DEBT").
    fn name(&self) -> &'static str;

    /// Scores a candidate; lower = selected first.
    fn evaluate(&self, candidate: &Candidate, context: &SelectionContext) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
