//! Rule engine for driver selection.
//!
//! Applies rules in sequence, consulting the next rule only when the
//! previous one ties within `epsilon`. When every rule ties, the candidate
//! with the lexicographically smaller family id wins.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{rules, Candidate, RuleScore, SelectionContext, SelectionRule};
use crate::config::SelectionConfig;

/// A composable, deterministic ranking of candidate drivers.
///
/// # Example
/// ```
/// use carpool_schedule::selection::{rules, DriverSelector};
///
/// let selector = DriverSelector::new()
///     .with_rule(rules::HighestDebt)
///     .with_rule(rules::StatedPreference);
/// assert_eq!(selector.rule_names(), vec!["DEBT", "PREF"]);
/// ```
#[derive(Clone)]
pub struct DriverSelector {
    rules: Vec<Arc<dyn SelectionRule>>,
    epsilon: f64,
}

impl DriverSelector {
    /// Creates a selector with no rules (family id order only).
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            epsilon: 1e-9,
        }
    }

    /// Builds the configured selector: highest debt, then optionally the
    /// stated level, then family id.
    pub fn from_config(config: &SelectionConfig) -> Self {
        let selector = Self::new()
            .with_epsilon(config.debt_epsilon)
            .with_rule(rules::HighestDebt);
        if config.prefer_stated_level {
            selector.with_rule(rules::StatedPreference)
        } else {
            selector
        }
    }

    /// Appends a rule; earlier rules take precedence.
    pub fn with_rule<R: SelectionRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Sets the tie tolerance.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Names of the configured rules, in precedence order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Sorts candidates by priority (selected first).
    ///
    /// Returns indices into `candidates`. Uses repeated selection rather
    /// than `sort_by`, since epsilon comparison is not transitive.
    pub fn rank(&self, candidates: &[Candidate], context: &SelectionContext) -> Vec<usize> {
        let mut remaining: Vec<usize> = (0..candidates.len()).collect();
        let mut order = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let mut best = 0;
            for pos in 1..remaining.len() {
                let challenger = &candidates[remaining[pos]];
                let incumbent = &candidates[remaining[best]];
                if self.compare(challenger, incumbent, context) == Ordering::Less {
                    best = pos;
                }
            }
            order.push(remaining.remove(best));
        }

        order
    }

    /// Index of the candidate that should drive.
    pub fn select(&self, candidates: &[Candidate], context: &SelectionContext) -> Option<usize> {
        self.rank(candidates, context).first().copied()
    }

    /// Scores from each rule for one candidate.
    pub fn evaluate(&self, candidate: &Candidate, context: &SelectionContext) -> Vec<RuleScore> {
        self.rules
            .iter()
            .map(|rule| rule.evaluate(candidate, context))
            .collect()
    }

    fn compare(&self, a: &Candidate, b: &Candidate, context: &SelectionContext) -> Ordering {
        for rule in &self.rules {
            let score_a = rule.evaluate(a, context);
            let score_b = rule.evaluate(b, context);

            if (score_a - score_b).abs() > self.epsilon {
                return score_a.partial_cmp(&score_b).unwrap_or(Ordering::Equal);
            }
        }

        a.family_id.cmp(&b.family_id)
    }
}

impl Default for DriverSelector {
    fn default() -> Self {
        Self::from_config(&SelectionConfig::default())
    }
}

impl std::fmt::Debug for DriverSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverSelector")
            .field("rules", &self.rule_names())
            .field("epsilon", &self.epsilon)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PreferenceLevel;

    fn neutral(id: &str) -> Candidate {
        Candidate::new(id, PreferenceLevel::Neutral)
    }

    #[test]
    fn test_highest_debt_first() {
        let candidates = vec![neutral("A"), neutral("B"), neutral("C")];
        let ctx = SelectionContext::new()
            .with_debt("A", -0.667)
            .with_debt("B", 0.333)
            .with_debt("C", 0.1);
        let selector = DriverSelector::default();

        let order: Vec<&str> = selector
            .rank(&candidates, &ctx)
            .into_iter()
            .map(|i| candidates[i].family_id.as_str())
            .collect();
        assert_eq!(order, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_tie_broken_by_family_id() {
        let candidates = vec![neutral("B"), neutral("A")];
        let ctx = SelectionContext::new();
        let selector = DriverSelector::default();

        // Debts tied at 0.0 → A before B regardless of input order
        assert_eq!(selector.select(&candidates, &ctx), Some(1));
    }

    #[test]
    fn test_float_noise_is_a_tie() {
        let candidates = vec![neutral("B"), neutral("A")];
        let third = 1.0 / 3.0;
        let ctx = SelectionContext::new()
            .with_debt("A", -(1.0 - third) + third)
            .with_debt("B", third - (1.0 - third));
        let selector = DriverSelector::default();

        assert_eq!(candidates[selector.select(&candidates, &ctx).unwrap()].family_id, "A");
    }

    #[test]
    fn test_stated_preference_breaks_debt_tie() {
        let candidates = vec![
            Candidate::new("A", PreferenceLevel::LessPreferable),
            Candidate::new("B", PreferenceLevel::Preferable),
        ];
        let ctx = SelectionContext::new();

        let plain = DriverSelector::default();
        assert_eq!(plain.select(&candidates, &ctx), Some(0));

        let config = SelectionConfig {
            prefer_stated_level: true,
            ..Default::default()
        };
        let leveled = DriverSelector::from_config(&config);
        assert_eq!(leveled.rule_names(), vec!["DEBT", "PREF"]);
        assert_eq!(leveled.select(&candidates, &ctx), Some(1));
    }

    #[test]
    fn test_debt_outranks_stated_preference() {
        let candidates = vec![
            Candidate::new("A", PreferenceLevel::Preferable),
            Candidate::new("B", PreferenceLevel::LessPreferable),
        ];
        let ctx = SelectionContext::new().with_debt("B", 1.0);
        let config = SelectionConfig {
            prefer_stated_level: true,
            ..Default::default()
        };
        let selector = DriverSelector::from_config(&config);
        assert_eq!(selector.select(&candidates, &ctx), Some(1));
    }

    #[test]
    fn test_empty_candidates() {
        let selector = DriverSelector::default();
        assert!(selector.rank(&[], &SelectionContext::new()).is_empty());
        assert!(selector.select(&[], &SelectionContext::new()).is_none());
    }

    #[test]
    fn test_evaluate_scores() {
        let selector = DriverSelector::new()
            .with_rule(rules::HighestDebt)
            .with_rule(rules::StatedPreference);
        let ctx = SelectionContext::new().with_debt("A", 2.0);
        let scores = selector.evaluate(&Candidate::new("A", PreferenceLevel::Preferable), &ctx);
        assert_eq!(scores.len(), 2);
        assert!((scores[0] + 2.0).abs() < 1e-10);
        assert!(scores[1].abs() < 1e-10);
    }
}
