//! Input validation for carpool scheduling.
//!
//! Gates what the generator may trust. Detects:
//! - Preference batches over the per-level weekly limits
//! - Entries for other families, off-week dates, or repeated dates
//! - Second submissions for a week (per [`ResubmissionPolicy`])
//! - Rosters with duplicate ids, parentless families, or no families
//!
//! Validation has no side effects; in particular it never touches the
//! fairness ledger.

use std::collections::{HashMap, HashSet};

use crate::config::{EngineConfig, PreferenceLimits, ResubmissionPolicy};
use crate::error::ValidationError;
use crate::models::{Family, PreferenceEntry, PreferenceLevel, Week};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Whether an accepted batch is new or replaces an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    /// First batch for this family and week.
    Initial,
    /// Replaces the previously accepted batch in full.
    Replacement,
}

/// Validates weekly preference batches.
#[derive(Debug, Clone, Default)]
pub struct PreferenceValidator {
    limits: PreferenceLimits,
    resubmission: ResubmissionPolicy,
}

impl PreferenceValidator {
    /// Creates a validator.
    pub fn new(limits: PreferenceLimits, resubmission: ResubmissionPolicy) -> Self {
        Self {
            limits,
            resubmission,
        }
    }

    /// Creates a validator from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.limits.clone(), config.resubmission)
    }

    /// Configured limits.
    pub fn limits(&self) -> &PreferenceLimits {
        &self.limits
    }

    /// Validates one family's batch for one week.
    ///
    /// Checks:
    /// 1. Every entry belongs to `family_id`
    /// 2. Every entry falls on a school day of `week`
    /// 3. No date appears twice
    /// 4. Level counts stay within limits (preferable, less-preferable,
    ///    unavailable, in that order)
    ///
    /// # Returns
    /// `Ok(())` if all checks pass, `Err(errors)` with every detected issue.
    pub fn validate_batch(
        &self,
        family_id: &str,
        week: &Week,
        entries: &[PreferenceEntry],
    ) -> ValidationResult {
        let mut errors = Vec::new();
        let mut seen_dates = HashSet::new();
        let mut counts: HashMap<PreferenceLevel, usize> = HashMap::new();

        for entry in entries {
            if entry.family_id != family_id {
                errors.push(ValidationError::ForeignEntry {
                    expected: family_id.to_string(),
                    found: entry.family_id.clone(),
                });
            }
            if !week.contains_school_day(entry.date) {
                errors.push(ValidationError::DateOutsideWeek {
                    date: entry.date,
                    week_start: week.start(),
                });
            }
            if !seen_dates.insert(entry.date) {
                errors.push(ValidationError::DuplicateDate { date: entry.date });
            }
            *counts.entry(entry.level).or_insert(0) += 1;
        }

        for level in PreferenceLevel::ALL {
            let Some(max) = self.limits.max_for(level) else {
                continue;
            };
            let count = counts.get(&level).copied().unwrap_or(0);
            if count > max {
                errors.push(ValidationError::LimitExceeded { level, count, max });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Applies the resubmission policy.
    ///
    /// `already_submitted` tells whether an accepted batch exists for this
    /// family and week.
    pub fn check_resubmission(
        &self,
        family_id: &str,
        already_submitted: bool,
    ) -> Result<SubmissionKind, ValidationError> {
        match (already_submitted, self.resubmission) {
            (false, _) => Ok(SubmissionKind::Initial),
            (true, ResubmissionPolicy::Replace) => Ok(SubmissionKind::Replacement),
            (true, ResubmissionPolicy::Reject) => Err(ValidationError::DuplicateSubmission {
                family_id: family_id.to_string(),
            }),
        }
    }
}

/// Validates a group roster.
///
/// Checks:
/// 1. The roster is not empty
/// 2. No duplicate family IDs
/// 3. Every family has at least one parent
pub fn validate_roster(families: &[Family]) -> ValidationResult {
    let mut errors = Vec::new();

    if families.is_empty() {
        errors.push(ValidationError::EmptyRoster);
    }

    let mut ids = HashSet::new();
    for family in families {
        if !ids.insert(family.id.as_str()) {
            errors.push(ValidationError::DuplicateFamily {
                family_id: family.id.clone(),
            });
        }
        if family.parent_ids.is_empty() {
            errors.push(ValidationError::MissingParent {
                family_id: family.id.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn week() -> Week {
        Week::new(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()).unwrap()
    }

    fn day(offset: u64) -> NaiveDate {
        week().start() + Days::new(offset)
    }

    fn batch(levels: &[PreferenceLevel]) -> Vec<PreferenceEntry> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| PreferenceEntry::new("F1", day(i as u64), level))
            .collect()
    }

    #[test]
    fn test_valid_batch() {
        use PreferenceLevel::*;
        let v = PreferenceValidator::default();
        let entries = batch(&[Preferable, Preferable, Preferable, LessPreferable, Neutral]);
        assert!(v.validate_batch("F1", &week(), &entries).is_ok());
        assert!(v.validate_batch("F1", &week(), &[]).is_ok());
    }

    #[test]
    fn test_four_preferable_rejected() {
        use PreferenceLevel::*;
        let v = PreferenceValidator::default();
        let entries = batch(&[Preferable, Preferable, Preferable, Preferable]);

        let errors = v.validate_batch("F1", &week(), &entries).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::LimitExceeded {
                level: Preferable,
                count: 4,
                max: 3,
            }]
        );
    }

    #[test]
    fn test_unavailable_and_less_preferable_limits() {
        use PreferenceLevel::*;
        let v = PreferenceValidator::default();

        let entries = batch(&[Unavailable, Unavailable, Unavailable]);
        let errors = v.validate_batch("F1", &week(), &entries).unwrap_err();
        assert!(errors.contains(&ValidationError::LimitExceeded {
            level: Unavailable,
            count: 3,
            max: 2,
        }));

        let entries = batch(&[LessPreferable, LessPreferable, LessPreferable]);
        let errors = v.validate_batch("F1", &week(), &entries).unwrap_err();
        assert!(errors.contains(&ValidationError::LimitExceeded {
            level: LessPreferable,
            count: 3,
            max: 2,
        }));
    }

    #[test]
    fn test_neutral_unconstrained() {
        let v = PreferenceValidator::default();
        let entries = batch(&[PreferenceLevel::Neutral; 5]);
        assert!(v.validate_batch("F1", &week(), &entries).is_ok());
    }

    #[test]
    fn test_boolean_false_counts_as_unavailable() {
        let v = PreferenceValidator::default();
        let entries: Vec<PreferenceEntry> = (0..3)
            .map(|i| PreferenceEntry::new("F1", day(i), false))
            .collect();
        let errors = v.validate_batch("F1", &week(), &entries).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::LimitExceeded {
                level: PreferenceLevel::Unavailable,
                ..
            }
        ));
    }

    #[test]
    fn test_structural_errors() {
        let v = PreferenceValidator::default();
        let entries = vec![
            PreferenceEntry::new("F1", day(0), true),
            PreferenceEntry::new("F1", day(0), false),
            PreferenceEntry::new("F2", day(1), true),
            PreferenceEntry::new("F1", day(5), true), // Saturday
        ];

        let errors = v.validate_batch("F1", &week(), &entries).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateDate { date: day(0) }));
        assert!(errors.contains(&ValidationError::ForeignEntry {
            expected: "F1".into(),
            found: "F2".into(),
        }));
        assert!(errors.contains(&ValidationError::DateOutsideWeek {
            date: day(5),
            week_start: week().start(),
        }));
    }

    #[test]
    fn test_custom_limits() {
        let limits = PreferenceLimits {
            preferable: 5,
            ..Default::default()
        };
        let v = PreferenceValidator::new(limits, ResubmissionPolicy::Reject);
        let entries = batch(&[PreferenceLevel::Preferable; 5]);
        assert!(v.validate_batch("F1", &week(), &entries).is_ok());
    }

    #[test]
    fn test_resubmission_reject() {
        let v = PreferenceValidator::new(PreferenceLimits::default(), ResubmissionPolicy::Reject);
        assert_eq!(v.check_resubmission("F1", false), Ok(SubmissionKind::Initial));
        assert_eq!(
            v.check_resubmission("F1", true),
            Err(ValidationError::DuplicateSubmission {
                family_id: "F1".into()
            })
        );
    }

    #[test]
    fn test_resubmission_replace() {
        let v = PreferenceValidator::new(PreferenceLimits::default(), ResubmissionPolicy::Replace);
        assert_eq!(v.check_resubmission("F1", false), Ok(SubmissionKind::Initial));
        assert_eq!(
            v.check_resubmission("F1", true),
            Ok(SubmissionKind::Replacement)
        );
    }

    #[test]
    fn test_valid_roster() {
        let families = vec![
            Family::new("A").with_parent("A1"),
            Family::new("B").with_parent("B1"),
        ];
        assert!(validate_roster(&families).is_ok());
    }

    #[test]
    fn test_roster_errors() {
        assert_eq!(
            validate_roster(&[]).unwrap_err(),
            vec![ValidationError::EmptyRoster]
        );

        let families = vec![
            Family::new("A").with_parent("A1"),
            Family::new("A").with_parent("A2"),
            Family::new("B"),
        ];
        let errors = validate_roster(&families).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::DuplicateFamily {
            family_id: "A".into()
        }));
        assert!(errors.contains(&ValidationError::MissingParent {
            family_id: "B".into()
        }));
    }
}
