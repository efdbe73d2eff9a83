//! Error types.
//!
//! Three families of failure exist:
//!
//! - **Input errors** ([`ValidationError`], [`EngineError::InvalidGroupId`],
//!   [`EngineError::InvalidWeekStart`]): rejected before any work is done.
//! - **Storage errors** ([`StoreError`]): raised by collaborators and
//!   propagated unchanged. The engine never retries.
//! - **Scheduling conflicts**: not errors. They are recorded as
//!   [`Conflict`](crate::models::Conflict) data in the schedule.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{FamilyId, PreferenceLevel};

/// A violated input rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Too many entries at one preference level in a weekly batch.
    #[error("limit exceeded for '{level}': {count} entries, at most {max} allowed")]
    LimitExceeded {
        level: PreferenceLevel,
        count: usize,
        max: usize,
    },
    /// The family already has an accepted batch for this week.
    #[error("preferences for family '{family_id}' were already submitted for this week")]
    DuplicateSubmission { family_id: FamilyId },
    /// Two entries in one batch share a date.
    #[error("more than one entry for {date}")]
    DuplicateDate { date: NaiveDate },
    /// An entry is dated outside the week's school days.
    #[error("{date} is not a school day of the week starting {week_start}")]
    DateOutsideWeek {
        date: NaiveDate,
        week_start: NaiveDate,
    },
    /// A batch contains an entry belonging to another family.
    #[error("entry for family '{found}' in a batch submitted by '{expected}'")]
    ForeignEntry { expected: FamilyId, found: FamilyId },
    /// Two families in a roster share an id.
    #[error("duplicate family id '{family_id}' in roster")]
    DuplicateFamily { family_id: FamilyId },
    /// A family has no parent to act as driver.
    #[error("family '{family_id}' has no parent or guardian")]
    MissingParent { family_id: FamilyId },
    /// The group has no families.
    #[error("group has no families")]
    EmptyRoster,
}

/// Failure reported by a storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A concurrent writer changed the data underneath this operation.
    #[error("write conflict on {0}")]
    Conflict(String),
    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Top-level engine error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Group id is blank or unknown.
    #[error("invalid group id '{0}'")]
    InvalidGroupId(String),
    /// Week start is not a Monday.
    #[error("invalid week start {0}: weeks start on Monday")]
    InvalidWeekStart(NaiveDate),
    /// Malformed argument to an engine operation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Input data broke one or more rules.
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<ValidationError>),
    /// Storage collaborator failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Whether the caller can fix this by changing the request.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, EngineError::Store(_))
    }

    /// Validation errors carried by this error, if any.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            EngineError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(error: ValidationError) -> Self {
        EngineError::Validation(vec![error])
    }
}

impl From<Vec<ValidationError>> for EngineError {
    fn from(errors: Vec<ValidationError>) -> Self {
        EngineError::Validation(errors)
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
