//! Carpool scheduling domain models.
//!
//! Provides the data types exchanged between the validator, the fairness
//! ledger, the weekly generator and the conflict reporter.
//!
//! # Domain Mappings
//!
//! | carpool-schedule | Role |
//! |------------------|------|
//! | Family | Household that drives or rides |
//! | PreferenceEntry | Stated availability for one date |
//! | Week | Monday-anchored scheduling horizon |
//! | Assignment | Driver + passengers for one date |
//! | Conflict | Date that could not be staffed |

mod family;
mod preference;
mod schedule;
mod week;

pub use family::{ChildId, Family, FamilyId, GroupId, Location, ParentId};
pub use preference::{DrivingSignal, PreferenceEntry, PreferenceLevel};
pub use schedule::{
    Assignment, Conflict, ConflictReason, DayOutcome, WeeklySchedule, WeeklyScheduleOutput,
};
pub use week::{Week, SCHOOL_DAYS_PER_WEEK};
