//! Weekly schedule generation and conflict reporting.
//!
//! # Algorithm
//!
//! `WeeklyScheduler` makes one greedy, day-independent choice per school
//! day: the candidate driver with the highest fairness debt. It does not
//! look ahead within the week or across weeks; the ledger's running debt
//! carries history instead.
//!
//! # Reporting
//!
//! `ConflictReport` aggregates the conflicts of a run for administrators.

mod generator;
mod report;

pub use generator::{WeekRequest, WeeklyScheduler};
pub use report::ConflictReport;
