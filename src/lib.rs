//! Weekly carpool scheduling with long-run driving fairness.
//!
//! Families submit weekly driving preferences; the engine turns them into
//! a concrete driver per school day for a carpool group, and keeps a
//! per-family fairness debt so the driving burden evens out over time.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Family`, `PreferenceEntry`, `Week`,
//!   `Assignment`, `Conflict`, `WeeklySchedule`
//! - **`validation`**: Weekly preference limits, resubmission policy, roster checks
//! - **`fairness`**: The debt ledger and its zero-sum update rule
//! - **`selection`**: Rule engine ranking candidate drivers
//! - **`scheduler`**: The greedy weekly generator and the conflict report
//! - **`store`**: Collaborator traits and in-memory implementations
//! - **`engine`**: Facade exposing `generate_weekly_schedule`
//!
//! # Architecture
//!
//! Validation gates which preferences the generator trusts. The generator
//! reads the roster, the week's preferences and the ledger, then for each
//! weekday partitions families into riders and candidate drivers, picks
//! the candidate with the highest debt, and records the trip in the ledger
//! before moving to the next day. Days nobody can staff become conflicts;
//! they never abort the run.

pub mod config;
pub mod engine;
pub mod error;
pub mod fairness;
pub mod models;
pub mod scheduler;
pub mod selection;
pub mod store;
pub mod validation;

pub use config::EngineConfig;
pub use engine::CarpoolEngine;
pub use error::{EngineError, StoreError, ValidationError};
