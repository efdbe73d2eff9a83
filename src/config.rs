//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! report_idle_days = false
//! resubmission = "reject"    # or "replace"
//!
//! [limits]
//! preferable = 3
//! less_preferable = 2
//! unavailable = 2
//!
//! [selection]
//! prefer_stated_level = false
//! debt_epsilon = 1e-9
//! ```

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::PreferenceLevel;

/// Per-week caps on preference entries by level.
///
/// `Neutral` entries are never capped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceLimits {
    /// Maximum "preferable" days per week.
    pub preferable: usize,
    /// Maximum "less preferable" days per week.
    pub less_preferable: usize,
    /// Maximum "unavailable" days per week.
    pub unavailable: usize,
}

impl PreferenceLimits {
    /// Cap for a level; `None` means unconstrained.
    pub fn max_for(&self, level: PreferenceLevel) -> Option<usize> {
        match level {
            PreferenceLevel::Preferable => Some(self.preferable),
            PreferenceLevel::LessPreferable => Some(self.less_preferable),
            PreferenceLevel::Unavailable => Some(self.unavailable),
            PreferenceLevel::Neutral => None,
        }
    }
}

impl Default for PreferenceLimits {
    fn default() -> Self {
        Self {
            preferable: 3,
            less_preferable: 2,
            unavailable: 2,
        }
    }
}

/// What happens when a family submits a second batch for the same week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResubmissionPolicy {
    /// Reject with `duplicate_submission`.
    #[default]
    Reject,
    /// The new batch fully replaces the earlier one.
    Replace,
}

/// Driver selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Break debt ties by stated level (preferable first) before family id.
    pub prefer_stated_level: bool,
    /// Debts closer than this are considered equal.
    pub debt_epsilon: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            prefer_stated_level: false,
            debt_epsilon: 1e-9,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Weekly preference caps.
    pub limits: PreferenceLimits,
    /// Second-submission policy.
    pub resubmission: ResubmissionPolicy,
    /// Driver selection.
    pub selection: SelectionConfig,
    /// Record days with no entries as `no_riders_and_no_drivers` conflicts.
    pub report_idle_days: bool,
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = toml::from_str(source)
            .map_err(|e| EngineError::InvalidInput(format!("config: {}", e.message())))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the preference limits.
    pub fn with_limits(mut self, limits: PreferenceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the resubmission policy.
    pub fn with_resubmission(mut self, policy: ResubmissionPolicy) -> Self {
        self.resubmission = policy;
        self
    }

    /// Enables the stated-level tie-breaker.
    pub fn with_prefer_stated_level(mut self, enabled: bool) -> Self {
        self.selection.prefer_stated_level = enabled;
        self
    }

    /// Sets the debt comparison epsilon.
    pub fn with_debt_epsilon(mut self, epsilon: f64) -> Self {
        self.selection.debt_epsilon = epsilon;
        self
    }

    /// Enables reporting of idle days.
    pub fn with_report_idle_days(mut self, enabled: bool) -> Self {
        self.report_idle_days = enabled;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), EngineError> {
        let eps = self.selection.debt_epsilon;
        if !eps.is_finite() || eps <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "selection.debt_epsilon must be a positive finite number, got {eps}"
            )));
        }
        Ok(())
    }
}
