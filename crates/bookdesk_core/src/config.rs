//! Circulation policy configuration.
//!
//! # Responsibility
//! - Hold the business constants for fines and loan windows.
//! - Load overrides from JSON documents supplied by the host application.
//!
//! # Invariants
//! - Defaults reproduce the historical rules: 10 per late day, 15-day window.
//! - Loaded policies are validated before use.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default fine charged per whole day late.
pub const DEFAULT_FINE_PER_DAY: u32 = 10;
/// Default maximum distance of a due date from the issue day.
pub const DEFAULT_MAX_LOAN_DAYS: u32 = 15;
/// Upper bound accepted for `max_loan_days`.
pub const MAX_LOAN_DAYS_LIMIT: u32 = 365;

/// Configurable circulation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CirculationPolicy {
    /// Flat fine per whole day past the due date.
    pub fine_per_day: u32,
    /// Due date may be at most this many days after today (inclusive).
    pub max_loan_days: u32,
}

impl Default for CirculationPolicy {
    fn default() -> Self {
        Self {
            fine_per_day: DEFAULT_FINE_PER_DAY,
            max_loan_days: DEFAULT_MAX_LOAN_DAYS,
        }
    }
}

/// Policy parsing/validation failure.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    LoanWindowTooLong { max_loan_days: u32, limit: u32 },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid circulation policy: {err}"),
            Self::LoanWindowTooLong {
                max_loan_days,
                limit,
            } => write!(
                f,
                "max_loan_days ({max_loan_days}) exceeds the supported limit ({limit})"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::LoanWindowTooLong { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl CirculationPolicy {
    /// Parses and validates a policy document. Missing fields use defaults.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let policy: Self = serde_json::from_str(source)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_loan_days > MAX_LOAN_DAYS_LIMIT {
            return Err(ConfigError::LoanWindowTooLong {
                max_loan_days: self.max_loan_days,
                limit: MAX_LOAN_DAYS_LIMIT,
            });
        }
        Ok(())
    }

    /// Fine for `days_late` whole days. Saturates instead of overflowing.
    pub fn fine_for(&self, days_late: i64) -> u32 {
        let days = u32::try_from(days_late.max(0)).unwrap_or(u32::MAX);
        days.saturating_mul(self.fine_per_day)
    }
}

#[cfg(test)]
mod tests {
    use super::{CirculationPolicy, ConfigError};

    #[test]
    fn defaults_match_historical_rules() {
        let policy = CirculationPolicy::default();
        assert_eq!(policy.fine_per_day, 10);
        assert_eq!(policy.max_loan_days, 15);
    }

    #[test]
    fn json_overrides_merge_with_defaults() {
        let policy = CirculationPolicy::from_json_str(r#"{ "fine_per_day": 25 }"#).unwrap();
        assert_eq!(policy.fine_per_day, 25);
        assert_eq!(policy.max_loan_days, 15);
    }

    #[test]
    fn json_rejects_unknown_fields_and_long_windows() {
        let err = CirculationPolicy::from_json_str(r#"{ "grace_days": 2 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = CirculationPolicy::from_json_str(r#"{ "max_loan_days": 400 }"#).unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn fine_is_linear_in_days_late() {
        let policy = CirculationPolicy::default();
        assert_eq!(policy.fine_for(0), 0);
        assert_eq!(policy.fine_for(-4), 0);
        assert_eq!(policy.fine_for(3), 30);
    }
}
