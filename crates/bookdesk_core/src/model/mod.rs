//! Domain model for the library catalog and circulation records.
//!
//! # Responsibility
//! - Define canonical records for books, members and issues.
//! - Own field-level validation shared by every write path.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Records are never physically deleted; state changes are updates.
//! - A book is unavailable iff one unreturned issue references it.

pub mod book;
pub mod issue;
pub mod member;
pub mod membership;

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field-level validation failure for domain records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace-only.
    BlankField(&'static str),
    /// Email does not look like `local@domain.tld`.
    InvalidEmail(String),
    /// Phone number carries fewer than the minimum digit count.
    InvalidPhone(String),
    /// Membership end date precedes its start date.
    InvalidMembershipWindow { start: NaiveDate, end: NaiveDate },
    /// Recorded fine without a recorded return date.
    FineWithoutReturn,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} is required"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::InvalidPhone(value) => write!(
                f,
                "phone number `{value}` must contain at least {} digits",
                member::MIN_PHONE_DIGITS
            ),
            Self::InvalidMembershipWindow { start, end } => write!(
                f,
                "membership end ({end}) must be >= membership start ({start})"
            ),
            Self::FineWithoutReturn => {
                write!(f, "fine amount requires an actual return date")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}
