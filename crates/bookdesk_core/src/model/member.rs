//! Library member model.
//!
//! # Invariants
//! - `membership_number` is unique across members.
//! - `membership_end >= membership_start`.

use crate::model::membership::{calculate_membership_end_date, MembershipTerm};
use crate::model::{require_text, ValidationError};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for members.
pub type MemberId = Uuid;

/// Minimum number of digits a contact phone must carry.
pub const MIN_PHONE_DIGITS: usize = 10;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Canonical member record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub membership_number: String,
    pub membership_start: NaiveDate,
    pub membership_end: NaiveDate,
    pub membership_type: MembershipTerm,
    pub active: bool,
}

/// Input for registering a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub membership_number: String,
    pub membership_type: MembershipTerm,
}

/// Partial update for member contact fields. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl Member {
    /// Creates an active membership starting at `start`.
    pub fn new(input: NewMember, start: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone.trim().to_string(),
            address: input.address.trim().to_string(),
            membership_number: input.membership_number.trim().to_string(),
            membership_start: start,
            membership_end: calculate_membership_end_date(start, input.membership_type),
            membership_type: input.membership_type,
            active: true,
        }
    }

    pub fn apply_patch(&mut self, patch: MemberPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = email.trim().to_string();
        }
        if let Some(phone) = patch.phone {
            self.phone = phone.trim().to_string();
        }
        if let Some(address) = patch.address {
            self.address = address.trim().to_string();
        }
    }

    /// Extends the membership from its current end date.
    pub fn extend(&mut self, term: MembershipTerm) {
        self.membership_end = calculate_membership_end_date(self.membership_end, term);
        self.membership_type = term;
    }

    /// Returns whether the membership is active and not expired on `today`.
    pub fn is_in_good_standing(&self, today: NaiveDate) -> bool {
        self.active && self.membership_end >= today
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.name, "name")?;
        require_text(&self.address, "address")?;
        require_text(&self.membership_number, "membership number")?;

        if !EMAIL_RE.is_match(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }

        let digits = self.phone.chars().filter(char::is_ascii_digit).count();
        if digits < MIN_PHONE_DIGITS {
            return Err(ValidationError::InvalidPhone(self.phone.clone()));
        }

        if self.membership_end < self.membership_start {
            return Err(ValidationError::InvalidMembershipWindow {
                start: self.membership_start,
                end: self.membership_end,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Member, NewMember};
    use crate::model::membership::MembershipTerm;
    use crate::model::ValidationError;
    use chrono::NaiveDate;

    fn sample() -> Member {
        Member::new(
            NewMember {
                name: "John Doe".to_string(),
                email: "john@example.com".to_string(),
                phone: "123-456-7890".to_string(),
                address: "123 Main St, Anytown".to_string(),
                membership_number: "MEM001".to_string(),
                membership_type: MembershipTerm::SixMonths,
            },
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        )
    }

    #[test]
    fn new_member_derives_end_date_from_term() {
        let member = sample();
        assert!(member.active);
        assert_eq!(
            member.membership_end,
            NaiveDate::from_ymd_opt(2025, 8, 28).unwrap()
        );
        member.validate().unwrap();
    }

    #[test]
    fn validate_rejects_malformed_contact_fields() {
        let mut member = sample();
        member.email = "not-an-email".to_string();
        assert!(matches!(
            member.validate(),
            Err(ValidationError::InvalidEmail(_))
        ));

        let mut member = sample();
        member.phone = "555-1234".to_string();
        assert!(matches!(
            member.validate(),
            Err(ValidationError::InvalidPhone(_))
        ));
    }

    #[test]
    fn extend_applies_term_to_current_end() {
        let mut member = sample();
        let previous_end = member.membership_end;
        member.extend(MembershipTerm::OneYear);
        assert_eq!((member.membership_end - previous_end).num_days(), 365);
        assert_eq!(member.membership_type, MembershipTerm::OneYear);
    }

    #[test]
    fn good_standing_requires_active_unexpired_membership() {
        let mut member = sample();
        let end = member.membership_end;
        assert!(member.is_in_good_standing(end));
        assert!(!member.is_in_good_standing(end.succ_opt().unwrap()));
        member.active = false;
        assert!(!member.is_in_good_standing(end));
    }
}
