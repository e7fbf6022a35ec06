//! Membership terms and end-date arithmetic.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Enumerated membership duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MembershipTerm {
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "1year")]
    OneYear,
    #[serde(rename = "2years")]
    TwoYears,
}

impl MembershipTerm {
    /// Fixed day count added for this term. Calendar months are not used.
    pub fn days(self) -> u64 {
        match self {
            Self::SixMonths => 180,
            Self::OneYear => 365,
            Self::TwoYears => 730,
        }
    }

    /// Stable storage/wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SixMonths => "6months",
            Self::OneYear => "1year",
            Self::TwoYears => "2years",
        }
    }

    /// Parses a storage/wire label.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "6months" => Some(Self::SixMonths),
            "1year" => Some(Self::OneYear),
            "2years" => Some(Self::TwoYears),
            _ => None,
        }
    }
}

/// Computes the membership end date for a term starting at `start`.
///
/// Extension passes the current end date as `start`, not today.
/// Saturates at `NaiveDate::MAX` instead of overflowing.
pub fn calculate_membership_end_date(start: NaiveDate, term: MembershipTerm) -> NaiveDate {
    start
        .checked_add_days(Days::new(term.days()))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::{calculate_membership_end_date, MembershipTerm};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn end_date_adds_fixed_day_counts() {
        let start = date(2024, 1, 1);
        assert_eq!(
            calculate_membership_end_date(start, MembershipTerm::SixMonths),
            date(2024, 6, 29)
        );
        assert_eq!(
            calculate_membership_end_date(start, MembershipTerm::OneYear),
            date(2024, 12, 31)
        );
        assert_eq!(
            calculate_membership_end_date(start, MembershipTerm::TwoYears),
            date(2025, 12, 31)
        );
    }

    #[test]
    fn labels_round_trip() {
        for term in [
            MembershipTerm::SixMonths,
            MembershipTerm::OneYear,
            MembershipTerm::TwoYears,
        ] {
            assert_eq!(MembershipTerm::parse(term.as_str()), Some(term));
        }
        assert_eq!(MembershipTerm::parse("3years"), None);
    }

    #[test]
    fn end_date_saturates_near_max() {
        assert_eq!(
            calculate_membership_end_date(NaiveDate::MAX, MembershipTerm::OneYear),
            NaiveDate::MAX
        );
    }
}
