//! Circulation record model.
//!
//! # Responsibility
//! - Define the issue record that lends one catalog item to one member.
//! - Derive the issue lifecycle state from stored flags.
//!
//! # Invariants
//! - At most one unreturned issue exists per book.
//! - Title/author/member name are snapshots taken at issue time.
//! - Issues are never deleted or cancelled.

use crate::model::book::{Book, BookId};
use crate::model::member::{Member, MemberId};
use crate::model::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for issue records.
pub type IssueId = Uuid;

/// Lifecycle state derived from issue flags.
///
/// `Open` -> `Closed` on a fine-free return, or `Open` -> `PendingFine` ->
/// `Closed` once the fine is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Lent out, no return recorded.
    Open,
    /// Return recorded with a positive fine that is not yet paid.
    PendingFine,
    /// Returned and settled.
    Closed,
}

/// Canonical issue record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub book_id: BookId,
    pub book_title: String,
    pub book_author: String,
    pub member_id: MemberId,
    pub member_name: String,
    pub issued_at: DateTime<Utc>,
    /// Due date agreed at issue time.
    pub return_date: NaiveDate,
    pub remarks: Option<String>,
    pub returned: bool,
    pub actual_return_date: Option<NaiveDate>,
    pub fine_amount: Option<u32>,
    pub fine_paid: Option<bool>,
}

impl Issue {
    /// Creates an open issue snapshotting book and member display fields.
    ///
    /// Blank remarks are normalized to `None`.
    pub fn new(
        book: &Book,
        member: &Member,
        issued_at: DateTime<Utc>,
        return_date: NaiveDate,
        remarks: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id: book.id,
            book_title: book.title.clone(),
            book_author: book.author.clone(),
            member_id: member.id,
            member_name: member.name.clone(),
            issued_at,
            return_date,
            remarks: remarks
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            returned: false,
            actual_return_date: None,
            fine_amount: None,
            fine_paid: None,
        }
    }

    pub fn status(&self) -> IssueStatus {
        if self.returned {
            IssueStatus::Closed
        } else if self.fine_amount.is_some_and(|fine| fine > 0) {
            IssueStatus::PendingFine
        } else {
            IssueStatus::Open
        }
    }

    /// Whole days between due date and `on`, never negative.
    pub fn days_late(&self, on: NaiveDate) -> i64 {
        (on - self.return_date).num_days().max(0)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fine_amount.is_some() && self.actual_return_date.is_none() {
            return Err(ValidationError::FineWithoutReturn);
        }
        Ok(())
    }
}
