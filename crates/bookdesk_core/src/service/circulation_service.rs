//! Circulation use-case service: issue, return and fine settlement.
//!
//! # Responsibility
//! - Validate and create issue records.
//! - Compute lateness fines and close issues.
//! - Keep book availability consistent with open issues.
//!
//! # Invariants
//! - Issue preconditions are checked in a fixed order: existence,
//!   availability, due date not before today, due date within the window.
//! - Both due-date bounds are inclusive.
//! - A fine-free return closes the issue immediately; a fined return stays
//!   open until `pay_fine`.
//! - Closed issues accept no further transitions.

use crate::clock::Clock;
use crate::config::CirculationPolicy;
use crate::model::book::BookId;
use crate::model::issue::{Issue, IssueId, IssueStatus};
use crate::model::member::MemberId;
use crate::repo::issue_repo::{IssueListQuery, IssueRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::{ErrorKind, STORAGE_FAILURE_MESSAGE};
use chrono::{Days, NaiveDate};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for circulation use-cases.
#[derive(Debug)]
pub enum CirculationError {
    BookNotFound(BookId),
    MemberNotFound(MemberId),
    IssueNotFound(IssueId),
    /// Book already has an unreturned issue.
    BookUnavailable(BookId),
    ReturnDateInPast {
        requested: NaiveDate,
        today: NaiveDate,
    },
    ReturnDateTooFar {
        requested: NaiveDate,
        latest: NaiveDate,
        max_loan_days: u32,
    },
    /// Issue is already returned and settled.
    IssueClosed(IssueId),
    /// Return already recorded; the fine must be settled instead.
    FinePending { issue_id: IssueId, fine_amount: u32 },
    Repo(RepoError),
}

impl CirculationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BookNotFound(_) | Self::MemberNotFound(_) | Self::IssueNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::BookUnavailable(_) | Self::IssueClosed(_) | Self::FinePending { .. } => {
                ErrorKind::InvalidState
            }
            Self::ReturnDateInPast { .. } | Self::ReturnDateTooFar { .. } => {
                ErrorKind::InvalidInput
            }
            Self::Repo(_) => ErrorKind::Storage,
        }
    }

    /// Human-readable message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::BookNotFound(_) | Self::MemberNotFound(_) => {
                "Book or member not found".to_string()
            }
            Self::IssueNotFound(_) => "Book issue record not found".to_string(),
            Self::BookUnavailable(_) => "Book is not available for issue".to_string(),
            Self::ReturnDateInPast { .. } => "Return date cannot be before today".to_string(),
            Self::ReturnDateTooFar { max_loan_days, .. } => {
                format!("Return date cannot be more than {max_loan_days} days from today")
            }
            Self::IssueClosed(_) => "This issue has already been closed".to_string(),
            Self::FinePending { fine_amount, .. } => {
                format!("A fine of {fine_amount} must be paid to complete this return")
            }
            Self::Repo(_) => STORAGE_FAILURE_MESSAGE.to_string(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::BookNotFound(_) => "book_not_found",
            Self::MemberNotFound(_) => "member_not_found",
            Self::IssueNotFound(_) => "issue_not_found",
            Self::BookUnavailable(_) => "book_unavailable",
            Self::ReturnDateInPast { .. } => "return_date_past",
            Self::ReturnDateTooFar { .. } => "return_date_too_far",
            Self::IssueClosed(_) => "issue_closed",
            Self::FinePending { .. } => "fine_pending",
            Self::Repo(_) => "storage",
        }
    }
}

impl Display for CirculationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::MemberNotFound(id) => write!(f, "member not found: {id}"),
            Self::IssueNotFound(id) => write!(f, "issue not found: {id}"),
            Self::BookUnavailable(id) => write!(f, "book is not available: {id}"),
            Self::ReturnDateInPast { requested, today } => {
                write!(f, "return date {requested} is before today ({today})")
            }
            Self::ReturnDateTooFar {
                requested, latest, ..
            } => write!(f, "return date {requested} is after the latest allowed {latest}"),
            Self::IssueClosed(id) => write!(f, "issue already closed: {id}"),
            Self::FinePending {
                issue_id,
                fine_amount,
            } => write!(f, "issue {issue_id} has an unpaid fine of {fine_amount}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CirculationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CirculationError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Result of recording a return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnOutcome {
    pub issue: Issue,
    /// Fine computed for this return; zero when on time.
    pub fine_amount: u32,
}

impl ReturnOutcome {
    /// Whether the return closed the issue without a pending fine.
    pub fn is_settled(&self) -> bool {
        self.issue.returned
    }
}

/// Circulation service facade over repository implementations.
pub struct CirculationService<R: IssueRepository, C: Clock> {
    repo: R,
    clock: C,
    policy: CirculationPolicy,
}

impl<R: IssueRepository, C: Clock> CirculationService<R, C> {
    pub fn new(repo: R, clock: C, policy: CirculationPolicy) -> Self {
        Self {
            repo,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &CirculationPolicy {
        &self.policy
    }

    /// Lends `book_id` to `member_id` until `return_date`.
    ///
    /// # Contract
    /// - Fails with `BookNotFound`/`MemberNotFound` before any other check.
    /// - Fails with `BookUnavailable` when the book is already issued.
    /// - `return_date` must lie in `[today, today + max_loan_days]`.
    /// - On success the book is unavailable and the issue is open.
    pub fn issue_book(
        &self,
        book_id: BookId,
        member_id: MemberId,
        return_date: NaiveDate,
        remarks: Option<String>,
    ) -> Result<Issue, CirculationError> {
        let result = self.try_issue_book(book_id, member_id, return_date, remarks);
        match &result {
            Ok(issue) => info!(
                "event=issue_book module=circulation status=ok issue_id={} book_id={} member_id={} return_date={}",
                issue.id, book_id, member_id, issue.return_date
            ),
            Err(err) => warn!(
                "event=issue_book module=circulation status=rejected book_id={} member_id={} error_code={}",
                book_id,
                member_id,
                err.code()
            ),
        }
        result
    }

    fn try_issue_book(
        &self,
        book_id: BookId,
        member_id: MemberId,
        return_date: NaiveDate,
        remarks: Option<String>,
    ) -> Result<Issue, CirculationError> {
        let book = self
            .repo
            .book(book_id)?
            .ok_or(CirculationError::BookNotFound(book_id))?;
        let member = self
            .repo
            .member(member_id)?
            .ok_or(CirculationError::MemberNotFound(member_id))?;

        if !book.available {
            return Err(CirculationError::BookUnavailable(book_id));
        }

        let today = self.clock.today();
        if return_date < today {
            return Err(CirculationError::ReturnDateInPast {
                requested: return_date,
                today,
            });
        }

        let latest = today
            .checked_add_days(Days::new(u64::from(self.policy.max_loan_days)))
            .unwrap_or(NaiveDate::MAX);
        if return_date > latest {
            return Err(CirculationError::ReturnDateTooFar {
                requested: return_date,
                latest,
                max_loan_days: self.policy.max_loan_days,
            });
        }

        let issue = Issue::new(&book, &member, self.clock.now(), return_date, remarks);
        self.repo.open_issue(&issue).map_err(|err| match err {
            RepoError::Conflict(_) => CirculationError::BookUnavailable(book_id),
            RepoError::NotFound { .. } => CirculationError::BookNotFound(book_id),
            other => CirculationError::Repo(other),
        })?;
        Ok(issue)
    }

    /// Records the physical return of an issued book on `actual_return_date`.
    ///
    /// # Contract
    /// - Fine is `max(0, actual - due)` whole days times the per-day rate.
    /// - Zero fine closes the issue and releases the book.
    /// - Positive fine leaves the issue open until [`Self::pay_fine`].
    pub fn return_book(
        &self,
        issue_id: IssueId,
        actual_return_date: NaiveDate,
    ) -> Result<ReturnOutcome, CirculationError> {
        let result = self.try_return_book(issue_id, actual_return_date);
        match &result {
            Ok(outcome) => info!(
                "event=return_book module=circulation status=ok issue_id={} fine_amount={} settled={}",
                issue_id,
                outcome.fine_amount,
                outcome.is_settled()
            ),
            Err(err) => warn!(
                "event=return_book module=circulation status=rejected issue_id={} error_code={}",
                issue_id,
                err.code()
            ),
        }
        result
    }

    fn try_return_book(
        &self,
        issue_id: IssueId,
        actual_return_date: NaiveDate,
    ) -> Result<ReturnOutcome, CirculationError> {
        let mut issue = self.require_issue(issue_id)?;
        match issue.status() {
            IssueStatus::Open => {}
            IssueStatus::PendingFine => {
                return Err(CirculationError::FinePending {
                    issue_id,
                    fine_amount: issue.fine_amount.unwrap_or_default(),
                });
            }
            IssueStatus::Closed => return Err(CirculationError::IssueClosed(issue_id)),
        }

        let fine_amount = self.policy.fine_for(issue.days_late(actual_return_date));
        issue.actual_return_date = Some(actual_return_date);
        issue.fine_amount = Some(fine_amount);
        if fine_amount == 0 {
            issue.returned = true;
            issue.fine_paid = Some(true);
        } else {
            issue.fine_paid = Some(false);
        }

        self.persist_transition(&issue)?;
        Ok(ReturnOutcome { issue, fine_amount })
    }

    /// Settles the outstanding fine in full and closes the issue.
    ///
    /// Accepted for any unreturned issue, with or without a recorded fine.
    pub fn pay_fine(&self, issue_id: IssueId) -> Result<Issue, CirculationError> {
        let result = self.try_pay_fine(issue_id);
        match &result {
            Ok(issue) => info!(
                "event=pay_fine module=circulation status=ok issue_id={} fine_amount={}",
                issue_id,
                issue.fine_amount.unwrap_or_default()
            ),
            Err(err) => warn!(
                "event=pay_fine module=circulation status=rejected issue_id={} error_code={}",
                issue_id,
                err.code()
            ),
        }
        result
    }

    fn try_pay_fine(&self, issue_id: IssueId) -> Result<Issue, CirculationError> {
        let mut issue = self.require_issue(issue_id)?;
        if issue.status() == IssueStatus::Closed {
            return Err(CirculationError::IssueClosed(issue_id));
        }

        issue.fine_paid = Some(true);
        issue.returned = true;

        self.persist_transition(&issue)?;
        Ok(issue)
    }

    pub fn get_issue(&self, id: IssueId) -> RepoResult<Option<Issue>> {
        self.repo.get_issue(id)
    }

    /// Returns the unreturned issue holding `book_id`, if any.
    pub fn active_issue_for_book(&self, book_id: BookId) -> RepoResult<Option<Issue>> {
        self.repo.find_open_issue_for_book(book_id)
    }

    pub fn list_issues(&self, query: &IssueListQuery) -> RepoResult<Vec<Issue>> {
        self.repo.list_issues(query)
    }

    fn require_issue(&self, issue_id: IssueId) -> Result<Issue, CirculationError> {
        self.repo
            .get_issue(issue_id)?
            .ok_or(CirculationError::IssueNotFound(issue_id))
    }

    fn persist_transition(&self, issue: &Issue) -> Result<(), CirculationError> {
        self.repo.update_open_issue(issue).map_err(|err| match err {
            RepoError::NotFound { .. } => CirculationError::IssueNotFound(issue.id),
            RepoError::Conflict(_) => CirculationError::IssueClosed(issue.id),
            other => CirculationError::Repo(other),
        })
    }
}
