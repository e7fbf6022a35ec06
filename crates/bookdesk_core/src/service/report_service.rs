//! Read-only reporting over catalog, members and circulation.
//!
//! # Responsibility
//! - Aggregate catalog availability and category counts.
//! - Summarize circulation activity for the dashboard view.

use crate::clock::Clock;
use crate::model::issue::{Issue, IssueStatus};
use crate::repo::book_repo::{BookRepository, BookSearchQuery};
use crate::repo::issue_repo::{IssueListQuery, IssueRepository};
use crate::repo::member_repo::MemberRepository;
use crate::repo::RepoResult;
use std::collections::BTreeMap;

/// Default number of open issues shown on the dashboard.
pub const DEFAULT_RECENT_ISSUES: usize = 5;

/// Catalog availability statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogReport {
    pub total: usize,
    pub available: usize,
    pub unavailable: usize,
    /// Item count per category, sorted by category name.
    pub by_category: BTreeMap<String, usize>,
}

/// Dashboard overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_books: usize,
    pub available_books: usize,
    pub total_members: usize,
    pub active_members: usize,
    /// Unreturned issues, including those awaiting fine settlement.
    pub active_issues: usize,
    /// Sum of recorded fines not yet paid.
    pub outstanding_fines: u64,
    /// First unreturned issues in creation order.
    pub recent_issues: Vec<Issue>,
}

/// Report service facade over repository implementations.
pub struct ReportService<B, M, I, C>
where
    B: BookRepository,
    M: MemberRepository,
    I: IssueRepository,
    C: Clock,
{
    books: B,
    members: M,
    issues: I,
    clock: C,
}

impl<B, M, I, C> ReportService<B, M, I, C>
where
    B: BookRepository,
    M: MemberRepository,
    I: IssueRepository,
    C: Clock,
{
    pub fn new(books: B, members: M, issues: I, clock: C) -> Self {
        Self {
            books,
            members,
            issues,
            clock,
        }
    }

    pub fn catalog_report(&self) -> RepoResult<CatalogReport> {
        let books = self.books.search_books(&BookSearchQuery::default())?;
        let mut report = CatalogReport {
            total: books.len(),
            ..CatalogReport::default()
        };
        for book in &books {
            if book.available {
                report.available += 1;
            }
            *report.by_category.entry(book.category.clone()).or_insert(0) += 1;
        }
        report.unavailable = report.total - report.available;
        Ok(report)
    }

    /// Builds the dashboard overview with up to `recent_limit` open issues.
    pub fn dashboard_summary(&self, recent_limit: usize) -> RepoResult<DashboardSummary> {
        let catalog = self.catalog_report()?;
        let today = self.clock.today();
        let members = self.members.list_members()?;
        let open_issues = self.issues.list_issues(&IssueListQuery {
            open_only: true,
            ..IssueListQuery::default()
        })?;

        let outstanding_fines = open_issues
            .iter()
            .filter(|issue| issue.status() == IssueStatus::PendingFine)
            .map(|issue| u64::from(issue.fine_amount.unwrap_or_default()))
            .sum();

        Ok(DashboardSummary {
            total_books: catalog.total,
            available_books: catalog.available,
            total_members: members.len(),
            active_members: members
                .iter()
                .filter(|member| member.is_in_good_standing(today))
                .count(),
            active_issues: open_issues.len(),
            outstanding_fines,
            recent_issues: open_issues.into_iter().take(recent_limit).collect(),
        })
    }

    /// Unreturned issues whose due date is before today, most overdue first.
    pub fn overdue_issues(&self) -> RepoResult<Vec<Issue>> {
        let today = self.clock.today();
        let mut overdue = self
            .issues
            .list_issues(&IssueListQuery {
                open_only: true,
                ..IssueListQuery::default()
            })?
            .into_iter()
            .filter(|issue| issue.status() == IssueStatus::Open && issue.return_date < today)
            .collect::<Vec<_>>();
        overdue.sort_by_key(|issue| issue.return_date);
        Ok(overdue)
    }
}
