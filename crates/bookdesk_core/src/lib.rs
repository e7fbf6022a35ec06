//! Core domain logic for the bookdesk library system.
//! This crate is the single source of truth for circulation invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CirculationPolicy, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig};
pub use model::book::{Book, BookId, BookPatch, MediaKind, NewBook};
pub use model::issue::{Issue, IssueId, IssueStatus};
pub use model::member::{Member, MemberId, MemberPatch, NewMember};
pub use model::membership::{calculate_membership_end_date, MembershipTerm};
pub use model::ValidationError;
pub use repo::book_repo::{BookRepository, BookSearchQuery, SqliteBookRepository};
pub use repo::issue_repo::{IssueListQuery, IssueRepository, SqliteIssueRepository};
pub use repo::member_repo::{MemberRepository, SqliteMemberRepository};
pub use repo::{RepoError, RepoResult};
pub use seed::{seed_demo_library, SeededLibrary};
pub use service::catalog_service::{CatalogError, CatalogService};
pub use service::circulation_service::{CirculationError, CirculationService, ReturnOutcome};
pub use service::membership_service::{MembershipError, MembershipService};
pub use service::report_service::{
    CatalogReport, DashboardSummary, ReportService, DEFAULT_RECENT_ISSUES,
};
pub use service::ErrorKind;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
