//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `bookdesk_core` linkage and store bootstrap.
//! - Seed the demo library and walk one issue → late return → settlement
//!   cycle, printing each step.
//!
//! Set `BOOKDESK_LOG_DIR` (absolute path) to enable file logging and
//! `BOOKDESK_LOG_LEVEL` to override the default level.

use bookdesk_core::db::open_db_in_memory;
use bookdesk_core::{
    init_logging, seed_demo_library, CatalogService, CirculationPolicy, CirculationService, Clock,
    LogConfig, MembershipService, ReportService, SqliteBookRepository, SqliteIssueRepository,
    SqliteMemberRepository, SystemClock, DEFAULT_RECENT_ISSUES,
};
use chrono::Days;
use log::info;
use std::error::Error;
use std::process::ExitCode;

const DEMO_TITLE: &str = "The Great Gatsby";
const DEMO_MEMBERSHIP_NUMBER: &str = "MEM002";
const DEMO_LOAN_DAYS: u64 = 10;
const DEMO_DAYS_LATE: u64 = 3;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("bookdesk: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    println!("bookdesk_core ping={}", bookdesk_core::ping());
    println!("bookdesk_core version={}", bookdesk_core::core_version());

    if let Some(mut config) = LogConfig::from_env() {
        config.echo_to_stderr = true;
        init_logging(&config)?;
    }

    let conn = open_db_in_memory()?;
    let clock = SystemClock;
    let seeded = seed_demo_library(&conn, &clock)?;
    info!(
        "event=cli_demo module=cli status=start books={}",
        seeded.book_ids.len()
    );

    let reports = ReportService::new(
        SqliteBookRepository::try_new(&conn)?,
        SqliteMemberRepository::try_new(&conn)?,
        SqliteIssueRepository::try_new(&conn)?,
        clock,
    );
    let summary = reports.dashboard_summary(DEFAULT_RECENT_ISSUES)?;
    println!(
        "dashboard books={} available={} members={} active_issues={}",
        summary.total_books, summary.available_books, summary.total_members, summary.active_issues
    );

    let catalog = CatalogService::new(SqliteBookRepository::try_new(&conn)?, clock);
    let membership = MembershipService::new(SqliteMemberRepository::try_new(&conn)?, clock);
    let circulation = CirculationService::new(
        SqliteIssueRepository::try_new(&conn)?,
        clock,
        CirculationPolicy::default(),
    );
    let policy = circulation.policy();
    println!(
        "policy fine_per_day={} max_loan_days={}",
        policy.fine_per_day, policy.max_loan_days
    );

    let book = catalog
        .find_book_by_title(DEMO_TITLE)?
        .ok_or("demo title missing from seeded catalog")?;
    let member = membership
        .find_member_by_number(DEMO_MEMBERSHIP_NUMBER)?
        .ok_or("demo member missing from seeded roster")?;

    let due = clock
        .today()
        .checked_add_days(Days::new(DEMO_LOAN_DAYS))
        .ok_or("due date out of range")?;
    let issue = circulation.issue_book(book.id, member.id, due, None)?;
    println!(
        "issued \"{}\" to {} due={}",
        issue.book_title, issue.member_name, issue.return_date
    );

    let late_return = due
        .checked_add_days(Days::new(DEMO_DAYS_LATE))
        .ok_or("return date out of range")?;
    let outcome = circulation.return_book(issue.id, late_return)?;
    println!(
        "returned on {} fine={} settled={}",
        late_return,
        outcome.fine_amount,
        outcome.is_settled()
    );

    let closed = circulation.pay_fine(issue.id)?;
    println!(
        "fine paid={} returned={}",
        closed.fine_paid.unwrap_or(false),
        closed.returned
    );

    let report = reports.catalog_report()?;
    println!(
        "catalog total={} available={} unavailable={}",
        report.total, report.available, report.unavailable
    );
    for (category, count) in &report.by_category {
        println!("  {category}: {count}");
    }

    Ok(())
}
