//! Demo dataset for smoke runs and UI prototyping.
//!
//! Seeding goes through the repositories so every invariant holds on the
//! seeded store: "1984" is checked out through a real open issue. The whole
//! dataset is written in one transaction; a failed seed leaves the store
//! unchanged.

use crate::clock::Clock;
use crate::model::book::{Book, BookId, MediaKind, NewBook};
use crate::model::issue::{Issue, IssueId};
use crate::model::member::{Member, MemberId, NewMember};
use crate::model::membership::MembershipTerm;
use crate::repo::book_repo::{BookRepository, SqliteBookRepository};
use crate::repo::issue_repo::{IssueRepository, SqliteIssueRepository};
use crate::repo::member_repo::{MemberRepository, SqliteMemberRepository};
use crate::repo::RepoResult;
use chrono::Days;
use log::{info, warn};
use rusqlite::Connection;

const DEMO_LOAN_DAYS: u64 = 15;

const DEMO_CATALOG: &[(MediaKind, &str, &str, &str, &str)] = &[
    (MediaKind::Book, "To Kill a Mockingbird", "Harper Lee", "BK001", "Fiction"),
    (MediaKind::Book, "1984", "George Orwell", "BK002", "Science Fiction"),
    (MediaKind::Movie, "The Shawshank Redemption", "Frank Darabont", "MV001", "Drama"),
    (MediaKind::Book, "Pride and Prejudice", "Jane Austen", "BK003", "Romance"),
    (MediaKind::Book, "The Great Gatsby", "F. Scott Fitzgerald", "BK004", "Fiction"),
];

/// Identifiers of the seeded records, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeededLibrary {
    pub book_ids: Vec<BookId>,
    pub member_ids: Vec<MemberId>,
    pub issue_ids: Vec<IssueId>,
}

/// Inserts the demo catalog, two members and one open issue.
///
/// All-or-nothing: seeding a store that already holds the demo roster fails
/// with `Conflict` and writes nothing.
pub fn seed_demo_library<C: Clock>(conn: &Connection, clock: &C) -> RepoResult<SeededLibrary> {
    let tx = conn.unchecked_transaction()?;
    let seeded = match seed_records(&tx, clock) {
        Ok(seeded) => seeded,
        Err(err) => {
            warn!("event=seed_demo module=seed status=rolled_back error={}", err);
            return Err(err);
        }
    };
    tx.commit()?;

    info!(
        "event=seed_demo module=seed status=ok books={} members={} issues={}",
        seeded.book_ids.len(),
        seeded.member_ids.len(),
        seeded.issue_ids.len()
    );
    Ok(seeded)
}

fn seed_records<C: Clock>(conn: &Connection, clock: &C) -> RepoResult<SeededLibrary> {
    let books = SqliteBookRepository::try_new(conn)?;
    let members = SqliteMemberRepository::try_new(conn)?;
    let issues = SqliteIssueRepository::try_new(conn)?;
    let mut seeded = SeededLibrary::default();

    let mut catalog = Vec::with_capacity(DEMO_CATALOG.len());
    for (kind, title, author, serial_number, category) in DEMO_CATALOG.iter().copied() {
        let book = Book::new(
            NewBook {
                kind,
                title: title.to_string(),
                author: author.to_string(),
                serial_number: serial_number.to_string(),
                category: category.to_string(),
            },
            clock.now(),
        );
        seeded.book_ids.push(books.create_book(&book)?);
        catalog.push(book);
    }

    let today = clock.today();
    let roster = [
        NewMember {
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            phone: "123-456-7890".to_string(),
            address: "123 Main St, Anytown".to_string(),
            membership_number: "MEM001".to_string(),
            membership_type: MembershipTerm::SixMonths,
        },
        NewMember {
            name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
            phone: "987-654-3210".to_string(),
            address: "456 Oak St, Somewhere".to_string(),
            membership_number: "MEM002".to_string(),
            membership_type: MembershipTerm::OneYear,
        },
    ];
    let mut roster_members = Vec::with_capacity(roster.len());
    for input in roster {
        let member = Member::new(input, today);
        seeded.member_ids.push(members.create_member(&member)?);
        roster_members.push(member);
    }

    if let (Some(book), Some(member)) = (catalog.get(1), roster_members.first()) {
        let due = today
            .checked_add_days(Days::new(DEMO_LOAN_DAYS))
            .unwrap_or(today);
        let issue = Issue::new(
            book,
            member,
            clock.now(),
            due,
            Some("First edition".to_string()),
        );
        seeded.issue_ids.push(issues.open_issue(&issue)?);
    }

    Ok(seeded)
}
