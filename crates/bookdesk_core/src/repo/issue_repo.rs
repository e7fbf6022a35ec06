//! Circulation repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist issue records and their state changes.
//! - Keep book availability in lockstep with open issues.
//!
//! # Invariants
//! - `open_issue` inserts the issue and marks the book unavailable in one
//!   transaction (or inside the caller's); it fails if the book is already
//!   out.
//! - `update_open_issue` only touches unreturned issues. When the new state
//!   is returned, the book is released in the same transaction.
//! - At most one unreturned issue per book (partial unique index backstop).

use crate::model::book::{Book, BookId};
use crate::model::issue::{Issue, IssueId};
use crate::model::member::{Member, MemberId};
use crate::repo::book_repo::{book_exists, load_book, set_book_availability};
use crate::repo::member_repo::load_member;
use crate::repo::{
    bool_to_int, ensure_connection_ready, is_constraint_violation, parse_flag, parse_uuid,
    RepoError, RepoResult, WriteScope,
};
use log::warn;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const ISSUE_SELECT_SQL: &str = "SELECT
    uuid,
    book_uuid,
    book_title,
    book_author,
    member_uuid,
    member_name,
    issued_at,
    return_date,
    remarks,
    returned,
    actual_return_date,
    fine_amount,
    fine_paid
FROM issues";

/// Query options for listing issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueListQuery {
    /// Only unreturned issues (open or pending fine).
    pub open_only: bool,
    pub member_id: Option<MemberId>,
    pub limit: Option<u32>,
}

/// Repository interface for circulation operations.
pub trait IssueRepository {
    /// Reads the catalog item an issue would reference.
    fn book(&self, id: BookId) -> RepoResult<Option<Book>>;
    /// Reads the member an issue would reference.
    fn member(&self, id: MemberId) -> RepoResult<Option<Member>>;
    fn get_issue(&self, id: IssueId) -> RepoResult<Option<Issue>>;
    fn find_open_issue_for_book(&self, book_id: BookId) -> RepoResult<Option<Issue>>;
    /// Issues in creation order.
    fn list_issues(&self, query: &IssueListQuery) -> RepoResult<Vec<Issue>>;
    /// Inserts an open issue and checks its book out atomically.
    fn open_issue(&self, issue: &Issue) -> RepoResult<IssueId>;
    /// Persists return/fine state of a still-open issue.
    fn update_open_issue(&self, issue: &Issue) -> RepoResult<()>;
}

/// SQLite-backed circulation repository.
pub struct SqliteIssueRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIssueRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["books", "members", "issues"])?;
        Ok(Self { conn })
    }
}

impl IssueRepository for SqliteIssueRepository<'_> {
    fn book(&self, id: BookId) -> RepoResult<Option<Book>> {
        load_book(self.conn, id)
    }

    fn member(&self, id: MemberId) -> RepoResult<Option<Member>> {
        load_member(self.conn, id)
    }

    fn get_issue(&self, id: IssueId) -> RepoResult<Option<Issue>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ISSUE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_issue_row(row)?));
        }
        Ok(None)
    }

    fn find_open_issue_for_book(&self, book_id: BookId) -> RepoResult<Option<Issue>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ISSUE_SELECT_SQL}
             WHERE book_uuid = ?1
               AND returned = 0
             ORDER BY rowid ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([book_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_issue_row(row)?));
        }
        Ok(None)
    }

    fn list_issues(&self, query: &IssueListQuery) -> RepoResult<Vec<Issue>> {
        let mut sql = format!("{ISSUE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if query.open_only {
            sql.push_str(" AND returned = 0");
        }

        if let Some(member_id) = query.member_id {
            sql.push_str(" AND member_uuid = ?");
            bind_values.push(Value::Text(member_id.to_string()));
        }

        sql.push_str(" ORDER BY rowid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut issues = Vec::new();
        while let Some(row) = rows.next()? {
            issues.push(parse_issue_row(row)?);
        }
        Ok(issues)
    }

    fn open_issue(&self, issue: &Issue) -> RepoResult<IssueId> {
        issue.validate()?;
        if issue.returned {
            return Err(RepoError::InvalidData(
                "cannot open an issue that is already returned".to_string(),
            ));
        }

        let tx = WriteScope::begin(self.conn)?;

        if !set_book_availability(&tx, issue.book_id, false)? {
            if book_exists(&tx, issue.book_id)? {
                return Err(RepoError::Conflict(format!(
                    "book {} is already issued",
                    issue.book_id
                )));
            }
            return Err(RepoError::NotFound {
                entity: "book",
                id: issue.book_id,
            });
        }

        tx.execute(
            "INSERT INTO issues (
                uuid,
                book_uuid,
                book_title,
                book_author,
                member_uuid,
                member_name,
                issued_at,
                return_date,
                remarks,
                returned,
                actual_return_date,
                fine_amount,
                fine_paid
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, NULL, NULL, NULL);",
            params![
                issue.id.to_string(),
                issue.book_id.to_string(),
                issue.book_title.as_str(),
                issue.book_author.as_str(),
                issue.member_id.to_string(),
                issue.member_name.as_str(),
                issue.issued_at,
                issue.return_date,
                issue.remarks.as_deref(),
            ],
        )
        .map_err(|err| {
            if is_constraint_violation(&err) {
                RepoError::Conflict(format!(
                    "issue {} violates circulation constraints",
                    issue.id
                ))
            } else {
                err.into()
            }
        })?;

        tx.commit()?;
        Ok(issue.id)
    }

    fn update_open_issue(&self, issue: &Issue) -> RepoResult<()> {
        issue.validate()?;

        let tx = WriteScope::begin(self.conn)?;

        let changed = tx.execute(
            "UPDATE issues
             SET
                returned = ?2,
                actual_return_date = ?3,
                fine_amount = ?4,
                fine_paid = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND returned = 0;",
            params![
                issue.id.to_string(),
                bool_to_int(issue.returned),
                issue.actual_return_date,
                issue.fine_amount,
                issue.fine_paid.map(bool_to_int),
            ],
        )?;

        if changed == 0 {
            if issue_exists(&tx, issue.id)? {
                return Err(RepoError::Conflict(format!(
                    "issue {} is already closed",
                    issue.id
                )));
            }
            return Err(RepoError::NotFound {
                entity: "issue",
                id: issue.id,
            });
        }

        if issue.returned && !set_book_availability(&tx, issue.book_id, true)? {
            warn!(
                "event=book_release module=repo status=error issue_id={} book_id={} error_code=book_not_checked_out",
                issue.id, issue.book_id
            );
            return Err(RepoError::InvalidData(format!(
                "book {} referenced by issue {} was not checked out",
                issue.book_id, issue.id
            )));
        }

        tx.commit()?;
        Ok(())
    }
}

fn issue_exists(conn: &Connection, id: IssueId) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM issues WHERE uuid = ?1;",
            [id.to_string()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parse_issue_row(row: &Row<'_>) -> RepoResult<Issue> {
    let uuid_text: String = row.get("uuid")?;
    let book_uuid_text: String = row.get("book_uuid")?;
    let member_uuid_text: String = row.get("member_uuid")?;
    let fine_paid = match row.get::<_, Option<i64>>("fine_paid")? {
        Some(value) => Some(parse_flag(value, "issues.fine_paid")?),
        None => None,
    };

    let issue = Issue {
        id: parse_uuid(&uuid_text, "issues.uuid")?,
        book_id: parse_uuid(&book_uuid_text, "issues.book_uuid")?,
        book_title: row.get("book_title")?,
        book_author: row.get("book_author")?,
        member_id: parse_uuid(&member_uuid_text, "issues.member_uuid")?,
        member_name: row.get("member_name")?,
        issued_at: row.get("issued_at")?,
        return_date: row.get("return_date")?,
        remarks: row.get("remarks")?,
        returned: parse_flag(row.get("returned")?, "issues.returned")?,
        actual_return_date: row.get("actual_return_date")?,
        fine_amount: row.get("fine_amount")?,
        fine_paid,
    };
    issue.validate()?;
    Ok(issue)
}
