//! Member repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `membership_number` uniqueness is enforced by storage and surfaced as
//!   `RepoError::Conflict`.

use crate::model::member::{Member, MemberId};
use crate::model::membership::MembershipTerm;
use crate::repo::{
    bool_to_int, ensure_connection_ready, is_constraint_violation, parse_flag, parse_uuid,
    RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const MEMBER_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    email,
    phone,
    address,
    membership_number,
    membership_start,
    membership_end,
    membership_type,
    active
FROM members";

/// Repository interface for member operations.
pub trait MemberRepository {
    fn create_member(&self, member: &Member) -> RepoResult<MemberId>;
    /// Replaces every mutable member field by id.
    fn update_member(&self, member: &Member) -> RepoResult<()>;
    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>>;
    fn find_member_by_number(&self, membership_number: &str) -> RepoResult<Option<Member>>;
    /// All members in registration order.
    fn list_members(&self) -> RepoResult<Vec<Member>>;
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["members"])?;
        Ok(Self { conn })
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn create_member(&self, member: &Member) -> RepoResult<MemberId> {
        member.validate()?;

        self.conn
            .execute(
                "INSERT INTO members (
                    uuid,
                    name,
                    email,
                    phone,
                    address,
                    membership_number,
                    membership_start,
                    membership_end,
                    membership_type,
                    active
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    member.id.to_string(),
                    member.name.as_str(),
                    member.email.as_str(),
                    member.phone.as_str(),
                    member.address.as_str(),
                    member.membership_number.as_str(),
                    member.membership_start,
                    member.membership_end,
                    member.membership_type.as_str(),
                    bool_to_int(member.active),
                ],
            )
            .map_err(|err| {
                if is_constraint_violation(&err) {
                    RepoError::Conflict(format!(
                        "membership number `{}` is already registered",
                        member.membership_number
                    ))
                } else {
                    err.into()
                }
            })?;

        Ok(member.id)
    }

    fn update_member(&self, member: &Member) -> RepoResult<()> {
        member.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE members
                 SET
                    name = ?2,
                    email = ?3,
                    phone = ?4,
                    address = ?5,
                    membership_number = ?6,
                    membership_start = ?7,
                    membership_end = ?8,
                    membership_type = ?9,
                    active = ?10,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![
                    member.id.to_string(),
                    member.name.as_str(),
                    member.email.as_str(),
                    member.phone.as_str(),
                    member.address.as_str(),
                    member.membership_number.as_str(),
                    member.membership_start,
                    member.membership_end,
                    member.membership_type.as_str(),
                    bool_to_int(member.active),
                ],
            )
            .map_err(|err| {
                if is_constraint_violation(&err) {
                    RepoError::Conflict(format!(
                        "membership number `{}` is already registered",
                        member.membership_number
                    ))
                } else {
                    err.into()
                }
            })?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "member",
                id: member.id,
            });
        }

        Ok(())
    }

    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>> {
        load_member(self.conn, id)
    }

    fn find_member_by_number(&self, membership_number: &str) -> RepoResult<Option<Member>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBER_SELECT_SQL} WHERE membership_number = ?1;"
        ))?;
        let mut rows = stmt.query([membership_number.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_member_row(row)?));
        }
        Ok(None)
    }

    fn list_members(&self) -> RepoResult<Vec<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }
}

pub(crate) fn load_member(conn: &Connection, id: MemberId) -> RepoResult<Option<Member>> {
    let mut stmt = conn.prepare(&format!("{MEMBER_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_member_row(row)?));
    }
    Ok(None)
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    let uuid_text: String = row.get("uuid")?;
    let type_text: String = row.get("membership_type")?;
    let membership_type = MembershipTerm::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid membership type `{type_text}` in members.membership_type"
        ))
    })?;

    let member = Member {
        id: parse_uuid(&uuid_text, "members.uuid")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        address: row.get("address")?,
        membership_number: row.get("membership_number")?,
        membership_start: row.get("membership_start")?,
        membership_end: row.get("membership_end")?,
        membership_type,
        active: parse_flag(row.get("active")?, "members.active")?,
    };
    member.validate()?;
    Ok(member)
}
