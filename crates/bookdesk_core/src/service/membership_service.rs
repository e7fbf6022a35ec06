//! Membership use-case service.
//!
//! # Responsibility
//! - Register members and maintain their contact details.
//! - Extend or cancel memberships by membership number.
//!
//! # Invariants
//! - New memberships start today; extensions apply to the current end date.
//! - Membership numbers stay unique.

use crate::clock::Clock;
use crate::model::member::{Member, MemberId, MemberPatch, NewMember};
use crate::model::membership::MembershipTerm;
use crate::model::ValidationError;
use crate::repo::member_repo::MemberRepository;
use crate::repo::{RepoError, RepoResult};
use crate::service::catalog_service::capitalize;
use crate::service::{ErrorKind, STORAGE_FAILURE_MESSAGE};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for membership use-cases.
#[derive(Debug)]
pub enum MembershipError {
    MemberNotFound(MemberId),
    UnknownMembershipNumber(String),
    DuplicateMembershipNumber(String),
    Invalid(ValidationError),
    Repo(RepoError),
}

impl MembershipError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MemberNotFound(_) | Self::UnknownMembershipNumber(_) => ErrorKind::NotFound,
            Self::DuplicateMembershipNumber(_) => ErrorKind::Conflict,
            Self::Invalid(_) => ErrorKind::InvalidInput,
            Self::Repo(_) => ErrorKind::Storage,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::MemberNotFound(_) => "Member not found".to_string(),
            Self::UnknownMembershipNumber(_) => {
                "No member found with this membership number".to_string()
            }
            Self::DuplicateMembershipNumber(number) => {
                format!("Membership number {number} is already in use")
            }
            Self::Invalid(err) => capitalize(&err.to_string()),
            Self::Repo(_) => STORAGE_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl Display for MembershipError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemberNotFound(id) => write!(f, "member not found: {id}"),
            Self::UnknownMembershipNumber(number) => {
                write!(f, "unknown membership number `{number}`")
            }
            Self::DuplicateMembershipNumber(number) => {
                write!(f, "membership number `{number}` is already registered")
            }
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MembershipError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MembershipError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { id, .. } => Self::MemberNotFound(id),
            RepoError::Validation(err) => Self::Invalid(err),
            other => Self::Repo(other),
        }
    }
}

/// Membership service facade over repository implementations.
pub struct MembershipService<R: MemberRepository, C: Clock> {
    repo: R,
    clock: C,
}

impl<R: MemberRepository, C: Clock> MembershipService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Registers an active member whose term starts today.
    pub fn add_member(&self, input: NewMember) -> Result<Member, MembershipError> {
        let member = Member::new(input, self.clock.today());
        member.validate().map_err(MembershipError::Invalid)?;

        if self
            .repo
            .find_member_by_number(&member.membership_number)?
            .is_some()
        {
            warn!(
                "event=add_member module=membership status=rejected error_code=duplicate_number"
            );
            return Err(MembershipError::DuplicateMembershipNumber(
                member.membership_number,
            ));
        }

        self.repo
            .create_member(&member)
            .map_err(|err| duplicate_or(err, &member.membership_number))?;
        info!(
            "event=add_member module=membership status=ok member_id={} term={}",
            member.id,
            member.membership_type.as_str()
        );
        Ok(member)
    }

    /// Updates contact fields. Membership dates and status are untouched.
    pub fn update_member(
        &self,
        id: MemberId,
        patch: MemberPatch,
    ) -> Result<Member, MembershipError> {
        let mut member = self
            .repo
            .get_member(id)?
            .ok_or(MembershipError::MemberNotFound(id))?;
        member.apply_patch(patch);
        member.validate().map_err(MembershipError::Invalid)?;

        self.repo.update_member(&member)?;
        info!(
            "event=update_member module=membership status=ok member_id={}",
            id
        );
        Ok(member)
    }

    /// Extends a membership by `term`, counted from its current end date.
    ///
    /// The active flag is left as is.
    pub fn extend_membership(
        &self,
        membership_number: &str,
        term: MembershipTerm,
    ) -> Result<Member, MembershipError> {
        let mut member = self.require_by_number(membership_number)?;
        member.extend(term);

        self.repo.update_member(&member)?;
        info!(
            "event=extend_membership module=membership status=ok member_id={} term={} end={}",
            member.id,
            term.as_str(),
            member.membership_end
        );
        Ok(member)
    }

    /// Marks a membership inactive. Dates are kept for history.
    pub fn cancel_membership(&self, membership_number: &str) -> Result<Member, MembershipError> {
        let mut member = self.require_by_number(membership_number)?;
        member.active = false;

        self.repo.update_member(&member)?;
        info!(
            "event=cancel_membership module=membership status=ok member_id={}",
            member.id
        );
        Ok(member)
    }

    pub fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>> {
        self.repo.get_member(id)
    }

    pub fn find_member_by_number(&self, membership_number: &str) -> RepoResult<Option<Member>> {
        self.repo.find_member_by_number(membership_number)
    }

    pub fn list_members(&self) -> RepoResult<Vec<Member>> {
        self.repo.list_members()
    }

    fn require_by_number(&self, membership_number: &str) -> Result<Member, MembershipError> {
        let trimmed = membership_number.trim();
        self.repo
            .find_member_by_number(trimmed)?
            .ok_or_else(|| MembershipError::UnknownMembershipNumber(trimmed.to_string()))
    }
}

fn duplicate_or(err: RepoError, membership_number: &str) -> MembershipError {
    match err {
        RepoError::Conflict(_) => {
            MembershipError::DuplicateMembershipNumber(membership_number.to_string())
        }
        other => other.into(),
    }
}
