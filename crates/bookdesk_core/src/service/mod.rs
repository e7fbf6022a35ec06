//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Report failures as typed errors with a user-facing message, leaving
//!   presentation to the caller.

pub mod catalog_service;
pub mod circulation_service;
pub mod membership_service;
pub mod report_service;

/// Failure taxonomy shared by every service error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Referenced book, member or issue does not exist.
    NotFound,
    /// Operation is not allowed in the record's current state.
    InvalidState,
    /// Caller input is outside the accepted range or malformed.
    InvalidInput,
    /// Write collides with an existing unique value.
    Conflict,
    /// Store failure. Not caused by caller input.
    Storage,
}

pub(crate) const STORAGE_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";
