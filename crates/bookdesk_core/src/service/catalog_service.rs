//! Catalog use-case service.
//!
//! # Responsibility
//! - Add and edit catalog items.
//! - Expose lookup and search entry points for callers.
//!
//! # Invariants
//! - Catalog edits never change availability.

use crate::clock::Clock;
use crate::model::book::{Book, BookId, BookPatch, NewBook};
use crate::model::ValidationError;
use crate::repo::book_repo::{BookRepository, BookSearchQuery};
use crate::repo::{RepoError, RepoResult};
use crate::service::{ErrorKind, STORAGE_FAILURE_MESSAGE};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for catalog use-cases.
#[derive(Debug)]
pub enum CatalogError {
    BookNotFound(BookId),
    Invalid(ValidationError),
    Repo(RepoError),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BookNotFound(_) => ErrorKind::NotFound,
            Self::Invalid(_) => ErrorKind::InvalidInput,
            Self::Repo(_) => ErrorKind::Storage,
        }
    }

    /// Human-readable message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::BookNotFound(_) => "Book not found".to_string(),
            Self::Invalid(err) => capitalize(&err.to_string()),
            Self::Repo(_) => STORAGE_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::BookNotFound(_) => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { id, .. } => Self::BookNotFound(id),
            RepoError::Validation(err) => Self::Invalid(err),
            other => Self::Repo(other),
        }
    }
}

/// Catalog service facade over repository implementations.
pub struct CatalogService<R: BookRepository, C: Clock> {
    repo: R,
    clock: C,
}

impl<R: BookRepository, C: Clock> CatalogService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Adds an available item stamped with the current instant.
    pub fn add_book(&self, input: NewBook) -> Result<Book, CatalogError> {
        let book = Book::new(input, self.clock.now());
        if let Err(err) = book.validate() {
            warn!(
                "event=add_book module=catalog status=rejected error_code=validation error={}",
                err
            );
            return Err(CatalogError::Invalid(err));
        }

        self.repo.create_book(&book)?;
        info!(
            "event=add_book module=catalog status=ok book_id={} kind={}",
            book.id,
            book.kind.as_str()
        );
        Ok(book)
    }

    /// Applies a partial update and returns the stored record.
    pub fn update_book(&self, id: BookId, patch: BookPatch) -> Result<Book, CatalogError> {
        let mut book = self
            .repo
            .get_book(id)?
            .ok_or(CatalogError::BookNotFound(id))?;
        book.apply_patch(patch);
        book.validate().map_err(CatalogError::Invalid)?;

        self.repo.update_book(&book)?;
        info!("event=update_book module=catalog status=ok book_id={}", id);
        Ok(book)
    }

    pub fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        self.repo.get_book(id)
    }

    pub fn find_book_by_title(&self, title: &str) -> RepoResult<Option<Book>> {
        self.repo.find_book_by_title(title)
    }

    /// Searches the catalog. An empty query lists everything.
    pub fn search_books(&self, query: &BookSearchQuery) -> RepoResult<Vec<Book>> {
        self.repo.search_books(query)
    }

    pub fn list_categories(&self) -> RepoResult<Vec<String>> {
        self.repo.list_categories()
    }
}

pub(crate) fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
