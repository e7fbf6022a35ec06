//! Catalog item model.
//!
//! # Responsibility
//! - Define the catalog record shared by books and movies.
//! - Provide creation and partial-update shapes for catalog writes.
//!
//! # Invariants
//! - `id` is stable and never reused.
//! - `available` is owned by circulation; catalog patches never touch it.

use crate::model::{require_text, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for catalog items.
pub type BookId = Uuid;

/// Physical media kind of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Book,
    Movie,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Movie => "movie",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "book" => Some(Self::Book),
            "movie" => Some(Self::Movie),
            _ => None,
        }
    }
}

/// Canonical catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    pub author: String,
    pub serial_number: String,
    pub category: String,
    /// False iff an unreturned issue references this item.
    pub available: bool,
    pub added_at: DateTime<Utc>,
}

/// Input for adding an item to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub kind: MediaKind,
    pub title: String,
    pub author: String,
    pub serial_number: String,
    pub category: String,
}

/// Partial update for catalog fields. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub kind: Option<MediaKind>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub serial_number: Option<String>,
    pub category: Option<String>,
}

impl Book {
    /// Creates an available catalog item with a generated stable ID.
    pub fn new(input: NewBook, added_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: input.kind,
            title: input.title.trim().to_string(),
            author: input.author.trim().to_string(),
            serial_number: input.serial_number.trim().to_string(),
            category: input.category.trim().to_string(),
            available: true,
            added_at,
        }
    }

    /// Applies a partial update in place. Availability is left untouched.
    pub fn apply_patch(&mut self, patch: BookPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(author) = patch.author {
            self.author = author.trim().to_string();
        }
        if let Some(serial_number) = patch.serial_number {
            self.serial_number = serial_number.trim().to_string();
        }
        if let Some(category) = patch.category {
            self.category = category.trim().to_string();
        }
    }

    /// Validates required catalog fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.title, "title")?;
        require_text(&self.author, "author")?;
        require_text(&self.serial_number, "serial number")?;
        require_text(&self.category, "category")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Book, BookPatch, MediaKind, NewBook};
    use crate::model::ValidationError;
    use chrono::Utc;

    fn sample() -> Book {
        Book::new(
            NewBook {
                kind: MediaKind::Book,
                title: "  Dune ".to_string(),
                author: "Frank Herbert".to_string(),
                serial_number: "BK010".to_string(),
                category: "Science Fiction".to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn new_book_is_available_and_trimmed() {
        let book = sample();
        assert!(book.available);
        assert_eq!(book.title, "Dune");
        assert!(!book.id.is_nil());
    }

    #[test]
    fn patch_keeps_unset_fields() {
        let mut book = sample();
        book.apply_patch(BookPatch {
            category: Some("Classics".to_string()),
            ..BookPatch::default()
        });
        assert_eq!(book.category, "Classics");
        assert_eq!(book.author, "Frank Herbert");
    }

    #[test]
    fn validate_rejects_blank_title() {
        let mut book = sample();
        book.title = "   ".to_string();
        assert_eq!(book.validate(), Err(ValidationError::BlankField("title")));
    }
}
