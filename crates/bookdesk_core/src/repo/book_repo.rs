//! Catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/update/lookup/search APIs over the `books` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `update_book` never writes `available`; circulation owns that flag.
//! - Listing order is insertion order.
//! - Title and author matching folds case with Unicode rules.

use crate::model::book::{Book, BookId, MediaKind};
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_flag, parse_uuid, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const BOOK_SELECT_SQL: &str = "SELECT
    uuid,
    kind,
    title,
    author,
    serial_number,
    category,
    available,
    added_at
FROM books";

/// Catalog search filters. Empty or blank filters are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookSearchQuery {
    /// Case-insensitive (Unicode) substring match on title.
    pub title: Option<String>,
    /// Case-insensitive (Unicode) substring match on author.
    pub author: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Restrict to items that can be issued right now.
    pub available_only: bool,
}

/// Repository interface for catalog operations.
pub trait BookRepository {
    fn create_book(&self, book: &Book) -> RepoResult<BookId>;
    /// Replaces catalog fields by id. Leaves availability untouched.
    fn update_book(&self, book: &Book) -> RepoResult<()>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    /// Case-insensitive exact title match; first inserted wins on duplicates.
    fn find_book_by_title(&self, title: &str) -> RepoResult<Option<Book>>;
    fn search_books(&self, query: &BookSearchQuery) -> RepoResult<Vec<Book>>;
    /// Distinct categories sorted by name.
    fn list_categories(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed catalog repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["books"])?;
        Ok(Self { conn })
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn create_book(&self, book: &Book) -> RepoResult<BookId> {
        book.validate()?;

        self.conn.execute(
            "INSERT INTO books (
                uuid,
                kind,
                title,
                author,
                serial_number,
                category,
                available,
                added_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                book.id.to_string(),
                book.kind.as_str(),
                book.title.as_str(),
                book.author.as_str(),
                book.serial_number.as_str(),
                book.category.as_str(),
                bool_to_int(book.available),
                book.added_at,
            ],
        )?;

        Ok(book.id)
    }

    fn update_book(&self, book: &Book) -> RepoResult<()> {
        book.validate()?;

        let changed = self.conn.execute(
            "UPDATE books
             SET
                kind = ?2,
                title = ?3,
                author = ?4,
                serial_number = ?5,
                category = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                book.id.to_string(),
                book.kind.as_str(),
                book.title.as_str(),
                book.author.as_str(),
                book.serial_number.as_str(),
                book.category.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "book",
                id: book.id,
            });
        }

        Ok(())
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        load_book(self.conn, id)
    }

    fn find_book_by_title(&self, title: &str) -> RepoResult<Option<Book>> {
        let Some(needle) = folded(Some(title)) else {
            return Ok(None);
        };

        let mut stmt = self
            .conn
            .prepare(&format!("{BOOK_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let book = parse_book_row(row)?;
            if book.title.to_lowercase() == needle {
                return Ok(Some(book));
            }
        }

        Ok(None)
    }

    fn search_books(&self, query: &BookSearchQuery) -> RepoResult<Vec<Book>> {
        let mut sql = format!("{BOOK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(category) = non_blank(query.category.as_deref()) {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.to_string()));
        }

        if query.available_only {
            sql.push_str(" AND available = 1");
        }

        sql.push_str(" ORDER BY rowid ASC");

        // SQLite lower() is ASCII-only, so text filters run here.
        let title = folded(query.title.as_deref());
        let author = folded(query.author.as_deref());

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            let book = parse_book_row(row)?;
            if contains_folded(&book.title, title.as_deref())
                && contains_folded(&book.author, author.as_deref())
            {
                books.push(book);
            }
        }

        Ok(books)
    }

    fn list_categories(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT category FROM books ORDER BY category ASC;")?;
        let categories = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }
}

pub(crate) fn load_book(conn: &Connection, id: BookId) -> RepoResult<Option<Book>> {
    let mut stmt = conn.prepare(&format!("{BOOK_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_book_row(row)?));
    }
    Ok(None)
}

/// Flips availability when it currently equals `!available`.
///
/// Returns `false` when the book is missing or already in the target state.
pub(crate) fn set_book_availability(
    conn: &Connection,
    id: BookId,
    available: bool,
) -> RepoResult<bool> {
    let changed = conn.execute(
        "UPDATE books
         SET
            available = ?2,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?1
           AND available = ?3;",
        params![
            id.to_string(),
            bool_to_int(available),
            bool_to_int(!available)
        ],
    )?;
    Ok(changed == 1)
}

pub(crate) fn book_exists(conn: &Connection, id: BookId) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM books WHERE uuid = ?1;",
            [id.to_string()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let uuid_text: String = row.get("uuid")?;
    let kind_text: String = row.get("kind")?;
    let kind = MediaKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid media kind `{kind_text}` in books.kind"))
    })?;

    let book = Book {
        id: parse_uuid(&uuid_text, "books.uuid")?,
        kind,
        title: row.get("title")?,
        author: row.get("author")?,
        serial_number: row.get("serial_number")?,
        category: row.get("category")?,
        available: parse_flag(row.get("available")?, "books.available")?,
        added_at: row.get("added_at")?,
    };
    book.validate()?;
    Ok(book)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn folded(value: Option<&str>) -> Option<String> {
    non_blank(value).map(str::to_lowercase)
}

fn contains_folded(haystack: &str, needle: Option<&str>) -> bool {
    needle.map_or(true, |needle| haystack.to_lowercase().contains(needle))
}
