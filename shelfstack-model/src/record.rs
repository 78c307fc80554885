use serde::{Deserialize, Serialize};
use shelfstack_types::{AuthorId, BookId, CategoryId, CopyId};
use std::fmt;

/// An author of one or more books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub biography: String,
}

impl Author {
    /// Creates an unpersisted author; the store assigns the id on insert.
    #[must_use]
    pub fn new(name: impl Into<String>, biography: impl Into<String>) -> Self {
        Self {
            id: AuthorId::default(),
            name: name.into(),
            biography: biography.into(),
        }
    }
}

/// A node in the category tree.
///
/// `parent_id` of `None` marks a root category. The parent chain must stay
/// acyclic; the catalog validator rejects any re-parenting that would break
/// that before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub is_deleted: bool,
}

impl Category {
    /// Creates an unpersisted category under the given parent
    /// (`None` for a root).
    #[must_use]
    pub fn new(name: impl Into<String>, parent_id: Option<CategoryId>) -> Self {
        Self {
            id: CategoryId::default(),
            name: name.into(),
            parent_id,
            is_deleted: false,
        }
    }
}

/// A catalogued title, optionally filed under a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub isbn: String,
    pub category_id: Option<CategoryId>,
    pub is_deleted: bool,
}

impl Book {
    /// Creates an unpersisted book, uncategorized when `category_id` is
    /// `None`.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        isbn: impl Into<String>,
        category_id: Option<CategoryId>,
    ) -> Self {
        Self {
            id: BookId::default(),
            title: title.into(),
            isbn: isbn.into(),
            category_id,
            is_deleted: false,
        }
    }
}

/// One row of the book/author join. Inserting the same pair twice is a
/// no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookAuthorLink {
    pub book_id: BookId,
    pub author_id: AuthorId,
}

impl BookAuthorLink {
    #[must_use]
    pub const fn new(book_id: BookId, author_id: AuthorId) -> Self {
        Self { book_id, author_id }
    }
}

/// Circulation status of a physical copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStatus {
    /// On the shelf and available for loan.
    Available,
    /// Checked out to a patron.
    Borrowed,
}

/// A physical copy of a book, labelled with a human-readable shelf id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookCopy {
    pub id: CopyId,
    pub book_id: BookId,
    pub physical_id: String,
    pub status: CopyStatus,
}

impl BookCopy {
    /// Creates an unpersisted copy, available by default.
    #[must_use]
    pub fn new(book_id: BookId, physical_id: impl Into<String>) -> Self {
        Self {
            id: CopyId::default(),
            book_id,
            physical_id: physical_id.into(),
            status: CopyStatus::Available,
        }
    }

    /// Returns a copy of this record with the given status.
    #[must_use]
    pub fn with_status(mut self, status: CopyStatus) -> Self {
        self.status = status;
        self
    }
}

/// Identifies one of the six stores a mutation can touch.
///
/// The audit log names tables with the `as_str` form, and the store keys its
/// change notifications on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Authors,
    Categories,
    Books,
    BookAuthors,
    BookCopies,
    AuditLog,
}

impl Table {
    /// The table's persisted name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Table::Authors => "authors",
            Table::Categories => "categories",
            Table::Books => "books",
            Table::BookAuthors => "book_authors",
            Table::BookCopies => "book_copies",
            Table::AuditLog => "audit_logs",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
