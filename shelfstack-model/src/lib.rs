//! Catalog record model for ShelfStack.
//!
//! Defines the record types the store persists and the core mutates:
//! - [`Author`], [`Category`], [`Book`], [`BookCopy`] — the catalog records
//! - [`BookAuthorLink`] — the many-to-many book/author join
//! - [`AuditLogEntry`] — the append-only before/after trail of every write
//! - [`Table`] — the table tag used for audit naming and change notification
//!
//! Categories form a tree via `parent_id`; categories and books are soft
//! deleted (`is_deleted` flips, rows persist) so the audit trail stays
//! meaningful. These types are consumed by the store, the catalog core, and
//! (as JSON) the presentation layer.

mod audit;
mod record;

pub use audit::{AuditAction, AuditLogEntry};
pub use record::{Author, Book, BookAuthorLink, BookCopy, Category, CopyStatus, Table};
