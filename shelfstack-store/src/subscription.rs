//! Watch-channel subscription registry.
//!
//! Each live read is one `watch` channel carrying the full result set of a
//! store query. The store re-evaluates every registered query after a write
//! to its table and pushes the fresh result; senders whose receivers are all
//! gone are pruned on the same pass.

use shelfstack_model::{AuditLogEntry, Author, Book, BookCopy, Category};
use shelfstack_types::{BookId, CategoryId};
use std::collections::HashSet;
use tokio::sync::watch;

/// A live book query: all non-deleted books, optionally restricted to a
/// category id set.
pub(crate) struct BookWatcher {
    pub(crate) category_ids: Option<HashSet<CategoryId>>,
    pub(crate) tx: watch::Sender<Vec<Book>>,
}

/// A live query over the copies of one book.
pub(crate) struct CopyWatcher {
    pub(crate) book_id: BookId,
    pub(crate) tx: watch::Sender<Vec<BookCopy>>,
}

/// All registered subscriptions, grouped by the table they read.
#[derive(Default)]
pub(crate) struct Watchers {
    pub(crate) authors: Vec<watch::Sender<Vec<Author>>>,
    pub(crate) categories: Vec<watch::Sender<Vec<Category>>>,
    pub(crate) books: Vec<BookWatcher>,
    pub(crate) copies: Vec<CopyWatcher>,
    pub(crate) audit: Vec<watch::Sender<Vec<AuditLogEntry>>>,
}
