use crate::error::{StoreError, StoreResult};
use crate::subscription::{BookWatcher, CopyWatcher, Watchers};
use shelfstack_model::{
    AuditLogEntry, Author, Book, BookAuthorLink, BookCopy, Category, CopyStatus, Table,
};
use shelfstack_types::{AuditEntryId, AuthorId, BookId, CategoryId, CopyId};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tokio::sync::{RwLock, watch};
use tracing::debug;

/// The in-memory record store.
///
/// Owns the six catalog tables behind one async read/write lock. Inserts
/// assign the next id from a per-table counter and return it; updates
/// replace the row keyed by id and fail with [`StoreError::NotFound`] when
/// the id has no row. Copy and link inserts verify their referenced rows
/// exist, the way a relational backend's foreign keys would.
///
/// Construct one with [`LibraryStore::new`] and share it via `Arc`.
pub struct LibraryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    authors: BTreeMap<AuthorId, Author>,
    categories: BTreeMap<CategoryId, Category>,
    books: BTreeMap<BookId, Book>,
    book_authors: BTreeSet<BookAuthorLink>,
    copies: BTreeMap<CopyId, BookCopy>,
    audit_log: Vec<AuditLogEntry>,
    next_author_id: i64,
    next_category_id: i64,
    next_book_id: i64,
    next_copy_id: i64,
    next_audit_id: i64,
    watchers: Watchers,
}

impl LibraryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    // ── Authors ──────────────────────────────────────────────────

    /// Inserts an author and returns its assigned id.
    pub async fn insert_author(&self, mut author: Author) -> StoreResult<AuthorId> {
        let mut inner = self.inner.write().await;
        inner.next_author_id += 1;
        let id = AuthorId::from_raw(inner.next_author_id);
        author.id = id;
        inner.authors.insert(id, author);
        debug!("inserted author {id}");
        inner.notify(Table::Authors);
        Ok(id)
    }

    /// Replaces the author row keyed by `author.id`.
    pub async fn update_author(&self, author: Author) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.authors.contains_key(&author.id) {
            return Err(StoreError::NotFound {
                table: Table::Authors,
                id: author.id.as_i64(),
            });
        }
        debug!("updated author {}", author.id);
        inner.authors.insert(author.id, author);
        inner.notify(Table::Authors);
        Ok(())
    }

    /// Returns one author row, if present.
    pub async fn author(&self, id: AuthorId) -> Option<Author> {
        self.inner.read().await.authors.get(&id).cloned()
    }

    /// Returns all authors, ordered by id.
    pub async fn authors(&self) -> Vec<Author> {
        self.inner.read().await.author_rows()
    }

    // ── Categories ───────────────────────────────────────────────

    /// Inserts a category and returns its assigned id.
    pub async fn insert_category(&self, mut category: Category) -> StoreResult<CategoryId> {
        let mut inner = self.inner.write().await;
        inner.next_category_id += 1;
        let id = CategoryId::from_raw(inner.next_category_id);
        category.id = id;
        inner.categories.insert(id, category);
        debug!("inserted category {id}");
        inner.notify(Table::Categories);
        Ok(id)
    }

    /// Replaces the category row keyed by `category.id`.
    pub async fn update_category(&self, category: Category) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.categories.contains_key(&category.id) {
            return Err(StoreError::NotFound {
                table: Table::Categories,
                id: category.id.as_i64(),
            });
        }
        debug!("updated category {}", category.id);
        inner.categories.insert(category.id, category);
        inner.notify(Table::Categories);
        Ok(())
    }

    /// Returns one category row, if present — soft-deleted rows included.
    pub async fn category(&self, id: CategoryId) -> Option<Category> {
        self.inner.read().await.categories.get(&id).cloned()
    }

    /// Returns all non-deleted categories, ordered by id.
    pub async fn categories(&self) -> Vec<Category> {
        self.inner.read().await.category_rows()
    }

    /// Returns the non-deleted direct children of `parent_id`.
    pub async fn sub_categories(&self, parent_id: CategoryId) -> Vec<Category> {
        self.inner
            .read()
            .await
            .categories
            .values()
            .filter(|c| !c.is_deleted && c.parent_id == Some(parent_id))
            .cloned()
            .collect()
    }

    // ── Books ────────────────────────────────────────────────────

    /// Inserts a book and returns its assigned id.
    pub async fn insert_book(&self, mut book: Book) -> StoreResult<BookId> {
        let mut inner = self.inner.write().await;
        inner.next_book_id += 1;
        let id = BookId::from_raw(inner.next_book_id);
        book.id = id;
        inner.books.insert(id, book);
        debug!("inserted book {id}");
        inner.notify(Table::Books);
        Ok(id)
    }

    /// Replaces the book row keyed by `book.id`.
    pub async fn update_book(&self, book: Book) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.books.contains_key(&book.id) {
            return Err(StoreError::NotFound {
                table: Table::Books,
                id: book.id.as_i64(),
            });
        }
        debug!("updated book {}", book.id);
        inner.books.insert(book.id, book);
        inner.notify(Table::Books);
        Ok(())
    }

    /// Returns one book row, if present — soft-deleted rows included.
    pub async fn book(&self, id: BookId) -> Option<Book> {
        self.inner.read().await.books.get(&id).cloned()
    }

    /// Returns all non-deleted books, ordered by id.
    pub async fn books(&self) -> Vec<Book> {
        self.inner.read().await.book_rows(None)
    }

    /// Returns the non-deleted books filed under any of the given
    /// categories.
    pub async fn books_in_categories(&self, category_ids: &HashSet<CategoryId>) -> Vec<Book> {
        self.inner.read().await.book_rows(Some(category_ids))
    }

    // ── Book/author links ────────────────────────────────────────

    /// Links a book to an author. Returns false when the pair already
    /// exists (the insert is idempotent). Both referenced rows must exist.
    pub async fn link_book_author(&self, link: BookAuthorLink) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        if !inner.books.contains_key(&link.book_id) {
            return Err(StoreError::NotFound {
                table: Table::Books,
                id: link.book_id.as_i64(),
            });
        }
        if !inner.authors.contains_key(&link.author_id) {
            return Err(StoreError::NotFound {
                table: Table::Authors,
                id: link.author_id.as_i64(),
            });
        }
        let inserted = inner.book_authors.insert(link);
        if inserted {
            debug!("linked book {} to author {}", link.book_id, link.author_id);
            inner.notify(Table::BookAuthors);
        }
        Ok(inserted)
    }

    /// Returns the authors linked to a book, ordered by author id.
    pub async fn authors_for_book(&self, book_id: BookId) -> Vec<Author> {
        let inner = self.inner.read().await;
        inner
            .book_authors
            .iter()
            .filter(|l| l.book_id == book_id)
            .filter_map(|l| inner.authors.get(&l.author_id).cloned())
            .collect()
    }

    // ── Copies ───────────────────────────────────────────────────

    /// Inserts a physical copy and returns its assigned id. The owning
    /// book must exist.
    pub async fn insert_copy(&self, mut copy: BookCopy) -> StoreResult<CopyId> {
        let mut inner = self.inner.write().await;
        if !inner.books.contains_key(&copy.book_id) {
            return Err(StoreError::NotFound {
                table: Table::Books,
                id: copy.book_id.as_i64(),
            });
        }
        inner.next_copy_id += 1;
        let id = CopyId::from_raw(inner.next_copy_id);
        copy.id = id;
        inner.copies.insert(id, copy);
        debug!("inserted copy {id}");
        inner.notify(Table::BookCopies);
        Ok(id)
    }

    /// Replaces the copy row keyed by `copy.id`.
    pub async fn update_copy(&self, copy: BookCopy) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.copies.contains_key(&copy.id) {
            return Err(StoreError::NotFound {
                table: Table::BookCopies,
                id: copy.id.as_i64(),
            });
        }
        debug!("updated copy {}", copy.id);
        inner.copies.insert(copy.id, copy);
        inner.notify(Table::BookCopies);
        Ok(())
    }

    /// Returns one copy row, if present.
    pub async fn copy(&self, id: CopyId) -> Option<BookCopy> {
        self.inner.read().await.copies.get(&id).cloned()
    }

    /// Returns the copies of one book, ordered by id.
    pub async fn copies_for_book(&self, book_id: BookId) -> Vec<BookCopy> {
        self.inner.read().await.copy_rows(book_id)
    }

    /// Returns every borrowed copy whose owning book is filed under any of
    /// the given categories. This is the deletion-safety query: it looks at
    /// every book row, soft-deleted or not.
    pub async fn borrowed_copies_in_categories(
        &self,
        category_ids: &HashSet<CategoryId>,
    ) -> Vec<BookCopy> {
        let inner = self.inner.read().await;
        let book_ids: HashSet<BookId> = inner
            .books
            .values()
            .filter(|b| b.category_id.is_some_and(|c| category_ids.contains(&c)))
            .map(|b| b.id)
            .collect();
        inner
            .copies
            .values()
            .filter(|c| c.status == CopyStatus::Borrowed && book_ids.contains(&c.book_id))
            .cloned()
            .collect()
    }

    // ── Audit log ────────────────────────────────────────────────

    /// Appends an audit entry and returns its assigned id. The log is
    /// append-only; there is no update path.
    pub async fn append_audit(&self, mut entry: AuditLogEntry) -> StoreResult<AuditEntryId> {
        let mut inner = self.inner.write().await;
        inner.next_audit_id += 1;
        let id = AuditEntryId::from_raw(inner.next_audit_id);
        entry.id = id;
        inner.audit_log.push(entry);
        inner.notify(Table::AuditLog);
        Ok(id)
    }

    /// Returns the audit trail, newest entry first.
    pub async fn audit_log(&self) -> Vec<AuditLogEntry> {
        self.inner.read().await.audit_rows()
    }

    // ── Live subscriptions ───────────────────────────────────────

    /// Subscribes to the author list.
    pub async fn watch_authors(&self) -> watch::Receiver<Vec<Author>> {
        let mut inner = self.inner.write().await;
        let (tx, rx) = watch::channel(inner.author_rows());
        inner.watchers.authors.push(tx);
        rx
    }

    /// Subscribes to the non-deleted category list.
    pub async fn watch_categories(&self) -> watch::Receiver<Vec<Category>> {
        let mut inner = self.inner.write().await;
        let (tx, rx) = watch::channel(inner.category_rows());
        inner.watchers.categories.push(tx);
        rx
    }

    /// Subscribes to the non-deleted book list.
    pub async fn watch_books(&self) -> watch::Receiver<Vec<Book>> {
        let mut inner = self.inner.write().await;
        let (tx, rx) = watch::channel(inner.book_rows(None));
        inner.watchers.books.push(BookWatcher {
            category_ids: None,
            tx,
        });
        rx
    }

    /// Subscribes to the non-deleted books filed under the given
    /// categories.
    pub async fn watch_books_in_categories(
        &self,
        category_ids: HashSet<CategoryId>,
    ) -> watch::Receiver<Vec<Book>> {
        let mut inner = self.inner.write().await;
        let (tx, rx) = watch::channel(inner.book_rows(Some(&category_ids)));
        inner.watchers.books.push(BookWatcher {
            category_ids: Some(category_ids),
            tx,
        });
        rx
    }

    /// Subscribes to the copies of one book.
    pub async fn watch_copies_for_book(&self, book_id: BookId) -> watch::Receiver<Vec<BookCopy>> {
        let mut inner = self.inner.write().await;
        let (tx, rx) = watch::channel(inner.copy_rows(book_id));
        inner.watchers.copies.push(CopyWatcher { book_id, tx });
        rx
    }

    /// Subscribes to the audit trail, newest entry first.
    pub async fn watch_audit_log(&self) -> watch::Receiver<Vec<AuditLogEntry>> {
        let mut inner = self.inner.write().await;
        let (tx, rx) = watch::channel(inner.audit_rows());
        inner.watchers.audit.push(tx);
        rx
    }
}

impl Default for LibraryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn author_rows(&self) -> Vec<Author> {
        self.authors.values().cloned().collect()
    }

    fn category_rows(&self) -> Vec<Category> {
        self.categories
            .values()
            .filter(|c| !c.is_deleted)
            .cloned()
            .collect()
    }

    fn book_rows(&self, category_ids: Option<&HashSet<CategoryId>>) -> Vec<Book> {
        self.books
            .values()
            .filter(|b| !b.is_deleted)
            .filter(|b| match category_ids {
                Some(ids) => b.category_id.is_some_and(|c| ids.contains(&c)),
                None => true,
            })
            .cloned()
            .collect()
    }

    fn copy_rows(&self, book_id: BookId) -> Vec<BookCopy> {
        self.copies
            .values()
            .filter(|c| c.book_id == book_id)
            .cloned()
            .collect()
    }

    fn audit_rows(&self) -> Vec<AuditLogEntry> {
        let mut rows = self.audit_log.clone();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows
    }

    /// Re-evaluates and re-emits every subscription reading `table`,
    /// pruning senders whose receivers are gone.
    fn notify(&mut self, table: Table) {
        match table {
            Table::Authors => {
                self.watchers.authors.retain(|tx| !tx.is_closed());
                let rows = self.author_rows();
                for tx in &self.watchers.authors {
                    tx.send_replace(rows.clone());
                }
            }
            Table::Categories => {
                self.watchers.categories.retain(|tx| !tx.is_closed());
                let rows = self.category_rows();
                for tx in &self.watchers.categories {
                    tx.send_replace(rows.clone());
                }
            }
            Table::Books => {
                self.watchers.books.retain(|w| !w.tx.is_closed());
                for w in &self.watchers.books {
                    let rows = self.book_rows(w.category_ids.as_ref());
                    w.tx.send_replace(rows);
                }
            }
            Table::BookCopies => {
                self.watchers.copies.retain(|w| !w.tx.is_closed());
                for w in &self.watchers.copies {
                    let rows = self.copy_rows(w.book_id);
                    w.tx.send_replace(rows);
                }
            }
            Table::AuditLog => {
                self.watchers.audit.retain(|tx| !tx.is_closed());
                let rows = self.audit_rows();
                for tx in &self.watchers.audit {
                    tx.send_replace(rows.clone());
                }
            }
            // No live subscription reads the link table directly.
            Table::BookAuthors => {}
        }
    }
}
