//! The mutation coordinator.
//!
//! [`LibraryRepository`] is the presentation layer's single entry point.
//! Each mutation runs its integrity checks against current store state,
//! applies the write(s), then records the audit entry. Reads pass through
//! to the store, either as snapshots or as live watch streams.

use crate::audit::AuditRecorder;
use crate::error::CatalogResult;
use crate::hierarchy::descendant_ids;
use crate::validation;
use shelfstack_model::{
    AuditAction, AuditLogEntry, Author, Book, BookAuthorLink, BookCopy, Category, CopyStatus,
    Table,
};
use shelfstack_store::{LibraryStore, StoreError};
use shelfstack_types::{AuthorId, BookId, CategoryId, CopyId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Coordinates validated, audited writes against the record store.
///
/// The store serializes individual calls, but a validate-then-write pair is
/// not one atomic step: the repository assumes a single logical writer, and
/// concurrent mutations of overlapping subtrees are undefined.
pub struct LibraryRepository {
    store: Arc<LibraryStore>,
    audit: AuditRecorder,
}

impl LibraryRepository {
    /// Creates a repository over the given store.
    #[must_use]
    pub fn new(store: Arc<LibraryStore>) -> Self {
        let audit = AuditRecorder::new(Arc::clone(&store));
        Self { store, audit }
    }

    /// The underlying store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<LibraryStore> {
        &self.store
    }

    // ── Authors ──────────────────────────────────────────────────

    /// Inserts an author.
    pub async fn insert_author(&self, author: Author) -> CatalogResult<AuthorId> {
        let id = self.store.insert_author(author.clone()).await?;
        let mut stored = author;
        stored.id = id;
        self.audit
            .record(
                Table::Authors,
                id.as_i64(),
                AuditAction::Insert,
                None,
                AuditRecorder::snapshot(&stored),
            )
            .await;
        Ok(id)
    }

    /// Replaces an author record.
    pub async fn update_author(&self, author: Author) -> CatalogResult<()> {
        let pre = self.store.author(author.id).await;
        self.store.update_author(author.clone()).await?;
        self.audit
            .record(
                Table::Authors,
                author.id.as_i64(),
                AuditAction::Update,
                pre.as_ref().and_then(|a| AuditRecorder::snapshot(a)),
                AuditRecorder::snapshot(&author),
            )
            .await;
        Ok(())
    }

    // ── Categories ───────────────────────────────────────────────

    /// Inserts a category after checking its parent exists.
    pub async fn insert_category(&self, category: Category) -> CatalogResult<CategoryId> {
        validation::validate_new_category(&self.store, category.parent_id).await?;

        let id = self.store.insert_category(category.clone()).await?;
        let mut stored = category;
        stored.id = id;
        self.audit
            .record(
                Table::Categories,
                id.as_i64(),
                AuditAction::Insert,
                None,
                AuditRecorder::snapshot(&stored),
            )
            .await;
        Ok(id)
    }

    /// Replaces a category record after checking the move keeps the tree
    /// acyclic and the new parent exists.
    pub async fn update_category(&self, category: Category) -> CatalogResult<()> {
        validation::validate_category_update(&self.store, &category).await?;

        let pre = self.store.category(category.id).await;
        self.store.update_category(category.clone()).await?;
        self.audit
            .record(
                Table::Categories,
                category.id.as_i64(),
                AuditAction::Update,
                pre.as_ref().and_then(|c| AuditRecorder::snapshot(c)),
                AuditRecorder::snapshot(&category),
            )
            .await;
        Ok(())
    }

    /// Soft-deletes a category and its whole subtree.
    ///
    /// Aborts before any write when a borrowed copy exists anywhere in the
    /// subtree. Otherwise, for every category in the descendant set: its
    /// books are soft-deleted (`delete_books`) or detached to uncategorized
    /// (`!delete_books`), then the category itself is marked deleted. Each
    /// category is visited exactly once, in no particular order.
    pub async fn delete_category(
        &self,
        category_id: CategoryId,
        delete_books: bool,
    ) -> CatalogResult<()> {
        let ids = validation::validate_category_deletion(&self.store, category_id).await?;
        debug!(
            "deleting category {category_id}: {} categories in subtree, delete_books={delete_books}",
            ids.len()
        );

        for cat_id in &ids {
            let books = self
                .store
                .books_in_categories(&HashSet::from([*cat_id]))
                .await;
            for book in books {
                if delete_books {
                    self.soft_delete_book_row(book).await?;
                } else {
                    self.detach_book(book).await?;
                }
            }

            // Already-deleted rows (the root can be one) are left untouched.
            if let Some(category) = self.store.category(*cat_id).await
                && !category.is_deleted
            {
                let mut deleted = category.clone();
                deleted.is_deleted = true;
                self.store.update_category(deleted.clone()).await?;
                self.audit
                    .record(
                        Table::Categories,
                        cat_id.as_i64(),
                        AuditAction::SoftDelete,
                        AuditRecorder::snapshot(&category),
                        AuditRecorder::snapshot(&deleted),
                    )
                    .await;
            }
        }

        Ok(())
    }

    // ── Books ────────────────────────────────────────────────────

    /// Inserts a book and links it to its authors, after checking the
    /// category and every author exist.
    pub async fn insert_book(&self, book: Book, author_ids: &[AuthorId]) -> CatalogResult<BookId> {
        validation::validate_new_book(&self.store, book.category_id, author_ids).await?;

        let id = self.store.insert_book(book.clone()).await?;
        for author_id in author_ids {
            let link = BookAuthorLink::new(id, *author_id);
            let inserted = self.store.link_book_author(link).await?;
            if inserted {
                self.audit
                    .record(
                        Table::BookAuthors,
                        id.as_i64(),
                        AuditAction::Add,
                        None,
                        AuditRecorder::snapshot(&link),
                    )
                    .await;
            }
        }

        let mut stored = book;
        stored.id = id;
        self.audit
            .record(
                Table::Books,
                id.as_i64(),
                AuditAction::Insert,
                None,
                AuditRecorder::snapshot(&stored),
            )
            .await;
        Ok(id)
    }

    /// Soft-deletes a book.
    pub async fn soft_delete_book(&self, book_id: BookId) -> CatalogResult<()> {
        let Some(book) = self.store.book(book_id).await else {
            return Err(StoreError::NotFound {
                table: Table::Books,
                id: book_id.as_i64(),
            }
            .into());
        };
        self.soft_delete_book_row(book).await
    }

    async fn soft_delete_book_row(&self, book: Book) -> CatalogResult<()> {
        let mut deleted = book.clone();
        deleted.is_deleted = true;
        self.store.update_book(deleted.clone()).await?;
        self.audit
            .record(
                Table::Books,
                book.id.as_i64(),
                AuditAction::SoftDelete,
                AuditRecorder::snapshot(&book),
                AuditRecorder::snapshot(&deleted),
            )
            .await;
        Ok(())
    }

    async fn detach_book(&self, book: Book) -> CatalogResult<()> {
        let mut detached = book.clone();
        detached.category_id = None;
        self.store.update_book(detached.clone()).await?;
        self.audit
            .record(
                Table::Books,
                book.id.as_i64(),
                AuditAction::Update,
                AuditRecorder::snapshot(&book),
                AuditRecorder::snapshot(&detached),
            )
            .await;
        Ok(())
    }

    // ── Copies ───────────────────────────────────────────────────

    /// Inserts a physical copy of a book.
    pub async fn insert_copy(&self, copy: BookCopy) -> CatalogResult<CopyId> {
        let id = self.store.insert_copy(copy.clone()).await?;
        let mut stored = copy;
        stored.id = id;
        self.audit
            .record(
                Table::BookCopies,
                id.as_i64(),
                AuditAction::Add,
                None,
                AuditRecorder::snapshot(&stored),
            )
            .await;
        Ok(id)
    }

    /// Replaces a copy record.
    pub async fn update_copy(&self, copy: BookCopy) -> CatalogResult<()> {
        let pre = self.store.copy(copy.id).await;
        self.store.update_copy(copy.clone()).await?;
        self.audit
            .record(
                Table::BookCopies,
                copy.id.as_i64(),
                AuditAction::Update,
                pre.as_ref().and_then(|c| AuditRecorder::snapshot(c)),
                AuditRecorder::snapshot(&copy),
            )
            .await;
        Ok(())
    }

    /// Moves a copy between the shelf and a patron.
    pub async fn update_copy_status(
        &self,
        copy_id: CopyId,
        status: CopyStatus,
    ) -> CatalogResult<()> {
        let Some(copy) = self.store.copy(copy_id).await else {
            return Err(StoreError::NotFound {
                table: Table::BookCopies,
                id: copy_id.as_i64(),
            }
            .into());
        };
        self.update_copy(copy.with_status(status)).await
    }

    // ── Subtree reads ────────────────────────────────────────────

    /// Resolves a category's full descendant id set, the root included.
    pub async fn descendant_ids(&self, category_id: CategoryId) -> HashSet<CategoryId> {
        descendant_ids(&self.store, category_id).await
    }

    /// The non-deleted books filed anywhere under a category.
    pub async fn books_in_subtree(&self, category_id: CategoryId) -> Vec<Book> {
        let ids = self.descendant_ids(category_id).await;
        self.store.books_in_categories(&ids).await
    }

    /// Live view of the non-deleted books filed anywhere under a category.
    /// The subtree is resolved once, at subscription time.
    pub async fn watch_books_in_subtree(
        &self,
        category_id: CategoryId,
    ) -> watch::Receiver<Vec<Book>> {
        let ids = self.descendant_ids(category_id).await;
        self.store.watch_books_in_categories(ids).await
    }

    // ── Read passthroughs ────────────────────────────────────────

    /// All authors.
    pub async fn authors(&self) -> Vec<Author> {
        self.store.authors().await
    }

    /// All non-deleted categories.
    pub async fn categories(&self) -> Vec<Category> {
        self.store.categories().await
    }

    /// All non-deleted books.
    pub async fn books(&self) -> Vec<Book> {
        self.store.books().await
    }

    /// The authors linked to a book.
    pub async fn authors_for_book(&self, book_id: BookId) -> Vec<Author> {
        self.store.authors_for_book(book_id).await
    }

    /// The physical copies of a book.
    pub async fn copies_for_book(&self, book_id: BookId) -> Vec<BookCopy> {
        self.store.copies_for_book(book_id).await
    }

    /// The audit trail, newest entry first.
    pub async fn audit_log(&self) -> Vec<AuditLogEntry> {
        self.store.audit_log().await
    }

    /// Live view of the author list.
    pub async fn watch_authors(&self) -> watch::Receiver<Vec<Author>> {
        self.store.watch_authors().await
    }

    /// Live view of the non-deleted category list.
    pub async fn watch_categories(&self) -> watch::Receiver<Vec<Category>> {
        self.store.watch_categories().await
    }

    /// Live view of the non-deleted book list.
    pub async fn watch_books(&self) -> watch::Receiver<Vec<Book>> {
        self.store.watch_books().await
    }

    /// Live view of the copies of one book.
    pub async fn watch_copies_for_book(&self, book_id: BookId) -> watch::Receiver<Vec<BookCopy>> {
        self.store.watch_copies_for_book(book_id).await
    }

    /// Live view of the audit trail, newest entry first.
    pub async fn watch_audit_log(&self) -> watch::Receiver<Vec<AuditLogEntry>> {
        self.store.watch_audit_log().await
    }
}
