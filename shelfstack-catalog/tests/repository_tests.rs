use shelfstack_catalog::{CatalogError, LibraryRepository, ValidationError};
use shelfstack_model::{
    AuditAction, Author, Book, BookCopy, Category, CopyStatus,
};
use shelfstack_store::LibraryStore;
use shelfstack_types::{AuthorId, BookId, CategoryId};
use std::collections::HashSet;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn repo() -> LibraryRepository {
    LibraryRepository::new(Arc::new(LibraryStore::new()))
}

async fn insert_category(
    repo: &LibraryRepository,
    name: &str,
    parent: Option<CategoryId>,
) -> CategoryId {
    repo.insert_category(Category::new(name, parent)).await.unwrap()
}

/// Fiction ─┬─ SciFi
///          └─ Fantasy
async fn fiction_tree(repo: &LibraryRepository) -> (CategoryId, CategoryId, CategoryId) {
    let fiction = insert_category(repo, "Fiction", None).await;
    let scifi = insert_category(repo, "SciFi", Some(fiction)).await;
    let fantasy = insert_category(repo, "Fantasy", Some(fiction)).await;
    (fiction, scifi, fantasy)
}

async fn category_row(repo: &LibraryRepository, id: CategoryId) -> Category {
    repo.store().category(id).await.unwrap()
}

// ── Authors ──────────────────────────────────────────────────────

#[tokio::test]
async fn insert_author_persists_and_audits() {
    let repo = repo();
    let id = repo
        .insert_author(Author::new("Ursula K. Le Guin", "Speculative fiction."))
        .await
        .unwrap();
    assert!(id.is_assigned());

    let log = repo.audit_log().await;
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].table_name, "authors");
    assert_eq!(log[0].entity_id, id.as_i64());
    assert_eq!(log[0].action, AuditAction::Insert);
    assert!(log[0].pre_value.is_none());
    assert!(log[0].post_value.as_deref().unwrap().contains("Le Guin"));
}

#[tokio::test]
async fn update_author_audits_before_and_after() {
    let repo = repo();
    let id = repo
        .insert_author(Author::new("A. Author", "old"))
        .await
        .unwrap();

    let mut updated = repo.store().author(id).await.unwrap();
    updated.biography = "new".to_string();
    repo.update_author(updated).await.unwrap();

    let log = repo.audit_log().await;
    assert_eq!(log.len(), 2);
    // Newest first.
    assert_eq!(log[0].action, AuditAction::Update);
    assert!(log[0].pre_value.as_deref().unwrap().contains("old"));
    assert!(log[0].post_value.as_deref().unwrap().contains("new"));
}

// ── Category inserts and updates ─────────────────────────────────

#[tokio::test]
async fn insert_category_with_missing_parent_writes_nothing() {
    let repo = repo();
    let err = repo
        .insert_category(Category::new("Orphan", Some(CategoryId::from_raw(9))))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::ParentNotFound(_))
    ));
    assert!(repo.categories().await.is_empty());
    assert!(repo.audit_log().await.is_empty());
}

#[tokio::test]
async fn self_parent_update_is_rejected_and_store_unchanged() {
    let repo = repo();
    let id = insert_category(&repo, "Fiction", None).await;

    let mut row = category_row(&repo, id).await;
    row.parent_id = Some(id);
    let err = repo.update_category(row).await.unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::SelfParent(_))
    ));
    assert_eq!(category_row(&repo, id).await.parent_id, None);
}

#[tokio::test]
async fn second_of_two_reparents_creating_a_cycle_fails() {
    let repo = repo();
    let (fiction, scifi, fantasy) = fiction_tree(&repo).await;

    // First move is legal: Fantasy under SciFi.
    let mut fantasy_row = category_row(&repo, fantasy).await;
    fantasy_row.parent_id = Some(scifi);
    repo.update_category(fantasy_row).await.unwrap();

    // Second move would close the loop: SciFi under Fantasy.
    let mut scifi_row = category_row(&repo, scifi).await;
    scifi_row.parent_id = Some(fantasy);
    let err = repo.update_category(scifi_row).await.unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::CyclicReference { .. })
    ));
    assert_eq!(category_row(&repo, scifi).await.parent_id, Some(fiction));
}

// ── Category deletion ────────────────────────────────────────────

#[tokio::test]
async fn delete_with_borrowed_copy_changes_nothing() {
    init_tracing();
    let repo = repo();
    let (fiction, scifi, _fantasy) = fiction_tree(&repo).await;
    let book = repo
        .insert_book(Book::new("Dune", "9780441172719", Some(scifi)), &[])
        .await
        .unwrap();
    let copy = repo.insert_copy(BookCopy::new(book, "F-1")).await.unwrap();
    repo.update_copy_status(copy, CopyStatus::Borrowed)
        .await
        .unwrap();
    let audit_before = repo.audit_log().await.len();

    let err = repo.delete_category(fiction, true).await.unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::CopiesOnLoan { .. })
    ));

    // No category deleted, no book touched, no audit entry appended.
    assert_eq!(repo.categories().await.len(), 3);
    assert!(!repo.store().book(book).await.unwrap().is_deleted);
    assert_eq!(repo.audit_log().await.len(), audit_before);
}

#[tokio::test]
async fn delete_cascade_soft_deletes_books_and_categories() {
    init_tracing();
    let repo = repo();
    let (fiction, scifi, fantasy) = fiction_tree(&repo).await;
    let in_scifi = repo
        .insert_book(Book::new("Dune", "9780441172719", Some(scifi)), &[])
        .await
        .unwrap();
    let in_fantasy = repo
        .insert_book(Book::new("Earthsea", "9780547773742", Some(fantasy)), &[])
        .await
        .unwrap();

    repo.delete_category(fiction, true).await.unwrap();

    for id in [fiction, scifi, fantasy] {
        assert!(category_row(&repo, id).await.is_deleted);
    }
    for id in [in_scifi, in_fantasy] {
        let book = repo.store().book(id).await.unwrap();
        assert!(book.is_deleted);
        // Soft delete keeps the shelving intact.
        assert!(book.category_id.is_some());
    }
    assert!(repo.categories().await.is_empty());
    assert!(repo.books().await.is_empty());
}

#[tokio::test]
async fn delete_cascade_detaches_books_when_asked_to_keep_them() {
    let repo = repo();
    let (fiction, scifi, fantasy) = fiction_tree(&repo).await;
    let kept = repo
        .insert_book(Book::new("Dune", "9780441172719", Some(scifi)), &[])
        .await
        .unwrap();

    assert_eq!(
        repo.descendant_ids(fiction).await,
        HashSet::from([fiction, scifi, fantasy])
    );
    repo.delete_category(fiction, false).await.unwrap();

    for id in [fiction, scifi, fantasy] {
        assert!(category_row(&repo, id).await.is_deleted);
    }
    let book = repo.store().book(kept).await.unwrap();
    assert!(!book.is_deleted);
    assert_eq!(book.category_id, None);
    // The detached book is still in the visible list, uncategorized.
    assert_eq!(repo.books().await.len(), 1);
}

#[tokio::test]
async fn delete_leaves_sibling_subtrees_alone() {
    let repo = repo();
    let (fiction, scifi, _fantasy) = fiction_tree(&repo).await;
    let science = insert_category(&repo, "Science", None).await;
    let unrelated = repo
        .insert_book(Book::new("Cosmos", "9780345539435", Some(science)), &[])
        .await
        .unwrap();

    repo.delete_category(scifi, false).await.unwrap();

    assert!(!category_row(&repo, fiction).await.is_deleted);
    assert!(!category_row(&repo, science).await.is_deleted);
    assert_eq!(
        repo.store().book(unrelated).await.unwrap().category_id,
        Some(science)
    );
}

// ── Books ────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_book_links_authors() {
    let repo = repo();
    let herbert = repo
        .insert_author(Author::new("Frank Herbert", ""))
        .await
        .unwrap();
    let anderson = repo
        .insert_author(Author::new("Kevin J. Anderson", ""))
        .await
        .unwrap();

    let book = repo
        .insert_book(
            Book::new("Hunters of Dune", "9780765312921", None),
            &[herbert, anderson],
        )
        .await
        .unwrap();

    let linked: Vec<AuthorId> = repo
        .authors_for_book(book)
        .await
        .iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(linked, vec![herbert, anderson]);
}

#[tokio::test]
async fn insert_book_with_unknown_author_writes_nothing() {
    let repo = repo();
    let ghost = AuthorId::from_raw(77);
    let err = repo
        .insert_book(Book::new("Nobody", "n/a", None), &[ghost])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "author 77 does not exist");
    assert!(repo.books().await.is_empty());
    assert!(repo.audit_log().await.is_empty());
}

#[tokio::test]
async fn soft_delete_missing_book_is_a_store_error() {
    let repo = repo();
    let err = repo.soft_delete_book(BookId::from_raw(1)).await.unwrap_err();
    assert!(matches!(err, CatalogError::Store(_)));
}

// ── Copies ───────────────────────────────────────────────────────

#[tokio::test]
async fn copy_lifecycle_roundtrip() {
    let repo = repo();
    let book = repo
        .insert_book(Book::new("Dune", "9780441172719", None), &[])
        .await
        .unwrap();
    let copy = repo.insert_copy(BookCopy::new(book, "F-1")).await.unwrap();

    repo.update_copy_status(copy, CopyStatus::Borrowed)
        .await
        .unwrap();
    assert_eq!(
        repo.copies_for_book(book).await[0].status,
        CopyStatus::Borrowed
    );

    repo.update_copy_status(copy, CopyStatus::Available)
        .await
        .unwrap();
    assert_eq!(
        repo.copies_for_book(book).await[0].status,
        CopyStatus::Available
    );
}

// ── Subtree reads ────────────────────────────────────────────────

#[tokio::test]
async fn books_in_subtree_spans_descendants() {
    let repo = repo();
    let (fiction, scifi, fantasy) = fiction_tree(&repo).await;
    repo.insert_book(Book::new("Dune", "9780441172719", Some(scifi)), &[])
        .await
        .unwrap();
    repo.insert_book(Book::new("Earthsea", "9780547773742", Some(fantasy)), &[])
        .await
        .unwrap();
    repo.insert_book(Book::new("Loose Leaf", "n/a", None), &[])
        .await
        .unwrap();

    assert_eq!(repo.books_in_subtree(fiction).await.len(), 2);
    assert_eq!(repo.books_in_subtree(scifi).await.len(), 1);
}

#[tokio::test]
async fn watch_books_in_subtree_sees_cascade() {
    let repo = repo();
    let (fiction, scifi, _fantasy) = fiction_tree(&repo).await;
    repo.insert_book(Book::new("Dune", "9780441172719", Some(scifi)), &[])
        .await
        .unwrap();

    let mut rx = repo.watch_books_in_subtree(fiction).await;
    assert_eq!(rx.borrow_and_update().len(), 1);

    repo.delete_category(fiction, true).await.unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_empty());
}
