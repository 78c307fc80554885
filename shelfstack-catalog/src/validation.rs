//! Pre-write integrity checks.
//!
//! Every mutation the repository accepts runs the relevant check here
//! first, against current store state. A failed check means nothing is
//! written; the error message is what the presentation layer shows the
//! user.

use crate::hierarchy::descendant_ids;
use shelfstack_model::Category;
use shelfstack_store::LibraryStore;
use shelfstack_types::{AuthorId, CategoryId};
use std::collections::HashSet;
use thiserror::Error;

/// Why a mutation was rejected before any write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The referenced parent is missing or soft-deleted.
    #[error("parent category {0} does not exist")]
    ParentNotFound(CategoryId),

    /// A category was re-parented onto itself.
    #[error("category {0} cannot be its own parent")]
    SelfParent(CategoryId),

    /// The proposed parent sits inside the category's own subtree.
    #[error("cyclic reference: category {parent} is a descendant of category {category}")]
    CyclicReference {
        category: CategoryId,
        parent: CategoryId,
    },

    /// The subtree still has physical copies out on loan.
    #[error("cannot delete category {category}: {count} borrowed copies in its subtree")]
    CopiesOnLoan { category: CategoryId, count: usize },

    /// The referenced category is missing or soft-deleted.
    #[error("category {0} does not exist")]
    CategoryNotFound(CategoryId),

    /// The referenced author does not exist.
    #[error("author {0} does not exist")]
    AuthorNotFound(AuthorId),
}

async fn category_exists(store: &LibraryStore, id: CategoryId) -> bool {
    store.category(id).await.is_some_and(|c| !c.is_deleted)
}

/// Checks a category about to be inserted: a set parent must exist among
/// the non-deleted categories.
pub async fn validate_new_category(
    store: &LibraryStore,
    parent_id: Option<CategoryId>,
) -> Result<(), ValidationError> {
    if let Some(parent_id) = parent_id
        && !category_exists(store, parent_id).await
    {
        return Err(ValidationError::ParentNotFound(parent_id));
    }
    Ok(())
}

/// Checks a category update, in order: no self-parenting, no re-parenting
/// into the category's own subtree, and the new parent must exist.
pub async fn validate_category_update(
    store: &LibraryStore,
    category: &Category,
) -> Result<(), ValidationError> {
    if category.parent_id == Some(category.id) {
        return Err(ValidationError::SelfParent(category.id));
    }

    if let Some(parent_id) = category.parent_id {
        let descendants = descendant_ids(store, category.id).await;
        if descendants.contains(&parent_id) {
            return Err(ValidationError::CyclicReference {
                category: category.id,
                parent: parent_id,
            });
        }
        if !category_exists(store, parent_id).await {
            return Err(ValidationError::ParentNotFound(parent_id));
        }
    }

    Ok(())
}

/// Checks a category deletion: no copy anywhere in the subtree may be out
/// on loan. Returns the resolved descendant set so the caller can run the
/// cascade over it without resolving twice.
pub async fn validate_category_deletion(
    store: &LibraryStore,
    category_id: CategoryId,
) -> Result<HashSet<CategoryId>, ValidationError> {
    let ids = descendant_ids(store, category_id).await;
    let borrowed = store.borrowed_copies_in_categories(&ids).await;
    if !borrowed.is_empty() {
        return Err(ValidationError::CopiesOnLoan {
            category: category_id,
            count: borrowed.len(),
        });
    }
    Ok(ids)
}

/// Checks a book about to be inserted: a set category must exist, and every
/// listed author must exist.
pub async fn validate_new_book(
    store: &LibraryStore,
    category_id: Option<CategoryId>,
    author_ids: &[AuthorId],
) -> Result<(), ValidationError> {
    if let Some(category_id) = category_id
        && !category_exists(store, category_id).await
    {
        return Err(ValidationError::CategoryNotFound(category_id));
    }

    let authors = store.authors().await;
    for author_id in author_ids {
        if !authors.iter().any(|a| a.id == *author_id) {
            return Err(ValidationError::AuthorNotFound(*author_id));
        }
    }

    Ok(())
}
