//! Category subtree resolution.

use shelfstack_store::LibraryStore;
use shelfstack_types::CategoryId;
use std::collections::HashSet;

/// Resolves the full descendant set of a category, the root included.
///
/// Walks the parent→children links with an explicit work list instead of
/// recursing, so arbitrarily deep trees cannot exhaust the call stack. The
/// visited set doubles as a cycle guard: the write-path validator keeps the
/// tree acyclic, but if the data were ever corrupted the walk still
/// terminates after visiting each reachable category once.
///
/// Soft-deleted categories are not traversed; the root id is part of the
/// result regardless of its own state.
pub async fn descendant_ids(store: &LibraryStore, root: CategoryId) -> HashSet<CategoryId> {
    let mut visited = HashSet::new();
    let mut pending = vec![root];

    while let Some(id) = pending.pop() {
        if !visited.insert(id) {
            continue;
        }
        for child in store.sub_categories(id).await {
            if !visited.contains(&child.id) {
                pending.push(child.id);
            }
        }
    }

    visited
}
