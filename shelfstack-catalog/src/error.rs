//! Error types for the catalog core.

use crate::validation::ValidationError;
use shelfstack_store::StoreError;
use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur in catalog operations.
///
/// Validation failures pass through unchanged so the presentation layer can
/// show their message verbatim.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// An integrity check rejected the mutation before any write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store rejected a write.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
