//! Error types for the store layer.

use shelfstack_model::Table;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An update addressed an id with no row behind it.
    #[error("record not found: {table} id {id}")]
    NotFound { table: Table, id: i64 },
}
