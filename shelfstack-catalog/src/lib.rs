//! Catalog core for ShelfStack.
//!
//! Everything between the presentation layer and the record store lives
//! here:
//!
//! - **Hierarchy**: [`descendant_ids`] resolves a category's full subtree
//! - **Validation**: pre-write integrity checks with the typed
//!   [`ValidationError`] taxonomy
//! - **Repository**: [`LibraryRepository`], the single entry point for
//!   mutations — validates, writes, cascades, audits
//! - **Audit**: [`AuditRecorder`], the append-only before/after trail
//!   behind every successful write
//!
//! Mutations follow one discipline: validate against current store state,
//! apply the write(s), then record the audit entry. Validation failures
//! surface before anything is written; audit failures never unwind a
//! committed write.
//!
//! # Example
//!
//! ```
//! use shelfstack_catalog::LibraryRepository;
//! use shelfstack_store::LibraryStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(LibraryStore::new());
//! let repository = LibraryRepository::new(store);
//! ```

mod audit;
mod error;
mod hierarchy;
mod repository;
pub mod validation;

pub use audit::AuditRecorder;
pub use error::{CatalogError, CatalogResult};
pub use hierarchy::descendant_ids;
pub use repository::LibraryRepository;
pub use validation::ValidationError;
