//! In-memory record store for ShelfStack.
//!
//! Provides keyed storage for the six catalog tables with the query surface
//! the catalog core needs: inserts that assign ids, full-record updates,
//! filtered snapshot reads, and live watch-channel subscriptions.
//!
//! # Architecture
//!
//! - One [`LibraryStore`] handle owns every table behind a single async
//!   read/write lock; callers construct it explicitly and share it via
//!   `Arc` — there is no process-wide instance
//! - Subscriptions are `tokio::sync::watch` channels seeded with the
//!   current result set and re-emitted after each write to the underlying
//!   table; dropping the receiver ends delivery
//! - The store serializes individual calls but does not group them: a
//!   validate-then-write sequence spanning several calls is the caller's
//!   contract (single logical writer)

mod error;
mod store;
mod subscription;

pub use error::{StoreError, StoreResult};
pub use store::LibraryStore;
