//! The append-only audit trail behind every mutation.

use serde::Serialize;
use shelfstack_model::{AuditAction, AuditLogEntry, Table};
use shelfstack_store::LibraryStore;
use shelfstack_types::Timestamp;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Appends one audit entry after each successful mutation.
///
/// Owns a shared monotonic clock so entries are strictly ordered even when
/// several land in the same millisecond. Recording happens after the
/// primary write; a failed append is logged and reported nowhere else —
/// the committed mutation stands.
pub struct AuditRecorder {
    store: Arc<LibraryStore>,
    clock: Mutex<Timestamp>,
}

impl AuditRecorder {
    /// Creates a recorder appending to the given store.
    #[must_use]
    pub fn new(store: Arc<LibraryStore>) -> Self {
        Self {
            store,
            clock: Mutex::new(Timestamp::now()),
        }
    }

    /// Appends one entry for a committed mutation. `pre` is `None` on
    /// creation.
    pub async fn record(
        &self,
        table: Table,
        entity_id: i64,
        action: AuditAction,
        pre: Option<String>,
        post: Option<String>,
    ) {
        let timestamp = {
            let mut clock = self.clock.lock().await;
            *clock = clock.tick();
            *clock
        };
        let entry = AuditLogEntry::new(table.as_str(), entity_id, action, pre, post, timestamp);
        if let Err(err) = self.store.append_audit(entry).await {
            warn!("audit append failed for {table} id {entity_id}: {err}");
        }
    }

    /// Serializes a record into the human-readable snapshot an entry
    /// carries. Returns `None` (and logs) if the record cannot be
    /// serialized.
    #[must_use]
    pub fn snapshot<T: Serialize>(value: &T) -> Option<String> {
        match serde_json::to_string(value) {
            Ok(json) => Some(json),
            Err(err) => {
                warn!("could not serialize audit snapshot: {err}");
                None
            }
        }
    }
}
