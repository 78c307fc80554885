use serde::{Deserialize, Serialize};
use shelfstack_types::{AuditEntryId, Timestamp};
use std::fmt;

/// The kind of mutation an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A new row was created.
    Insert,
    /// An existing row was replaced.
    Update,
    /// A row was marked deleted (the row itself persists).
    SoftDelete,
    /// A secondary row was attached — a physical copy or an author link.
    Add,
}

impl AuditAction {
    /// The action's persisted tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Insert => "INSERT",
            AuditAction::Update => "UPDATE",
            AuditAction::SoftDelete => "SOFT_DELETE",
            AuditAction::Add => "ADD",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the append-only audit trail.
///
/// Every successful mutation produces exactly one entry holding a JSON
/// snapshot of the row before (`None` on creation) and after the write.
/// Entries are never updated or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: AuditEntryId,
    pub table_name: String,
    pub entity_id: i64,
    pub action: AuditAction,
    pub pre_value: Option<String>,
    pub post_value: Option<String>,
    pub timestamp: Timestamp,
}

impl AuditLogEntry {
    /// Creates an unpersisted entry; the store assigns the id on append.
    #[must_use]
    pub fn new(
        table_name: impl Into<String>,
        entity_id: i64,
        action: AuditAction,
        pre_value: Option<String>,
        post_value: Option<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: AuditEntryId::default(),
            table_name: table_name.into(),
            entity_id,
            action,
            pre_value,
            post_value,
            timestamp,
        }
    }
}
