//! Change events announced by a store.
//!
//! A store publishes one [`TableEvent`] after each committed write. The
//! event names the table and the record identity but never carries values:
//! listeners that care re-fetch the row.

use crate::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new event ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A row was created.
    Added,
    /// An existing row had some of its values replaced.
    Updated,
    /// A row was removed.
    Deleted,
}

/// A change to one record of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEvent {
    /// Unique identifier for this event.
    pub id: EventId,

    /// Name of the table the record belongs to.
    pub table: String,

    /// Identity of the changed record.
    pub record_id: RecordId,

    /// The kind of change.
    pub kind: ChangeKind,
}

impl TableEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(table: impl Into<String>, record_id: RecordId, kind: ChangeKind) -> Self {
        Self {
            id: EventId::new(),
            table: table.into(),
            record_id,
            kind,
        }
    }

    /// Creates a row-added event.
    #[must_use]
    pub fn added(table: impl Into<String>, record_id: RecordId) -> Self {
        Self::new(table, record_id, ChangeKind::Added)
    }

    /// Creates a row-updated event.
    #[must_use]
    pub fn updated(table: impl Into<String>, record_id: RecordId) -> Self {
        Self::new(table, record_id, ChangeKind::Updated)
    }

    /// Creates a row-deleted event.
    #[must_use]
    pub fn deleted(table: impl Into<String>, record_id: RecordId) -> Self {
        Self::new(table, record_id, ChangeKind::Deleted)
    }

    /// Returns `true` if this event concerns the given table and record.
    #[must_use]
    pub fn concerns(&self, table: &str, record_id: RecordId) -> bool {
        self.table == table && self.record_id == record_id
    }
}

impl fmt::Display for TableEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}#{}", self.kind, self.table, self.record_id)
    }
}
