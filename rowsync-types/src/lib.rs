//! Core type definitions for rowsync.
//!
//! This crate defines the small, store-agnostic types shared by every other
//! rowsync crate:
//! - Record identities ([`RecordId`]) and the "no record" sentinel
//! - Subscriber and listener identifiers (UUID v7)
//! - Table change events delivered by the change bus
//!
//! Table schemas, snapshots and write buffers live in `rowsync-model`.

mod event;
mod ids;

pub use event::{ChangeKind, EventId, TableEvent};
pub use ids::{ListenerId, RecordId, SubscriberId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid record id: {0}")]
    InvalidRecordId(#[from] std::num::ParseIntError),
}
