//! Error types for the storage layer.

use rowsync_types::RecordId;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    /// Row not found.
    #[error("row not found: {table}#{id}")]
    NotFound { table: String, id: RecordId },

    /// The table was never registered with the store.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// A value was supplied for a column the table does not have.
    #[error("unknown field {field} in table {table}")]
    UnknownField { table: String, field: String },

    /// A write violated a column constraint.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Invalid request.
    #[error("invalid data: {0}")]
    InvalidData(String),
}
