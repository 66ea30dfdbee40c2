//! Error types for the record view.

use rowsync_model::ValidState;
use rowsync_storage::StorageError;
use rowsync_types::RecordId;
use thiserror::Error;

/// Result type for record view operations.
pub type ViewResult<T> = Result<T, ViewError>;

/// Result type for field view operations.
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors raised by a single field view.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    /// The view cannot display or hold this value.
    #[error("unexpected value for {field}: {value}")]
    UnexpectedValue {
        field: String,
        value: serde_json::Value,
    },

    /// The view refused the operation.
    #[error("{0}")]
    Rejected(String),
}

/// Errors that can occur in record view operations.
#[derive(Debug, Error)]
pub enum ViewError {
    /// A snapshot of another table was handed to the view.
    #[error("record of table {found} given to a view of table {expected}")]
    TypeMismatch { expected: String, found: String },

    /// Write attempted while the displayed row is read-only.
    #[error("read only selection")]
    ReadOnly,

    /// Write attempted without a real row selected.
    #[error("cannot write row {0}: no stored row selected")]
    UndefinedIdentity(RecordId),

    /// Two field views share a name.
    #[error("two views named {0}")]
    DuplicateName(String),

    /// `set_order` was given a different set of names than registered.
    #[error("names mismatch: registered {registered:?}, supplied {supplied:?}")]
    NameMismatch {
        registered: Vec<String>,
        supplied: Vec<String>,
    },

    /// Operation not allowed in the current state.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// The table has no identity column.
    #[error("table {0} is not rowable")]
    NotRowable(String),

    /// An owner-only operation was called from another thread.
    #[error("called outside the owner context")]
    WrongContext,

    /// The owner context no longer accepts tasks.
    #[error("owner context closed")]
    ContextClosed,

    /// A task marshalled onto the owner context panicked.
    #[error("owner task aborted")]
    TaskAborted,

    /// The table policy refused the write buffer.
    #[error("write refused: {0}")]
    Invalid(ValidState),

    /// A field view failed during fan-out or fan-in.
    #[error("field view {name} failed: {source}")]
    Field {
        name: String,
        #[source]
        source: FieldError,
    },

    /// Error from the store, passed through unchanged.
    #[error(transparent)]
    Store(#[from] StorageError),
}
