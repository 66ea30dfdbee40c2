//! Storage layer for rowsync.
//!
//! A record view never talks to a database directly. It talks to a
//! [`RowStore`]: three calls (fetch one row, insert one row, update one row)
//! whose errors are passed to the caller untouched.
//!
//! # Architecture
//!
//! - [`RowStore`] is the contract every backend implements
//! - [`MemoryStore`] is the reference backend: tables in memory, not-null
//!   constraints, display-order columns, and change events published on a
//!   [`rowsync_notify::ChangeBus`] after each committed write

mod error;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use store::RowStore;
