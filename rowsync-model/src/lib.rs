//! Core data model for rowsync.
//!
//! Defines the types every layer of a record view talks in:
//! - [`Table`]: an entity type with its identity column, fields and markers
//! - [`Record`]: a read-only snapshot of one row's values
//! - [`RowValues`]: the write buffer assembled for one insert or update
//! - [`ValidState`]: a combinable "valid / invalid with reason" value
//! - [`TablePolicy`]: optional type-level validation and read-only rules
//!
//! These types are consumed by storage, the change bus and the record view.
//! They form the contract between field views and the store.

mod policy;
mod record;
mod table;
mod validity;
mod values;

pub use policy::{DefaultPolicy, TablePolicy};
pub use record::Record;
pub use table::{FieldDef, FieldType, Table, READ_ONLY_FIELD, READ_ONLY_VALUE};
pub use validity::ValidState;
pub use values::{OrderHint, RowRef, RowValues};
