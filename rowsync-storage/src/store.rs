use crate::StorageResult;
use rowsync_model::{OrderHint, Record, RowValues, Table};
use rowsync_types::RecordId;

/// The store contract consumed by a record view.
///
/// Implementations are shared across many views and threads. Calls block
/// until the store answers; callers that must not block dispatch them onto
/// a worker themselves.
pub trait RowStore: Send + Sync {
    /// Reads one row. `Ok(None)` means the row does not exist.
    fn fetch_row(&self, table: &Table, id: RecordId) -> StorageResult<Option<Record>>;

    /// Creates a row from `values` and returns its identity.
    ///
    /// With a hint, the row is placed next to the hinted row in the table's
    /// display order.
    fn submit_insert(
        &self,
        table: &Table,
        values: RowValues,
        order: Option<OrderHint>,
    ) -> StorageResult<RecordId>;

    /// Replaces the supplied columns of an existing row.
    fn submit_update(&self, table: &Table, id: RecordId, values: RowValues) -> StorageResult<()>;
}
