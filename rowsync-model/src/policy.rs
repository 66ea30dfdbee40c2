use crate::{Record, RowValues, ValidState};

/// Optional type-level rules for a table, beyond what field views enforce.
///
/// Most tables do NOT need one: [`DefaultPolicy`] accepts everything and
/// reads the read-only marker column as-is.
///
/// Implement this if you need:
/// - Cross-field validation (e.g., an end date after a start date)
/// - A read-only rule other than the marker column (e.g., posted entries)
pub trait TablePolicy: Send + Sync {
    /// Validate the values a view would currently write.
    fn validate(&self, values: &RowValues) -> ValidState {
        let _ = values;
        ValidState::valid()
    }

    /// Whether a displayed row must be protected from writes.
    /// Only consulted for tables that carry the read-only marker column.
    fn is_read_only(&self, record: &Record) -> bool {
        record.is_read_only_marked()
    }
}

/// Policy used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl TablePolicy for DefaultPolicy {}
