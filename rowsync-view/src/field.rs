use crate::FieldResult;
use rowsync_model::{Record, RowValues, ValidState};
use std::sync::Arc;

/// Called by a field view after the user edited it, with the view's name.
pub type EditHook = Arc<dyn Fn(&str) + Send + Sync>;

/// A bound, editable proxy for one named field of the displayed record.
///
/// The record view drives every implementation through this capability
/// set: it pushes values in with [`show`](FieldView::show) and
/// [`reset_value`](FieldView::reset_value), and pulls edited values out with
/// [`insert`](FieldView::insert) and [`update`](FieldView::update). Callers
/// edit the view directly. A view that reports edits through the hook given
/// to [`set_edit_hook`](FieldView::set_edit_hook) keeps the record view's
/// validity current; otherwise the edits surface at the next write.
///
/// Methods take `&self`: views are shared between the record view and the
/// code that edits them, so implementations keep their value behind
/// interior mutability.
pub trait FieldView: Send + Sync {
    /// Unique name within a record view, usually the column name.
    fn name(&self) -> &str;

    /// Displays the values of `record`.
    fn show(&self, record: &Record) -> FieldResult<()>;

    /// Displays the empty/default state.
    fn reset_value(&self) -> FieldResult<()>;

    /// Contributes the current value for a new row.
    fn insert(&self, values: &mut RowValues) -> FieldResult<()>;

    /// Contributes the current value for an update of the displayed row.
    /// A view may contribute nothing, e.g. when its value is unchanged.
    fn update(&self, values: &mut RowValues) -> FieldResult<()> {
        self.insert(values)
    }

    /// Store columns this view reads.
    fn fields(&self) -> Vec<String>;

    /// Whether the view currently holds no value.
    fn is_empty(&self) -> bool {
        false
    }

    /// This view's contribution to the record view's validity.
    fn validity(&self) -> ValidState {
        ValidState::valid()
    }

    /// Installed by the record view on registration. Views that are never
    /// edited directly can ignore it.
    fn set_edit_hook(&self, hook: EditHook) {
        let _ = hook;
    }
}
