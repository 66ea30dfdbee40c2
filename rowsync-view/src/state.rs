//! Flag state of a record view and its transitions.

use crate::observers::ViewEvent;
use crate::{ViewError, ViewResult};
use rowsync_model::ValidState;
use rowsync_types::RecordId;

/// Where a record view is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    /// No stored row is displayed.
    Empty,
    /// A stored row is displayed and no operation is running.
    Displaying,
    /// Values are being pushed into the field views.
    Filling,
    /// An update of the displayed row is in flight.
    Writing,
}

/// Everything a record view mutates, kept behind one lock.
///
/// Setters return the event to publish, or `None` when the value did not
/// change.
#[derive(Debug)]
pub(crate) struct RowState {
    pub(crate) selected: RecordId,
    /// Nesting depth of running selects.
    filling: u32,
    pub(crate) updating: bool,
    pub(crate) read_only: bool,
    pub(crate) active: bool,
    /// Set on first activation; no registration afterwards.
    pub(crate) sealed: bool,
    pub(crate) local_validity: ValidState,
    /// Table policy verdict on the last write buffer, until the next select.
    pub(crate) policy_validity: ValidState,
    pub(crate) validity: ValidState,
}

impl Default for RowState {
    fn default() -> Self {
        Self {
            selected: RecordId::NONE,
            filling: 0,
            updating: false,
            read_only: false,
            active: false,
            sealed: false,
            local_validity: ValidState::valid(),
            policy_validity: ValidState::valid(),
            validity: ValidState::valid(),
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

impl RowState {
    pub(crate) fn phase(&self) -> ViewPhase {
        if self.filling > 0 {
            ViewPhase::Filling
        } else if self.updating {
            ViewPhase::Writing
        } else if self.selected.is_some() {
            ViewPhase::Displaying
        } else {
            ViewPhase::Empty
        }
    }

    pub(crate) fn is_filling(&self) -> bool {
        self.filling > 0
    }

    pub(crate) fn set_selected(&mut self, id: RecordId) -> Option<ViewEvent> {
        replace(&mut self.selected, id).then_some(ViewEvent::SelectedId(id))
    }

    pub(crate) fn set_read_only(&mut self, read_only: bool) -> Option<ViewEvent> {
        replace(&mut self.read_only, read_only).then_some(ViewEvent::ReadOnlySelection(read_only))
    }

    pub(crate) fn set_validity(&mut self, validity: ValidState) -> Option<ViewEvent> {
        if replace(&mut self.validity, validity) {
            Some(ViewEvent::Validity(self.validity.clone()))
        } else {
            None
        }
    }

    pub(crate) fn enter_filling(&mut self) -> Option<ViewEvent> {
        self.filling += 1;
        (self.filling == 1).then_some(ViewEvent::Filling(true))
    }

    pub(crate) fn leave_filling(&mut self) -> Option<ViewEvent> {
        if self.filling == 0 {
            return None;
        }
        self.filling -= 1;
        (self.filling == 0).then_some(ViewEvent::Filling(false))
    }

    /// Writes are refused on a read-only selection, while filling, and while
    /// another write is in flight.
    pub(crate) fn check_can_write(&self) -> ViewResult<()> {
        if self.read_only {
            return Err(ViewError::ReadOnly);
        }
        if self.is_filling() {
            return Err(ViewError::IllegalState("write requested while filling".into()));
        }
        if self.updating {
            return Err(ViewError::IllegalState("write requested while updating".into()));
        }
        Ok(())
    }

    /// Whether remote changes to the displayed row should be pulled in now.
    pub(crate) fn follows_remote(&self) -> bool {
        self.active && !self.updating && self.selected.is_some()
    }
}
