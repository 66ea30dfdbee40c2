//! Observers of a record view's exposed properties.

use rowsync_model::ValidState;
use rowsync_types::{ListenerId, RecordId};
use std::sync::{Arc, PoisonError, RwLock};

/// A property dependents can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    SelectedId,
    Filling,
    ReadOnlySelection,
    Validity,
}

/// A property change. Only emitted when the value actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    SelectedId(RecordId),
    Filling(bool),
    ReadOnlySelection(bool),
    Validity(ValidState),
}

impl ViewEvent {
    pub fn property(&self) -> Property {
        match self {
            ViewEvent::SelectedId(_) => Property::SelectedId,
            ViewEvent::Filling(_) => Property::Filling,
            ViewEvent::ReadOnlySelection(_) => Property::ReadOnlySelection,
            ViewEvent::Validity(_) => Property::Validity,
        }
    }
}

/// Callback for property changes.
pub type Listener = Arc<dyn Fn(&ViewEvent) + Send + Sync>;

struct Entry {
    id: ListenerId,
    filter: Option<Property>,
    listener: Listener,
}

#[derive(Default)]
pub(crate) struct Observers {
    entries: RwLock<Vec<Entry>>,
}

impl Observers {
    pub(crate) fn add(&self, filter: Option<Property>, listener: Listener) -> ListenerId {
        let id = ListenerId::new();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Entry {
                id,
                filter,
                listener,
            });
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    /// Calls every matching listener. Listeners run without the lock held,
    /// so they may add or remove listeners.
    pub(crate) fn notify(&self, event: &ViewEvent) {
        let property = event.property();
        let targets: Vec<Listener> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.filter.is_none_or(|p| p == property))
            .map(|e| Arc::clone(&e.listener))
            .collect();
        for listener in targets {
            listener(event);
        }
    }
}
