//! Record view for rowsync.
//!
//! A [`RecordView`] binds an ordered set of [`FieldView`]s to one row of one
//! table and keeps them consistent with the store:
//!
//! - **select** pushes a snapshot into every field view (fan-out)
//! - **insert / update** pull edited values out into a write buffer and
//!   submit it (fan-in)
//! - **remote changes** to the displayed row, announced on a
//!   [`rowsync_notify::ChangeBus`], re-select it or reset the view
//!
//! # Threading
//!
//! State and field views are confined to one [`OwnerContext`]. Only
//! [`RecordView::select_id`] and [`RecordView::select_id_async`] may be
//! called from another thread; they fetch there and apply the row on the
//! owner, handing back the outcome. Remote change events and field edits
//! are marshalled the same way. `filling` and `updating` live behind a single
//! lock and are released by scope guards on every exit path.
//!
//! # Example
//!
//! ```
//! use rowsync_model::{FieldDef, Record, Table};
//! use rowsync_notify::ChangeBus;
//! use rowsync_storage::MemoryStore;
//! use rowsync_types::RecordId;
//! use rowsync_view::{OwnerContext, RecordView, ValueView};
//! use std::sync::Arc;
//!
//! let table = Arc::new(Table::new("CLIENT").with_field(FieldDef::text("NAME")));
//! let bus = ChangeBus::immediate();
//! let store = Arc::new(MemoryStore::with_bus(bus.clone()));
//! store.register_table(Arc::clone(&table));
//!
//! let view = RecordView::new(table, store, bus, OwnerContext::inline()).unwrap();
//! let name = Arc::new(ValueView::text("NAME"));
//! view.register(name.clone()).unwrap();
//! view.activate(true).unwrap();
//!
//! view.select(Some(&Record::new("CLIENT", RecordId::new(7)).with("NAME", "Acme"))).unwrap();
//! assert_eq!(view.selected_id(), RecordId::new(7));
//! assert_eq!(name.value(), "Acme");
//! ```

mod context;
mod error;
mod field;
pub mod fields;
mod observers;
mod record_view;
mod registry;
mod state;

pub use context::{OwnerConfig, OwnerContext, OwnerThread};
pub use error::{FieldError, FieldResult, ViewError, ViewResult};
pub use field::{EditHook, FieldView};
pub use fields::{FieldKind, Required, SubRecordView, ValueView};
pub use observers::{Listener, Property, ViewEvent};
pub use record_view::RecordView;
pub use state::ViewPhase;
