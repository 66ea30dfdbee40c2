//! Table change notification bus for rowsync.
//!
//! A store announces every committed write as a [`TableEvent`]; the
//! [`ChangeBus`] fans each event out to the handlers subscribed to that
//! event's table.
//!
//! # Delivery
//!
//! - [`ChangeBus::immediate`] runs handlers on the publishing thread.
//! - [`ChangeBus::spawn`] moves delivery onto a dispatcher task of the
//!   current tokio runtime. Events are delivered one at a time in publish
//!   order, so two events for the same record are never reordered.
//!
//! Handlers run outside any bus lock and may subscribe or unsubscribe
//! from inside a delivery. A handler that owns state confined to another
//! execution context must marshal into it before touching that state.
//!
//! # Example
//!
//! ```
//! use rowsync_notify::ChangeBus;
//! use rowsync_types::{RecordId, SubscriberId, TableEvent};
//! use std::sync::Arc;
//!
//! let bus = ChangeBus::immediate();
//! let id = SubscriberId::new();
//! bus.subscribe("INVOICE", id, Arc::new(|ev: &TableEvent| println!("{ev}")));
//! bus.publish(TableEvent::updated("INVOICE", RecordId::new(1))).unwrap();
//! ```

mod bus;
mod error;

pub use bus::{BusConfig, ChangeBus, TableHandler};
pub use error::{BusError, BusResult};
pub use rowsync_types::{ChangeKind, TableEvent};
