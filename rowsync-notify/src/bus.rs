//! Change bus: per-table subscriber registry plus delivery.

use crate::error::{BusError, BusResult};
use rowsync_types::{SubscriberId, TableEvent};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

/// Callback invoked for each event on a subscribed table.
pub type TableHandler = Arc<dyn Fn(&TableEvent) + Send + Sync>;

/// Configuration for a background change bus.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Name used in log records.
    pub name: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            name: "rowsync-bus".to_string(),
        }
    }
}

enum BusMessage {
    Publish(TableEvent),
    Flush(oneshot::Sender<()>),
}

enum Delivery {
    Immediate,
    Background(mpsc::UnboundedSender<BusMessage>),
}

type Subscribers = HashMap<String, Vec<(SubscriberId, TableHandler)>>;

struct BusInner {
    name: String,
    subscribers: RwLock<Subscribers>,
    delivery: Delivery,
}

impl BusInner {
    fn handlers_for(&self, table: &str) -> Vec<TableHandler> {
        let subs = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
        subs.get(table)
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default()
    }
}

/// Publish/subscribe channel for table change events.
///
/// Cloning is cheap; clones share subscribers and delivery.
#[derive(Clone)]
pub struct ChangeBus {
    inner: Arc<BusInner>,
}

impl ChangeBus {
    /// Creates a bus that delivers on the publishing thread.
    pub fn immediate() -> Self {
        Self {
            inner: Arc::new(BusInner {
                name: "immediate".to_string(),
                subscribers: RwLock::new(HashMap::new()),
                delivery: Delivery::Immediate,
            }),
        }
    }

    /// Creates a bus whose dispatcher runs on the current tokio runtime.
    ///
    /// The dispatcher stops once every clone of the bus is dropped.
    pub fn spawn(config: BusConfig) -> BusResult<Self> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| BusError::NoRuntime)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(BusInner {
            name: config.name,
            subscribers: RwLock::new(HashMap::new()),
            delivery: Delivery::Background(tx),
        });
        handle.spawn(dispatch_loop(Arc::downgrade(&inner), rx, inner.name.clone()));
        debug!(bus = %inner.name, "change bus dispatcher started");
        Ok(Self { inner })
    }

    /// Returns the bus name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Subscribes `handler` to events on `table`.
    ///
    /// Returns `false` (and keeps the existing handler) if `id` is already
    /// subscribed to that table.
    pub fn subscribe(&self, table: &str, id: SubscriberId, handler: TableHandler) -> bool {
        let mut subs = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let list = subs.entry(table.to_string()).or_default();
        if list.iter().any(|(sid, _)| *sid == id) {
            trace!(bus = %self.inner.name, table, %id, "already subscribed");
            return false;
        }
        list.push((id, handler));
        debug!(bus = %self.inner.name, table, %id, "subscribed");
        true
    }

    /// Removes the subscription of `id` on `table`. Returns `false` if there
    /// was none.
    pub fn unsubscribe(&self, table: &str, id: SubscriberId) -> bool {
        let mut subs = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(list) = subs.get_mut(table) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sid, _)| *sid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            subs.remove(table);
        }
        if removed {
            debug!(bus = %self.inner.name, table, %id, "unsubscribed");
        }
        removed
    }

    /// Returns `true` if `id` is subscribed to `table`.
    pub fn is_subscribed(&self, table: &str, id: SubscriberId) -> bool {
        let subs = self.inner.subscribers.read().unwrap_or_else(PoisonError::into_inner);
        subs.get(table)
            .is_some_and(|list| list.iter().any(|(sid, _)| *sid == id))
    }

    /// Number of subscribers on `table`.
    pub fn subscriber_count(&self, table: &str) -> usize {
        let subs = self.inner.subscribers.read().unwrap_or_else(PoisonError::into_inner);
        subs.get(table).map_or(0, Vec::len)
    }

    /// Announces a change.
    pub fn publish(&self, event: TableEvent) -> BusResult<()> {
        match &self.inner.delivery {
            Delivery::Immediate => {
                let handlers = self.inner.handlers_for(&event.table);
                deliver(&handlers, &event);
                Ok(())
            }
            Delivery::Background(tx) => tx
                .send(BusMessage::Publish(event))
                .map_err(|_| BusError::Closed),
        }
    }

    /// Waits until every event published before this call has been delivered.
    pub async fn flush(&self) -> BusResult<()> {
        match &self.inner.delivery {
            Delivery::Immediate => Ok(()),
            Delivery::Background(tx) => {
                let (done_tx, done_rx) = oneshot::channel();
                tx.send(BusMessage::Flush(done_tx))
                    .map_err(|_| BusError::Closed)?;
                done_rx.await.map_err(|_| BusError::Closed)
            }
        }
    }
}

impl fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subs = self.inner.subscribers.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ChangeBus")
            .field("name", &self.inner.name)
            .field("tables", &subs.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn deliver(handlers: &[TableHandler], event: &TableEvent) {
    trace!(%event, event_id = %event.id, listeners = handlers.len(), "delivering");
    for handler in handlers {
        handler(event);
    }
}

async fn dispatch_loop(
    inner: Weak<BusInner>,
    mut rx: mpsc::UnboundedReceiver<BusMessage>,
    name: String,
) {
    while let Some(msg) = rx.recv().await {
        match msg {
            BusMessage::Publish(event) => {
                let Some(bus) = inner.upgrade() else {
                    break;
                };
                let handlers = bus.handlers_for(&event.table);
                drop(bus);
                if handlers.is_empty() {
                    trace!(bus = %name, %event, "no listeners");
                    continue;
                }
                // Handlers may block on store reads; keep them off the runtime workers.
                let result = tokio::task::spawn_blocking(move || deliver(&handlers, &event)).await;
                if let Err(e) = result {
                    warn!(bus = %name, "listener failed: {e}");
                }
            }
            BusMessage::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!(bus = %name, "change bus dispatcher stopped");
}
