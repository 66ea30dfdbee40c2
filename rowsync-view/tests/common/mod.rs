#![allow(dead_code)]

use rowsync_model::{FieldDef, Record, RowValues, Table};
use rowsync_notify::ChangeBus;
use rowsync_storage::{MemoryStore, RowStore};
use rowsync_types::RecordId;
use rowsync_view::{FieldResult, FieldView, OwnerContext, RecordView};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn invoice_table() -> Arc<Table> {
    Arc::new(
        Table::new("INVOICE")
            .with_field(FieldDef::text("NAME"))
            .with_field(FieldDef::number("AMOUNT").not_null()),
    )
}

/// A view, its store and its bus, all synchronous.
pub struct Fixture {
    pub table: Arc<Table>,
    pub bus: ChangeBus,
    pub store: Arc<MemoryStore>,
    pub view: Arc<RecordView>,
}

impl Fixture {
    pub fn new(table: Arc<Table>) -> Self {
        init_tracing();
        let bus = ChangeBus::immediate();
        let store = Arc::new(MemoryStore::with_bus(bus.clone()));
        store.register_table(Arc::clone(&table));
        let view = RecordView::new(
            Arc::clone(&table),
            Arc::clone(&store) as Arc<dyn RowStore>,
            bus.clone(),
            OwnerContext::inline(),
        )
        .unwrap();
        Self {
            table,
            bus,
            store,
            view,
        }
    }

    pub fn invoice() -> Self {
        Self::new(invoice_table())
    }

    /// Stores a row and returns its identity.
    pub fn seed(&self, pairs: &[(&str, Value)]) -> RecordId {
        let mut values = RowValues::new(self.table.name());
        for (k, v) in pairs {
            values.put(*k, v.clone());
        }
        self.store.submit_insert(&self.table, values, None).unwrap()
    }

    pub fn fetch(&self, id: RecordId) -> Record {
        self.store.fetch_row(&self.table, id).unwrap().unwrap()
    }
}

/// Records every call made on it.
pub struct SpyView {
    name: String,
    pub shows: AtomicUsize,
    pub resets: AtomicUsize,
    pub inserts: AtomicUsize,
    pub last_shown: Mutex<Option<Record>>,
}

impl SpyView {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            shows: AtomicUsize::new(0),
            resets: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
            last_shown: Mutex::new(None),
        })
    }

    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

impl FieldView for SpyView {
    fn name(&self) -> &str {
        &self.name
    }

    fn show(&self, record: &Record) -> FieldResult<()> {
        self.shows.fetch_add(1, Ordering::SeqCst);
        *self.last_shown.lock().unwrap() = Some(record.clone());
        Ok(())
    }

    fn reset_value(&self) -> FieldResult<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        *self.last_shown.lock().unwrap() = None;
        Ok(())
    }

    fn insert(&self, _values: &mut RowValues) -> FieldResult<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn fields(&self) -> Vec<String> {
        Vec::new()
    }
}
