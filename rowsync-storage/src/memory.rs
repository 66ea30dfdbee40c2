//! In-memory row store.

use crate::{RowStore, StorageError, StorageResult};
use rowsync_model::{OrderHint, Record, RowValues, Table};
use rowsync_notify::ChangeBus;
use rowsync_types::{RecordId, TableEvent};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

type Row = Map<String, Value>;

struct TableData {
    table: Arc<Table>,
    rows: BTreeMap<RecordId, Row>,
    next_id: i64,
}

impl TableData {
    fn new(table: Arc<Table>) -> Self {
        let mut rows = BTreeMap::new();
        let mut next_id = 1;
        if let Some(undefined) = table.undefined_id() {
            let mut row = Row::new();
            if let Some(order) = table.order_field() {
                row.insert(order.to_string(), Value::from(0.0));
            }
            rows.insert(undefined, row);
            next_id = next_id.max(undefined.get() + 1);
        }
        Self {
            table,
            rows,
            next_id,
        }
    }

    fn row(&self, id: RecordId) -> StorageResult<&Row> {
        self.rows.get(&id).ok_or_else(|| StorageError::NotFound {
            table: self.table.name().to_string(),
            id,
        })
    }

    fn order_of(&self, row: &Row) -> f64 {
        self.table
            .order_field()
            .and_then(|f| row.get(f))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    fn orders(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.values().map(|r| self.order_of(r))
    }

    /// Order value for a new row.
    fn next_order(&self, hint: Option<OrderHint>) -> StorageResult<f64> {
        let Some(hint) = hint else {
            return Ok(self.orders().fold(0.0, f64::max) + 1.0);
        };
        match hint {
            OrderHint::After(id) => {
                let pivot = self.order_of(self.row(id)?);
                let next = self.orders().filter(|o| *o > pivot).reduce(f64::min);
                Ok(next.map_or(pivot + 1.0, |n| (pivot + n) / 2.0))
            }
            OrderHint::Before(id) => {
                let pivot = self.order_of(self.row(id)?);
                let prev = self.orders().filter(|o| *o < pivot).reduce(f64::max);
                Ok(prev.map_or(pivot - 1.0, |p| (pivot + p) / 2.0))
            }
        }
    }

    fn check_columns(&self, values: &RowValues) -> StorageResult<()> {
        for (name, value) in values.iter() {
            let Some(def) = self.table.field(name) else {
                return Err(StorageError::UnknownField {
                    table: self.table.name().to_string(),
                    field: name.clone(),
                });
            };
            if !def.nullable && value.is_null() {
                return Err(StorageError::Constraint(format!(
                    "{}.{} cannot be null",
                    self.table.name(),
                    name
                )));
            }
            if !def.accepts(value) {
                return Err(StorageError::InvalidData(format!(
                    "{}.{}: {} is not a valid {:?}",
                    self.table.name(),
                    name,
                    value,
                    def.field_type
                )));
            }
        }
        Ok(())
    }

    fn check_required(&self, row: &Row) -> StorageResult<()> {
        for def in self.table.fields().iter().filter(|f| !f.nullable) {
            if row.get(&def.name).is_none_or(Value::is_null) {
                return Err(StorageError::Constraint(format!(
                    "{}.{} is required",
                    self.table.name(),
                    def.name
                )));
            }
        }
        Ok(())
    }
}

/// A [`RowStore`] holding every table in memory.
///
/// Tables must be registered before use. A table's placeholder row, if it
/// declares one, is created on registration. Every committed write is
/// announced on the attached bus, after the store lock is released.
pub struct MemoryStore {
    tables: RwLock<HashMap<String, TableData>>,
    bus: Option<ChangeBus>,
}

impl MemoryStore {
    /// Creates a store that publishes nothing.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            bus: None,
        }
    }

    /// Creates a store that announces its writes on `bus`.
    pub fn with_bus(bus: ChangeBus) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            bus: Some(bus),
        }
    }

    /// Registers a table. Registering the same name again resets its rows.
    pub fn register_table(&self, table: Arc<Table>) {
        debug!(table = table.name(), "registering table");
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.insert(table.name().to_string(), TableData::new(table));
    }

    /// Number of rows in a table, the placeholder row included.
    pub fn row_count(&self, table: &str) -> StorageResult<usize> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .get(table)
            .map(|t| t.rows.len())
            .ok_or_else(|| StorageError::UnknownTable(table.to_string()))
    }

    /// Row ids of a table sorted by display order, then by id.
    pub fn ids_in_order(&self, table: &str) -> StorageResult<Vec<RecordId>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let data = tables
            .get(table)
            .ok_or_else(|| StorageError::UnknownTable(table.to_string()))?;
        let mut ids: Vec<(f64, RecordId)> = data
            .rows
            .iter()
            .map(|(id, row)| (data.order_of(row), *id))
            .collect();
        ids.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    /// Removes a row and announces the deletion.
    pub fn delete_row(&self, table: &Table, id: RecordId) -> StorageResult<()> {
        {
            let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
            let data = Self::data_mut(&mut tables, table.name())?;
            data.row(id)?;
            data.rows.remove(&id);
        }
        debug!(table = table.name(), %id, "deleted row");
        self.announce(TableEvent::deleted(table.name(), id));
        Ok(())
    }

    fn data_mut<'a>(
        tables: &'a mut HashMap<String, TableData>,
        name: &str,
    ) -> StorageResult<&'a mut TableData> {
        tables
            .get_mut(name)
            .ok_or_else(|| StorageError::UnknownTable(name.to_string()))
    }

    fn announce(&self, event: TableEvent) {
        if let Some(bus) = &self.bus {
            if let Err(e) = bus.publish(event) {
                warn!("failed to announce change: {e}");
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RowStore for MemoryStore {
    fn fetch_row(&self, table: &Table, id: RecordId) -> StorageResult<Option<Record>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let data = tables
            .get(table.name())
            .ok_or_else(|| StorageError::UnknownTable(table.name().to_string()))?;
        Ok(data.rows.get(&id).map(|row| {
            let mut values = row.clone();
            if let Some(pk) = table.primary_key() {
                values.insert(pk.to_string(), Value::from(id.get()));
            }
            Record {
                table: table.name().to_string(),
                id: Some(id),
                values,
            }
        }))
    }

    fn submit_insert(
        &self,
        table: &Table,
        mut values: RowValues,
        order: Option<OrderHint>,
    ) -> StorageResult<RecordId> {
        let id = {
            let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
            let data = Self::data_mut(&mut tables, table.name())?;
            if let Some(pk) = table.primary_key() {
                values.remove(pk);
            }
            data.check_columns(&values)?;
            match table.order_field() {
                Some(field) => {
                    let position = data.next_order(order)?;
                    values.put(field, position);
                }
                None if order.is_some() => {
                    return Err(StorageError::InvalidData(format!(
                        "{} has no order field",
                        table.name()
                    )));
                }
                None => {}
            }
            let row = values.into_map();
            data.check_required(&row)?;

            let id = RecordId::new(data.next_id);
            data.next_id += 1;
            data.rows.insert(id, row);
            id
        };
        debug!(table = table.name(), %id, "inserted row");
        self.announce(TableEvent::added(table.name(), id));
        Ok(id)
    }

    fn submit_update(&self, table: &Table, id: RecordId, mut values: RowValues) -> StorageResult<()> {
        {
            let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
            let data = Self::data_mut(&mut tables, table.name())?;
            data.row(id)?;
            if let Some(pk) = table.primary_key() {
                values.remove(pk);
            }
            data.check_columns(&values)?;
            if let Some(row) = data.rows.get_mut(&id) {
                row.extend(values.into_map());
            }
        }
        debug!(table = table.name(), %id, "updated row");
        self.announce(TableEvent::updated(table.name(), id));
        Ok(())
    }
}
