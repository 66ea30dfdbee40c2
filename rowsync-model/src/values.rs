use rowsync_types::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Write buffer for one insert or update.
///
/// Field views contribute into it by name, in fan-in order. A later view can
/// read what an earlier one wrote. The buffer is dropped once submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowValues {
    table: String,
    values: Map<String, Value>,
}

impl RowValues {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            values: Map::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Sets a value, returning the previous one.
    pub fn put(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(field.into(), value.into())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.values.remove(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

/// Where a newly inserted row goes in a table's display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderHint {
    /// Directly after the given row.
    After(RecordId),
    /// Directly before the given row.
    Before(RecordId),
}

/// Reference to a stored row, as returned by an insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowRef {
    pub table: String,
    pub id: RecordId,
}

impl RowRef {
    pub fn new(table: impl Into<String>, id: RecordId) -> Self {
        Self {
            table: table.into(),
            id,
        }
    }
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.table, self.id)
    }
}
