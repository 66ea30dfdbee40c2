use crate::table::{READ_ONLY_FIELD, READ_ONLY_VALUE};
use rowsync_types::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A read-only snapshot of one row, as returned by the store.
///
/// `id` is `None` for values that are not (yet) bound to a stored row, for
/// example a template assembled in memory before the first insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub table: String,
    pub id: Option<RecordId>,
    pub values: Map<String, Value>,
}

impl Record {
    /// Creates an empty snapshot of a stored row.
    pub fn new(table: impl Into<String>, id: RecordId) -> Self {
        Self {
            table: table.into(),
            id: Some(id),
            values: Map::new(),
        }
    }

    /// Creates an empty snapshot with no identity.
    pub fn detached(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            id: None,
            values: Map::new(),
        }
    }

    /// Sets one value, builder style.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.values.insert(field.to_string(), value.into());
        self
    }

    /// Returns the identity if the snapshot is bound to a stored row.
    pub fn real_id(&self) -> Option<RecordId> {
        self.id.filter(|id| id.is_some())
    }

    /// Returns the raw value of a field. Missing and `null` are both `None`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field).filter(|v| !v.is_null())
    }

    /// Extract a string value.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(|v| v.as_str())
    }

    /// Extract a boolean value.
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(|v| v.as_bool())
    }

    /// Extract a numeric value.
    pub fn get_number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(|v| v.as_f64())
    }

    /// Extract an integer value.
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(|v| v.as_i64())
    }

    /// Returns `true` if the row carries the read-only marker.
    ///
    /// The marker column holds either `true` or the string `READ_ONLY`.
    pub fn is_read_only_marked(&self) -> bool {
        match self.get(READ_ONLY_FIELD) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == READ_ONLY_VALUE,
            _ => false,
        }
    }
}
