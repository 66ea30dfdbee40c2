use rowsync_types::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the column that flags a row as read-only.
pub const READ_ONLY_FIELD: &str = "READ_ONLY";

/// String value of [`READ_ONLY_FIELD`] that marks a row read-only.
pub const READ_ONLY_VALUE: &str = "READ_ONLY";

/// Describes an entity type: a homogeneous collection of rows in the store.
///
/// A table is immutable once a record view is bound to it, so it is shared
/// as `Arc<Table>` between views and stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    /// Identity column. A table without one is not viewable.
    primary_key: Option<String>,
    /// Placeholder row that must never be written through a view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    undefined_id: Option<RecordId>,
    /// Column holding the display order, if the table maintains one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order_field: Option<String>,
    fields: Vec<FieldDef>,
}

impl Table {
    /// Creates a viewable table whose identity column is `ID`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: Some("ID".into()),
            undefined_id: None,
            order_field: None,
            fields: Vec::new(),
        }
    }

    /// Replaces the identity column name.
    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Removes the identity column, making the table not viewable.
    pub fn without_primary_key(mut self) -> Self {
        self.primary_key = None;
        self
    }

    /// Declares the placeholder row.
    pub fn with_undefined_id(mut self, id: RecordId) -> Self {
        self.undefined_id = Some(id);
        self
    }

    /// Declares an order column. It is added as a non-null number field.
    pub fn with_order_field(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        self.fields.push(FieldDef::number(&column).not_null());
        self.order_field = Some(column);
        self
    }

    /// Adds the [`READ_ONLY_FIELD`] marker column. It holds either null or
    /// [`READ_ONLY_VALUE`].
    pub fn with_read_only_marker(mut self) -> Self {
        self.fields.push(FieldDef::enumeration(
            READ_ONLY_FIELD,
            vec![READ_ONLY_VALUE.to_string()],
        ));
        self
    }

    /// Adds a field definition.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A table is viewable only if its rows have a stable identity.
    pub fn is_rowable(&self) -> bool {
        self.primary_key.is_some()
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn undefined_id(&self) -> Option<RecordId> {
        self.undefined_id
    }

    /// Returns `true` if `id` is this table's placeholder row.
    pub fn is_undefined(&self, id: RecordId) -> bool {
        self.undefined_id == Some(id)
    }

    pub fn order_field(&self) -> Option<&str> {
        self.order_field.as_deref()
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn has_read_only_marker(&self) -> bool {
        self.contains(READ_ONLY_FIELD)
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    /// `false` makes the store reject null or missing values.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Allowed values. Only meaningful when `field_type` is `Enum`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_options: Option<Vec<String>>,
}

fn default_nullable() -> bool {
    true
}

impl FieldDef {
    fn simple(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: true,
            enum_options: None,
        }
    }

    /// Shorthand for a text field.
    pub fn text(name: &str) -> Self {
        Self::simple(name, FieldType::Text)
    }

    /// Shorthand for a numeric field.
    pub fn number(name: &str) -> Self {
        Self::simple(name, FieldType::Number)
    }

    /// Shorthand for a decimal field: a number, or a string holding one.
    pub fn decimal(name: &str) -> Self {
        Self::simple(name, FieldType::Decimal)
    }

    /// Shorthand for a boolean field.
    pub fn bool(name: &str) -> Self {
        Self::simple(name, FieldType::Bool)
    }

    /// Shorthand for a DateTime field, stored as an RFC 3339 string.
    pub fn datetime(name: &str) -> Self {
        Self::simple(name, FieldType::DateTime)
    }

    /// Shorthand for a foreign key to another table: the target row's id.
    pub fn relation(name: &str) -> Self {
        Self::simple(name, FieldType::Relation)
    }

    /// Shorthand for an enum field with fixed options.
    pub fn enumeration(name: &str, options: Vec<String>) -> Self {
        Self {
            enum_options: Some(options),
            ..Self::simple(name, FieldType::Enum)
        }
    }

    /// Marks the field as required at the store level.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Whether `value` has this field's type. Null always does; whether it
    /// is allowed is [`nullable`](Self::nullable)'s business.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self.field_type, value) {
            (_, Value::Null) => true,
            (FieldType::Text | FieldType::DateTime, Value::String(_)) => true,
            (FieldType::Number, Value::Number(_)) => true,
            (FieldType::Decimal, Value::Number(_)) => true,
            (FieldType::Decimal, Value::String(s)) => s.trim().parse::<f64>().is_ok(),
            (FieldType::Bool, Value::Bool(_)) => true,
            (FieldType::Relation, Value::Number(n)) => n.is_i64(),
            (FieldType::Enum, Value::String(s)) => self
                .enum_options
                .as_ref()
                .is_some_and(|options| options.iter().any(|o| o == s)),
            _ => false,
        }
    }
}

/// The data type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Decimal,
    Bool,
    DateTime,
    Relation,
    Enum,
}
