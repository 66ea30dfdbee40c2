use crate::{EditHook, FieldError, FieldResult, FieldView};
use rowsync_model::{Record, RowValues};
use serde_json::Value;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// What a [`ValueView`] holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Any JSON number.
    Number,
    /// One of a fixed set of strings.
    Choice(Vec<String>),
    /// A boolean.
    Check,
}

impl FieldKind {
    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldKind::Text, Value::String(_)) => true,
            (FieldKind::Number, Value::Number(_)) => true,
            (FieldKind::Choice(options), Value::String(s)) => options.iter().any(|o| o == s),
            (FieldKind::Check, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug)]
struct Slot {
    value: Value,
    /// Edited since the last show or reset.
    modified: bool,
}

/// A field view bound to one column, holding a single value.
///
/// On update it only contributes once edited, so an update writes back
/// just what the user changed. A display-only view never contributes.
pub struct ValueView {
    field: String,
    kind: FieldKind,
    editable: bool,
    slot: Mutex<Slot>,
    hook: Mutex<Option<EditHook>>,
}

impl ValueView {
    pub fn new(field: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            field: field.into(),
            kind,
            editable: true,
            slot: Mutex::new(Slot {
                value: Value::Null,
                modified: false,
            }),
            hook: Mutex::new(None),
        }
    }

    pub fn text(field: impl Into<String>) -> Self {
        Self::new(field, FieldKind::Text)
    }

    pub fn number(field: impl Into<String>) -> Self {
        Self::new(field, FieldKind::Number)
    }

    pub fn choice(field: impl Into<String>, options: Vec<String>) -> Self {
        Self::new(field, FieldKind::Choice(options))
    }

    pub fn check(field: impl Into<String>) -> Self {
        Self::new(field, FieldKind::Check)
    }

    /// Makes the view display-only.
    pub fn display_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn checked(&self, value: Value) -> FieldResult<Value> {
        if self.kind.accepts(&value) {
            Ok(value)
        } else {
            Err(FieldError::UnexpectedValue {
                field: self.field.clone(),
                value,
            })
        }
    }

    /// Edits the value, as a user typing into the widget would.
    pub fn set_value(&self, value: impl Into<Value>) -> FieldResult<()> {
        if !self.editable {
            return Err(FieldError::Rejected(format!("{} is display-only", self.field)));
        }
        let value = self.checked(value.into())?;
        {
            let mut slot = self.slot();
            slot.value = value;
            slot.modified = true;
        }
        let hook = self.hook.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(hook) = hook {
            hook(self.field.as_str());
        }
        Ok(())
    }

    /// Empties the value, as an edit.
    pub fn clear(&self) -> FieldResult<()> {
        self.set_value(Value::Null)
    }

    pub fn value(&self) -> Value {
        self.slot().value.clone()
    }

    pub fn is_modified(&self) -> bool {
        self.slot().modified
    }
}

impl FieldView for ValueView {
    fn name(&self) -> &str {
        &self.field
    }

    fn show(&self, record: &Record) -> FieldResult<()> {
        let value = self.checked(record.get(&self.field).cloned().unwrap_or(Value::Null))?;
        let mut slot = self.slot();
        slot.value = value;
        slot.modified = false;
        Ok(())
    }

    fn reset_value(&self) -> FieldResult<()> {
        let mut slot = self.slot();
        slot.value = Value::Null;
        slot.modified = false;
        Ok(())
    }

    fn insert(&self, values: &mut RowValues) -> FieldResult<()> {
        if self.editable {
            values.put(self.field.as_str(), self.value());
        }
        Ok(())
    }

    fn update(&self, values: &mut RowValues) -> FieldResult<()> {
        if self.editable && self.is_modified() {
            values.put(self.field.as_str(), self.value());
        }
        Ok(())
    }

    fn fields(&self) -> Vec<String> {
        vec![self.field.clone()]
    }

    fn is_empty(&self) -> bool {
        match &self.slot().value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    fn set_edit_hook(&self, hook: EditHook) {
        *self.hook.lock().unwrap_or_else(PoisonError::into_inner) = Some(hook);
    }
}

impl fmt::Debug for ValueView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueView")
            .field("field", &self.field)
            .field("kind", &self.kind)
            .field("editable", &self.editable)
            .field("slot", &*self.slot())
            .finish_non_exhaustive()
    }
}
