use crate::{EditHook, FieldResult, FieldView};
use rowsync_model::{Record, RowValues, ValidState};
use std::ops::Deref;

/// Makes any field view mandatory: empty means invalid.
#[derive(Debug)]
pub struct Required<V> {
    inner: V,
}

impl<V: FieldView> Required<V> {
    pub fn new(inner: V) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> V {
        self.inner
    }
}

impl<V> Deref for Required<V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.inner
    }
}

impl<V: FieldView> FieldView for Required<V> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn show(&self, record: &Record) -> FieldResult<()> {
        self.inner.show(record)
    }

    fn reset_value(&self) -> FieldResult<()> {
        self.inner.reset_value()
    }

    fn insert(&self, values: &mut RowValues) -> FieldResult<()> {
        self.inner.insert(values)
    }

    fn update(&self, values: &mut RowValues) -> FieldResult<()> {
        self.inner.update(values)
    }

    fn fields(&self) -> Vec<String> {
        self.inner.fields()
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn validity(&self) -> ValidState {
        let own = if self.inner.is_empty() {
            ValidState::invalid(format!("{} is required", self.inner.name()))
        } else {
            ValidState::valid()
        };
        own.and(self.inner.validity())
    }

    fn set_edit_hook(&self, hook: EditHook) {
        self.inner.set_edit_hook(hook);
    }
}
