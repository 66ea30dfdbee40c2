use crate::{EditHook, FieldResult, FieldView};
use rowsync_model::{Record, RowValues, ValidState};
use std::sync::Arc;

/// Several field views acting as one, e.g. an address block.
///
/// Children are shown and written in the order they were added.
pub struct SubRecordView {
    name: String,
    children: Vec<Arc<dyn FieldView>>,
}

impl SubRecordView {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Arc<dyn FieldView>) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(&self) -> &[Arc<dyn FieldView>] {
        &self.children
    }
}

impl FieldView for SubRecordView {
    fn name(&self) -> &str {
        &self.name
    }

    fn show(&self, record: &Record) -> FieldResult<()> {
        self.children.iter().try_for_each(|c| c.show(record))
    }

    fn reset_value(&self) -> FieldResult<()> {
        self.children.iter().try_for_each(|c| c.reset_value())
    }

    fn insert(&self, values: &mut RowValues) -> FieldResult<()> {
        self.children.iter().try_for_each(|c| c.insert(values))
    }

    fn update(&self, values: &mut RowValues) -> FieldResult<()> {
        self.children.iter().try_for_each(|c| c.update(values))
    }

    fn fields(&self) -> Vec<String> {
        self.children.iter().flat_map(|c| c.fields()).collect()
    }

    fn is_empty(&self) -> bool {
        self.children.iter().all(|c| c.is_empty())
    }

    fn validity(&self) -> ValidState {
        self.children.iter().map(|c| c.validity()).collect()
    }

    /// Edits of any child are reported under this view's name.
    fn set_edit_hook(&self, hook: EditHook) {
        let name = self.name.clone();
        let hook: EditHook = Arc::new(move |_: &str| hook(name.as_str()));
        for child in &self.children {
            child.set_edit_hook(Arc::clone(&hook));
        }
    }
}
