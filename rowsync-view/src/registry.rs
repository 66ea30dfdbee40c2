//! Field view registry: name lookup plus the fan-out/fan-in order.

use crate::{FieldView, ViewError, ViewResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Field views by name, plus the order they are shown and written in.
///
/// `by_name` and `order` always hold the same names.
#[derive(Default)]
pub(crate) struct Registry {
    by_name: HashMap<String, Arc<dyn FieldView>>,
    order: Vec<String>,
}

impl Registry {
    pub(crate) fn register(&mut self, view: Arc<dyn FieldView>) -> ViewResult<()> {
        let name = view.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(ViewError::DuplicateName(name));
        }
        self.order.push(name.clone());
        self.by_name.insert(name, view);
        debug_assert_eq!(self.order.len(), self.by_name.len());
        Ok(())
    }

    /// Replaces the order. `names` must be a permutation of the registered
    /// names; a repeated name counts once.
    pub(crate) fn set_order(&mut self, names: Vec<String>) -> ViewResult<()> {
        let mut seen = BTreeSet::new();
        let order: Vec<String> = names
            .into_iter()
            .filter(|n| seen.insert(n.clone()))
            .collect();
        let registered: BTreeSet<&String> = self.by_name.keys().collect();
        let supplied: BTreeSet<&String> = order.iter().collect();
        if registered != supplied {
            return Err(ViewError::NameMismatch {
                registered: registered.into_iter().cloned().collect(),
                supplied: order,
            });
        }
        self.order = order;
        debug_assert_eq!(self.order.len(), self.by_name.len());
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<dyn FieldView>> {
        self.by_name.get(name).cloned()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Views in order, optionally restricted to `subset`.
    pub(crate) fn ordered(&self, subset: Option<&[&str]>) -> Vec<Arc<dyn FieldView>> {
        self.order
            .iter()
            .filter(|n| subset.is_none_or(|s| s.contains(&n.as_str())))
            .filter_map(|n| self.by_name.get(n).cloned())
            .collect()
    }
}
