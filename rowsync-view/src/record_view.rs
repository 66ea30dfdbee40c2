//! Record view: binds field views to one stored row.

use crate::context::OwnerContext;
use crate::observers::{Listener, Observers, Property, ViewEvent};
use crate::registry::Registry;
use crate::state::{RowState, ViewPhase};
use crate::{EditHook, FieldView, ViewError, ViewResult};
use rowsync_model::{DefaultPolicy, OrderHint, Record, RowRef, RowValues, Table, TablePolicy, ValidState};
use rowsync_notify::{ChangeBus, ChangeKind, TableEvent, TableHandler};
use rowsync_storage::RowStore;
use rowsync_types::{ListenerId, RecordId, SubscriberId};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

#[derive(Clone, Copy)]
enum FanIn {
    Insert,
    Update,
}

/// A view of one row of one table as a set of [`FieldView`]s.
///
/// The view owns the identity of the displayed row. [`select`](Self::select)
/// pushes a snapshot into every field view in order; [`insert`](Self::insert)
/// and [`update`](Self::update) pull the edited values back out, in the same
/// order, and submit them to the store. While active, the view follows
/// remote updates and deletions of the displayed row.
///
/// Every method except [`select_id`](Self::select_id),
/// [`select_id_async`](Self::select_id_async), [`field_edited`](Self::field_edited)
/// and the read-only accessors must be called on the owner context.
pub struct RecordView {
    table: Arc<Table>,
    store: Arc<dyn RowStore>,
    bus: ChangeBus,
    owner: OwnerContext,
    subscriber: SubscriberId,
    this: Weak<RecordView>,
    registry: RwLock<Registry>,
    state: Mutex<RowState>,
    observers: Observers,
    policy: RwLock<Arc<dyn TablePolicy>>,
}

/// Keeps `filling` set for its lifetime.
struct FillingScope<'a> {
    view: &'a RecordView,
}

impl<'a> FillingScope<'a> {
    fn enter(view: &'a RecordView) -> Self {
        view.transition(RowState::enter_filling);
        Self { view }
    }
}

impl Drop for FillingScope<'_> {
    fn drop(&mut self) {
        self.view.transition(RowState::leave_filling);
    }
}

/// Keeps `updating` set for its lifetime.
struct UpdatingScope<'a> {
    view: &'a RecordView,
}

impl<'a> UpdatingScope<'a> {
    /// Checks and sets under the same lock, so a concurrent remote event
    /// either sees the write in flight or happened before it.
    fn enter(view: &'a RecordView) -> ViewResult<Self> {
        let mut state = view.state();
        state.check_can_write()?;
        state.updating = true;
        Ok(Self { view })
    }
}

impl Drop for UpdatingScope<'_> {
    fn drop(&mut self) {
        self.view.state().updating = false;
    }
}

impl RecordView {
    /// Creates a view bound to `table`.
    ///
    /// The view starts inactive and empty. Register field views, then call
    /// [`activate`](Self::activate).
    pub fn new(
        table: Arc<Table>,
        store: Arc<dyn RowStore>,
        bus: ChangeBus,
        owner: OwnerContext,
    ) -> ViewResult<Arc<Self>> {
        if !table.is_rowable() {
            return Err(ViewError::NotRowable(table.name().to_string()));
        }
        Ok(Arc::new_cyclic(|this| Self {
            table,
            store,
            bus,
            owner,
            subscriber: SubscriberId::new(),
            this: this.clone(),
            registry: RwLock::new(Registry::default()),
            state: Mutex::new(RowState::default()),
            observers: Observers::default(),
            policy: RwLock::new(Arc::new(DefaultPolicy)),
        }))
    }

    fn state(&self) -> MutexGuard<'_, RowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies one state change and notifies observers after the lock is
    /// released.
    fn transition(&self, f: impl FnOnce(&mut RowState) -> Option<ViewEvent>) {
        let event = f(&mut self.state());
        if let Some(event) = event {
            self.observers.notify(&event);
        }
    }

    fn ensure_owner(&self) -> ViewResult<()> {
        if self.owner.is_owner() {
            Ok(())
        } else {
            Err(ViewError::WrongContext)
        }
    }

    fn ordered_views(&self, subset: Option<&[&str]>) -> Vec<Arc<dyn FieldView>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ordered(subset)
    }

    fn policy(&self) -> Arc<dyn TablePolicy> {
        Arc::clone(&self.policy.read().unwrap_or_else(PoisonError::into_inner))
    }

    // ── Registration ─────────────────────────────────────────────

    /// Adds a field view at the end of the order and starts listening to
    /// its edits.
    pub fn register(&self, view: Arc<dyn FieldView>) -> ViewResult<()> {
        self.ensure_owner()?;
        if self.state().sealed {
            return Err(ViewError::IllegalState(format!(
                "cannot register {} after activation",
                view.name()
            )));
        }
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(Arc::clone(&view))?;
        let weak = self.this.clone();
        let hook: EditHook = Arc::new(move |name: &str| {
            if let Some(record_view) = weak.upgrade() {
                record_view.field_edited(name);
            }
        });
        view.set_edit_hook(hook);
        Ok(())
    }

    /// Sets the fan-out/fan-in order. Useful when some views depend on
    /// others having written first.
    pub fn set_order<I, S>(&self, names: I) -> ViewResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_owner()?;
        let names = names.into_iter().map(Into::into).collect();
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_order(names)
    }

    /// Replaces the type-level policy.
    pub fn set_policy(&self, policy: Arc<dyn TablePolicy>) {
        *self.policy.write().unwrap_or_else(PoisonError::into_inner) = policy;
    }

    // ── Activation ───────────────────────────────────────────────

    /// Starts or stops following remote changes.
    ///
    /// Turning on while a row is displayed re-selects it, to catch up on
    /// changes made while inactive. Repeated calls are harmless.
    pub fn activate(&self, on: bool) -> ViewResult<()> {
        self.ensure_owner()?;
        if on {
            let weak = self.this.clone();
            let handler: TableHandler = Arc::new(move |event: &TableEvent| {
                if let Some(view) = weak.upgrade() {
                    view.table_modified(event);
                }
            });
            if self.bus.subscribe(self.table.name(), self.subscriber, handler) {
                info!(table = self.table.name(), "record view activated");
            }
            let selected = {
                let mut state = self.state();
                state.active = true;
                state.sealed = true;
                state.selected
            };
            if selected.is_some() {
                self.select_id(selected)?;
            }
        } else {
            if self.bus.unsubscribe(self.table.name(), self.subscriber) {
                info!(table = self.table.name(), "record view deactivated");
            }
            self.state().active = false;
        }
        Ok(())
    }

    // ── Select ───────────────────────────────────────────────────

    /// Displays the stored row `id`, or resets if it does not exist.
    ///
    /// May be called from any thread. The row is fetched on the calling
    /// thread; applying it runs on the owner context, and the caller blocks
    /// until it has and gets its outcome. Must not be called from inside an
    /// async task off the owner; use [`select_id_async`](Self::select_id_async).
    pub fn select_id(&self, id: RecordId) -> ViewResult<()> {
        let row = self.fetch(id)?;
        if self.owner.is_owner() {
            return self.select(row.as_ref());
        }
        let this = self.this.upgrade().ok_or(ViewError::ContextClosed)?;
        self.owner.call_blocking(move || this.select(row.as_ref()))?
    }

    /// Like [`select_id`](Self::select_id) without blocking: the returned
    /// receiver yields the outcome once the owner has applied the row.
    pub fn select_id_async(
        &self,
        id: RecordId,
    ) -> ViewResult<oneshot::Receiver<ViewResult<()>>> {
        let row = self.fetch(id)?;
        let this = self.this.upgrade().ok_or(ViewError::ContextClosed)?;
        self.owner.call(move || this.select(row.as_ref()))
    }

    fn fetch(&self, id: RecordId) -> ViewResult<Option<Record>> {
        if id.is_none() {
            return Ok(None);
        }
        Ok(self.store.fetch_row(&self.table, id)?)
    }

    /// Displays `record`, or resets every field view for `None`.
    pub fn select(&self, record: Option<&Record>) -> ViewResult<()> {
        self.fill(record, None)
    }

    /// Like [`select`](Self::select) but only touches the named views.
    pub fn select_subset(&self, record: Option<&Record>, names: &[&str]) -> ViewResult<()> {
        self.fill(record, Some(names))
    }

    /// Resets every field view and forgets the displayed row.
    pub fn reset_value(&self) -> ViewResult<()> {
        self.select(None)
    }

    /// Re-reads the displayed row from the store.
    pub fn refresh(&self) -> ViewResult<()> {
        let selected = self.selected_id();
        if selected.is_none() {
            return Ok(());
        }
        self.select_id(selected)
    }

    fn fill(&self, record: Option<&Record>, subset: Option<&[&str]>) -> ViewResult<()> {
        self.ensure_owner()?;
        if let Some(r) = record {
            if r.table != self.table.name() {
                return Err(ViewError::TypeMismatch {
                    expected: self.table.name().to_string(),
                    found: r.table.clone(),
                });
            }
        }
        trace!(table = self.table.name(), id = ?record.and_then(Record::real_id), "select");

        let _filling = FillingScope::enter(self);
        let views = self.ordered_views(subset);
        match record {
            None => {
                self.transition(|s| s.set_selected(RecordId::NONE));
                for view in &views {
                    view.reset_value().map_err(|source| ViewError::Field {
                        name: view.name().to_string(),
                        source,
                    })?;
                }
            }
            Some(r) => {
                // Identity first: views may read it while rendering.
                if let Some(id) = r.real_id() {
                    self.transition(|s| s.set_selected(id));
                }
                for view in &views {
                    view.show(r).map_err(|source| ViewError::Field {
                        name: view.name().to_string(),
                        source,
                    })?;
                }
            }
        }

        if self.table.has_read_only_marker() {
            let read_only = match record {
                None => Some(false),
                Some(r) if r.real_id().is_none() => None,
                Some(r) => Some(self.policy().is_read_only(r)),
            };
            if let Some(read_only) = read_only {
                self.transition(|s| s.set_read_only(read_only));
            }
        }
        self.state().policy_validity = ValidState::valid();
        self.recompute_validity();
        Ok(())
    }

    /// Stops displaying a row without touching the field views.
    pub fn detach(&self) -> ViewResult<()> {
        self.ensure_owner()?;
        self.transition(|s| s.set_selected(RecordId::NONE));
        self.transition(|s| s.set_read_only(false));
        Ok(())
    }

    // ── Insert / update ──────────────────────────────────────────

    fn collect(&self, mode: FanIn) -> ViewResult<RowValues> {
        let mut values = RowValues::new(self.table.name());
        for view in self.ordered_views(None) {
            let result = match mode {
                FanIn::Insert => view.insert(&mut values),
                FanIn::Update => view.update(&mut values),
            };
            result.map_err(|source| ViewError::Field {
                name: view.name().to_string(),
                source,
            })?;
        }
        Ok(values)
    }

    /// Writes the edited values to the displayed row.
    ///
    /// Remote change events for the row are ignored until the store answers.
    pub fn update(&self) -> ViewResult<()> {
        self.ensure_owner()?;
        let _updating = UpdatingScope::enter(self)?;
        let id = self.selected_id();
        if id.is_none() || self.table.is_undefined(id) {
            return Err(ViewError::UndefinedIdentity(id));
        }
        debug!(table = self.table.name(), %id, "updating");
        let values = self.collect(FanIn::Update)?;
        self.check_policy(&values)?;
        self.store.submit_update(&self.table, id, values)?;
        Ok(())
    }

    /// Creates a new row from the edited values. The displayed row does not
    /// change.
    pub fn insert(&self) -> ViewResult<RowRef> {
        self.insert_row(None)
    }

    /// Like [`insert`](Self::insert), placing the new row next to `hint` in
    /// the table's display order.
    pub fn insert_with_order(&self, hint: OrderHint) -> ViewResult<RowRef> {
        self.insert_row(Some(hint))
    }

    /// Judges the write buffer. The verdict joins the validity until the
    /// next select.
    fn check_policy(&self, values: &RowValues) -> ViewResult<()> {
        let verdict = self.policy().validate(values);
        self.state().policy_validity = verdict.clone();
        self.recompute_validity();
        if verdict.is_valid() {
            Ok(())
        } else {
            debug!(table = self.table.name(), %verdict, "policy refused write");
            Err(ViewError::Invalid(verdict))
        }
    }

    fn insert_row(&self, hint: Option<OrderHint>) -> ViewResult<RowRef> {
        self.ensure_owner()?;
        self.state().check_can_write()?;
        let values = self.collect(FanIn::Insert)?;
        self.check_policy(&values)?;
        let id = self.store.submit_insert(&self.table, values, hint)?;
        debug!(table = self.table.name(), %id, "inserted");
        Ok(RowRef::new(self.table.name(), id))
    }

    // ── Remote changes ───────────────────────────────────────────

    /// Entry point for change notifications; normally called by the bus.
    ///
    /// Events for another table or row, or arriving while inactive or while
    /// an update is in flight, are ignored. Otherwise the displayed row is
    /// re-selected (updated) or the view reset (deleted) on the owner context.
    pub fn table_modified(&self, event: &TableEvent) {
        let wanted = {
            let state = self.state();
            event.concerns(self.table.name(), state.selected) && state.follows_remote()
        };
        if !wanted {
            trace!(table = self.table.name(), %event, "ignoring event");
            return;
        }
        match event.kind {
            ChangeKind::Updated => {
                let row = match self.fetch(event.record_id) {
                    Ok(row) => row,
                    Err(e) => {
                        warn!(%event, "cannot refresh displayed row: {e}");
                        return;
                    }
                };
                self.apply_remote(event.record_id, row);
            }
            ChangeKind::Deleted => self.apply_remote(event.record_id, None),
            ChangeKind::Added => {}
        }
    }

    fn apply_remote(&self, id: RecordId, row: Option<Record>) {
        let Some(this) = self.this.upgrade() else {
            return;
        };
        let result = self.owner.invoke(move || {
            {
                // State may have moved on while the event was in transit.
                let state = this.state();
                if state.is_filling() || !state.follows_remote() || state.selected != id {
                    debug!(table = this.table.name(), %id, "dropping stale remote change");
                    return;
                }
            }
            debug!(table = this.table.name(), %id, deleted = row.is_none(), "applying remote change");
            if let Err(e) = this.select(row.as_ref()) {
                warn!(table = this.table.name(), %id, "remote refresh failed: {e}");
            }
        });
        if let Err(e) = result {
            warn!(table = self.table.name(), %id, "cannot reach owner context: {e}");
        }
    }

    // ── Validity ─────────────────────────────────────────────────

    /// Sets the caller-controlled part of the validity.
    pub fn set_local_validity(&self, validity: ValidState) -> ViewResult<ValidState> {
        self.ensure_owner()?;
        self.state().local_validity = validity;
        Ok(self.recompute_validity())
    }

    /// Recomputes validity from the local part, the table policy's verdict
    /// on the last write and every field view. Observers hear about it only
    /// if it changed.
    ///
    /// Never pulls values out of the field views: the policy judges the
    /// write buffer when [`insert`](Self::insert) or [`update`](Self::update)
    /// builds one.
    pub fn revalidate(&self) -> ViewResult<ValidState> {
        self.ensure_owner()?;
        Ok(self.recompute_validity())
    }

    fn recompute_validity(&self) -> ValidState {
        let (local, policy) = {
            let state = self.state();
            (state.local_validity.clone(), state.policy_validity.clone())
        };
        let validity: ValidState = [local, policy]
            .into_iter()
            .chain(self.ordered_views(None).iter().map(|v| v.validity()))
            .collect();
        self.transition(|s| s.set_validity(validity.clone()));
        validity
    }

    /// Revalidates after the field view `name` was edited. Stock views call
    /// this through their edit hook; custom views may call it directly.
    ///
    /// May be called from any thread: off the owner it is queued there.
    /// Ignored while the view is filling, which revalidates when done.
    pub fn field_edited(&self, name: &str) {
        if !self.owner.is_owner() {
            let Some(this) = self.this.upgrade() else {
                return;
            };
            let owned = name.to_string();
            if let Err(e) = self.owner.invoke(move || this.field_edited(&owned)) {
                warn!(
                    table = self.table.name(),
                    field = name,
                    "cannot reach owner context: {e}"
                );
            }
            return;
        }
        if self.is_filling() {
            return;
        }
        trace!(table = self.table.name(), field = name, "field edited");
        self.recompute_validity();
    }

    pub fn validity(&self) -> ValidState {
        self.state().validity.clone()
    }

    // ── Observers ────────────────────────────────────────────────

    /// Registers a listener for every property.
    pub fn add_listener(&self, listener: Listener) -> ListenerId {
        self.observers.add(None, listener)
    }

    /// Registers a listener for one property.
    pub fn add_property_listener(&self, property: Property, listener: Listener) -> ListenerId {
        self.observers.add(Some(property), listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.observers.remove(id)
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn owner(&self) -> &OwnerContext {
        &self.owner
    }

    pub fn selected_id(&self) -> RecordId {
        self.state().selected
    }

    /// Whether the displayed values are bound to a stored row.
    pub fn exists_in_store(&self) -> bool {
        self.selected_id().is_some()
    }

    pub fn is_filling(&self) -> bool {
        self.state().is_filling()
    }

    pub fn is_updating(&self) -> bool {
        self.state().updating
    }

    /// `false` when no row is displayed.
    pub fn is_read_only_selection(&self) -> bool {
        self.state().read_only
    }

    pub fn is_active(&self) -> bool {
        self.state().active
    }

    pub fn phase(&self) -> ViewPhase {
        self.state().phase()
    }

    pub fn view(&self, name: &str) -> Option<Arc<dyn FieldView>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
    }

    /// Field views in fan-out order.
    pub fn views(&self) -> Vec<Arc<dyn FieldView>> {
        self.ordered_views(None)
    }

    pub fn view_names(&self) -> Vec<String> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .names()
    }

    /// Every store column read by some field view.
    pub fn all_fields(&self) -> BTreeSet<String> {
        self.ordered_views(None)
            .iter()
            .flat_map(|v| v.fields())
            .collect()
    }
}

impl fmt::Debug for RecordView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("RecordView")
            .field("table", &self.table.name())
            .field("views", &registry.names())
            .field("size", &registry.len())
            .field("state", &*self.state())
            .finish()
    }
}

impl Drop for RecordView {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.table.name(), self.subscriber);
    }
}
