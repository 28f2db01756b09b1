use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    factory::{Factory, FactoryRef},
    model::{Gid, Model, Value},
    sync::{ComponentList, ComponentSlot, PropertySync},
    SyncError,
};

use super::{ActionRegistry, ChildSync, Component, ComponentType, EventRegistry};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

/// State shared by every component: its model binding, lifecycle flags,
/// child syncs and the action/event tables.
///
/// Parents are tracked by gid and looked up in the registry, so a child
/// never keeps its parent alive.
pub struct ComponentCore {
    gid: Gid,
    model: Model,
    factory: FactoryRef,
    parent: RefCell<Option<Gid>>,
    syncs: RefCell<Vec<Rc<dyn ChildSync>>>,
    root: Cell<bool>,
    enabled: Cell<bool>,
    active: Cell<bool>,
    initialized: Cell<bool>,
    destroyed: Cell<bool>,
    load_state: Rc<Cell<LoadState>>,
    actions: ActionRegistry,
    events: EventRegistry,
}

impl ComponentCore {
    pub fn new(model: Model, factory: &Factory) -> Self {
        let gid = model.gid().clone();
        Self {
            actions: ActionRegistry::new(gid.clone()),
            events: EventRegistry::new(gid.clone()),
            gid,
            model,
            factory: factory.downgrade(),
            parent: RefCell::new(None),
            syncs: RefCell::new(Vec::new()),
            root: Cell::new(false),
            enabled: Cell::new(true),
            active: Cell::new(false),
            initialized: Cell::new(false),
            destroyed: Cell::new(false),
            load_state: Rc::new(Cell::new(LoadState::Unloaded)),
        }
    }

    pub fn gid(&self) -> &Gid {
        &self.gid
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn factory(&self) -> Option<Factory> {
        self.factory.upgrade()
    }

    pub(crate) fn factory_ref(&self) -> &FactoryRef {
        &self.factory
    }

    pub fn parent_gid(&self) -> Option<Gid> {
        self.parent.borrow().clone()
    }

    pub fn parent(&self) -> Option<Rc<dyn Component>> {
        let gid = self.parent_gid()?;
        self.factory()?.registry().by_gid(&gid)
    }

    pub fn is_root(&self) -> bool {
        self.root.get()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state.get()
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    /// Snapshot of the registered child syncs
    pub fn syncs(&self) -> Vec<Rc<dyn ChildSync>> {
        self.syncs.borrow().clone()
    }

    /// Components held by owned syncs whose parent is still this component
    pub fn owned_children(&self) -> Vec<Rc<dyn Component>> {
        self.syncs()
            .iter()
            .filter(|sync| !sync.is_reference())
            .flat_map(|sync| sync.components())
            .filter(|child| child.core().parent_gid().as_ref() == Some(&self.gid))
            .collect()
    }

    // Builders

    /// Plain value sync for a property path, typed by the declared property
    pub fn property(&self, path: &str) -> Result<PropertySync<Value>, SyncError> {
        let sync = PropertySync::plain(&self.model, path)?;
        self.add_sync(sync.as_child_sync());
        Ok(sync)
    }

    /// Single child component, owned or referenced depending on the property
    pub fn slot<C: ComponentType + ?Sized>(&self, path: &str) -> Result<ComponentSlot<C>, SyncError> {
        let slot = ComponentSlot::new(self, path)?;
        self.add_sync(slot.as_child_sync());
        Ok(slot)
    }

    /// Ordered child components mirrored from a collection property
    pub fn list<C: ComponentType + ?Sized>(&self, path: &str) -> Result<ComponentList<C>, SyncError> {
        let list = ComponentList::new(self, path)?;
        self.add_sync(list.as_child_sync());
        Ok(list)
    }

    pub fn add_sync(&self, sync: Rc<dyn ChildSync>) {
        self.syncs.borrow_mut().push(sync);
    }

    // Internal

    pub(crate) fn set_root(&self, root: bool) {
        self.root.set(root);
    }

    pub(crate) fn set_parent_gid(&self, parent: Option<Gid>) {
        *self.parent.borrow_mut() = parent;
    }

    pub(crate) fn set_enabled_flag(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub(crate) fn set_active_flag(&self, active: bool) {
        self.active.set(active);
    }

    pub(crate) fn mark_initialized(&self) {
        self.initialized.set(true);
    }

    pub(crate) fn mark_destroyed(&self) {
        self.destroyed.set(true);
    }

    pub(crate) fn load_state_cell(&self) -> Rc<Cell<LoadState>> {
        self.load_state.clone()
    }
}
