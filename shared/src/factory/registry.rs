use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use log::warn;

use crate::{
    component::{Component, ComponentCore, ComponentType},
    model::Gid,
    SyncError,
};

/// Global gid -> component map. Every live component is registered under
/// its model's gid; the registry holds the only strong handle to roots.
pub struct Registry {
    components: RefCell<HashMap<Gid, Rc<dyn Component>>>,
    generation: Cell<u64>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            components: RefCell::new(HashMap::new()),
            generation: Cell::new(0),
        }
    }

    /// Registers a component. Registering the same instance twice is a
    /// no-op; a different instance under the same gid is an error.
    pub fn register(&self, component: Rc<dyn Component>) -> Result<(), SyncError> {
        let gid = component.gid().clone();
        let mut components = self.components.borrow_mut();
        if let Some(existing) = components.get(&gid) {
            if std::ptr::eq(existing.core(), component.core()) {
                return Ok(());
            }
            return Err(SyncError::DuplicateComponent { gid });
        }
        components.insert(gid, component);
        self.generation.set(self.generation.get() + 1);
        Ok(())
    }

    /// Removes the entry for a gid, only if it belongs to the component
    /// owning `core`
    pub fn unregister(&self, gid: &Gid, core: &ComponentCore) -> bool {
        let mut components = self.components.borrow_mut();
        match components.get(gid) {
            Some(existing) if std::ptr::eq(existing.core(), core) => {
                components.remove(gid);
                self.generation.set(self.generation.get() + 1);
                true
            }
            Some(_) => {
                warn!("Not unregistering {}: registered to another component", gid);
                false
            }
            None => false,
        }
    }

    pub fn by_gid(&self, gid: &Gid) -> Option<Rc<dyn Component>> {
        self.components.borrow().get(gid).cloned()
    }

    pub fn by_gid_as<C: ComponentType + ?Sized>(&self, gid: &Gid) -> Option<Rc<C>> {
        self.by_gid(gid).and_then(C::downcast)
    }

    pub fn contains(&self, gid: &Gid) -> bool {
        self.components.borrow().contains_key(gid)
    }

    /// Snapshot of every registered component, in no particular order
    pub fn all(&self) -> Vec<Rc<dyn Component>> {
        self.components.borrow().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.components.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.borrow().is_empty()
    }

    /// Bumped on every registration and removal, so pending references know
    /// whether a retry could succeed
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub(crate) fn clear(&self) -> Vec<Rc<dyn Component>> {
        self.components.borrow_mut().drain().map(|(_, component)| component).collect()
    }
}
