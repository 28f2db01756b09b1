use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use log::error;

use crate::{
    component::{ChildSync, Component, ComponentCore, ComponentType},
    emitter::ListenerId,
    factory::{Factory, FactoryRef},
    model::{Collection, Gid, Model, Record, Value, ValueKind},
    Emitter, SyncError,
};

use super::{sync_source::SyncSource, ValueChange};

pub struct ComponentAdded<C: ?Sized> {
    pub component: Rc<C>,
    pub index: usize,
}

pub struct ComponentRemoved<C: ?Sized> {
    pub component: Rc<C>,
    pub index: usize,
}

pub struct ComponentListEvents<C: ?Sized> {
    /// One per component appended to the list
    pub add: Emitter<ComponentAdded<C>>,
    /// One per component removed, with the index it had
    pub remove: Emitter<ComponentRemoved<C>>,
    /// Fired after the list is re-derived from a replaced collection
    pub change: Emitter<ValueChange<Vec<Rc<C>>>>,
}

struct ObservedCollection {
    collection: Collection,
    added: ListenerId,
    removed: ListenerId,
}

pub(crate) struct ListInner<C: ComponentType + ?Sized> {
    source: SyncSource,
    owner: Gid,
    factory: FactoryRef,
    item_type: Option<&'static str>,
    items: RefCell<Vec<Rc<C>>>,
    observed: RefCell<Option<ObservedCollection>>,
    events: ComponentListEvents<C>,
    self_weak: Weak<ListInner<C>>,
}

/// Ordered list of components mirroring a collection property.
///
/// Replacing the collection re-derives the whole list; adding to or
/// removing from the observed collection updates it incrementally. An
/// owned list parents every item to the list owner and skips items that
/// cannot be built. A reference list is all-or-nothing: it stays empty
/// until every referenced node has a registered component.
pub struct ComponentList<C: ComponentType + ?Sized> {
    inner: Rc<ListInner<C>>,
}

/// Name used for lists of controllers in the controller tree
pub type ControllerList<C> = ComponentList<C>;

impl<C: ComponentType + ?Sized> Clone for ComponentList<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: ComponentType + ?Sized> ComponentList<C> {
    pub fn new(owner: &ComponentCore, path: &str) -> Result<Self, SyncError> {
        let model = owner.model();
        let def = model.property_def_at(path)?;
        let ValueKind::Collection(item_type) = def.kind() else {
            return Err(SyncError::TypeMismatch {
                path: path.to_string(),
                expected: "collection".to_string(),
                actual: def.kind().to_string(),
            });
        };

        let source = SyncSource::new(model, path, None)?;
        let inner = Rc::new_cyclic(|self_weak| ListInner {
            source,
            owner: owner.gid().clone(),
            factory: owner.factory_ref().clone(),
            item_type: *item_type,
            items: RefCell::new(Vec::new()),
            observed: RefCell::new(None),
            events: ComponentListEvents {
                add: Emitter::new(),
                remove: Emitter::new(),
                change: Emitter::new(),
            },
            self_weak: self_weak.clone(),
        });
        Ok(Self { inner })
    }

    pub fn model(&self) -> &Model {
        self.inner.source.model()
    }

    pub fn path(&self) -> &str {
        self.inner.source.path()
    }

    pub fn is_reference(&self) -> bool {
        self.inner.source.is_reference()
    }

    pub fn is_watching(&self) -> bool {
        self.inner.source.is_watching()
    }

    pub fn events(&self) -> &ComponentListEvents<C> {
        &self.inner.events
    }

    pub fn on_add(
        &self,
        handler: impl Fn(&ComponentAdded<C>) -> Result<(), SyncError> + 'static,
    ) -> ListenerId {
        self.inner.events.add.on(handler)
    }

    pub fn on_remove(
        &self,
        handler: impl Fn(&ComponentRemoved<C>) -> Result<(), SyncError> + 'static,
    ) -> ListenerId {
        self.inner.events.remove.on(handler)
    }

    pub fn on_change(
        &self,
        handler: impl Fn(&ValueChange<Vec<Rc<C>>>) -> Result<(), SyncError> + 'static,
    ) -> ListenerId {
        self.inner.events.change.on(handler)
    }

    /// The mirrored components, in collection order. A pending reference
    /// list is retried first if the registry changed since the last attempt.
    pub fn current(&self) -> Vec<Rc<C>> {
        if self.inner.should_retry() {
            if let Err(err) = self.inner.retry() {
                error!("Failed to resolve '{}': {}", self.path(), err);
            }
        }
        self.inner.snapshot()
    }

    pub fn try_current(&self) -> Result<Vec<Rc<C>>, SyncError> {
        if self.inner.should_retry() {
            self.inner.retry()?;
        }
        if self.inner.source.is_pending() {
            return Err(SyncError::UnresolvedReference {
                path: self.path().to_string(),
            });
        }
        Ok(self.inner.snapshot())
    }

    /// The collection currently observed, if any
    pub fn collection(&self) -> Option<Collection> {
        self.inner
            .observed
            .borrow()
            .as_ref()
            .map(|observed| observed.collection.clone())
    }

    /// Appends a component to the mirrored list without touching the model.
    /// Adding a component that is already listed is a no-op.
    pub fn add(&self, component: Rc<C>) -> Result<(), SyncError> {
        self.inner.push(component)
    }

    pub fn remove(&self, component: &Rc<C>) -> Result<usize, SyncError> {
        self.remove_where(|item| Rc::ptr_eq(item, component))
    }

    pub fn remove_all(&self, components: &[Rc<C>]) -> Result<usize, SyncError> {
        self.remove_where(|item| components.iter().any(|component| Rc::ptr_eq(item, component)))
    }

    /// Removes every match, firing one `remove` event each. Returns the
    /// number removed.
    pub fn remove_where(&self, predicate: impl Fn(&Rc<C>) -> bool) -> Result<usize, SyncError> {
        let mut removed = 0;
        let mut index = self.inner.items.borrow().len();
        while index > 0 {
            index -= 1;
            let item = self.inner.items.borrow().get(index).cloned();
            if item.is_some_and(|item| predicate(&item)) {
                self.inner.remove_at(index)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn has(&self, component: &Rc<C>) -> bool {
        self.inner.position_of(component).is_some()
    }

    pub fn get(&self, index: usize) -> Option<Rc<C>> {
        self.current().get(index).cloned()
    }

    pub fn each(&self, mut visit: impl FnMut(&Rc<C>, usize)) {
        for (index, component) in self.current().iter().enumerate() {
            visit(component, index);
        }
    }

    pub fn map<R>(&self, transform: impl FnMut(&Rc<C>) -> R) -> Vec<R> {
        self.current().iter().map(transform).collect()
    }

    pub fn filter(&self, predicate: impl Fn(&Rc<C>) -> bool) -> Vec<Rc<C>> {
        self.current().into_iter().filter(|item| predicate(item)).collect()
    }

    pub fn find(&self, predicate: impl Fn(&Rc<C>) -> bool) -> Option<Rc<C>> {
        self.current().into_iter().find(|item| predicate(item))
    }

    /// First component whose model has every given property value
    pub fn find_by(&self, criteria: &Record) -> Option<Rc<C>> {
        self.find(|item| {
            let model = C::upcast(item.clone()).model().clone();
            criteria
                .iter()
                .all(|(property, value)| model.get(property) == *value)
        })
    }

    pub fn count(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Removes every component, last first, firing `remove` for each
    pub fn clear(&self) -> Result<(), SyncError> {
        self.inner.clear_items()
    }

    /// Destroys every owned component, then clears. A reference list only
    /// clears.
    pub fn destroy(&self) {
        self.inner.destroy_items();
    }

    pub fn start_watching(&self) -> Result<(), SyncError> {
        self.inner.begin_watching()
    }

    pub fn stop_watching(&self) {
        self.inner.end_watching();
    }

    pub fn resolve_references(&self) -> Result<(), SyncError> {
        ChildSync::resolve_references(&*self.inner)
    }

    pub(crate) fn as_child_sync(&self) -> Rc<dyn ChildSync> {
        self.inner.clone()
    }
}

impl<C: ComponentType + ?Sized> ListInner<C> {
    fn begin_watching(&self) -> Result<(), SyncError> {
        let weak = self.self_weak.clone();
        let started = self.source.watch(move |change| match weak.upgrade() {
            Some(inner) => inner.on_source_changed(&change.new_value),
            None => Ok(()),
        })?;
        if started {
            self.on_source_changed(&self.source.read())?;
        }
        Ok(())
    }

    fn end_watching(&self) {
        self.source.unwatch();
        self.detach_collection();
    }

    fn on_source_changed(&self, value: &Value) -> Result<(), SyncError> {
        self.source.check(value)?;
        self.source.record_source(value);
        self.model_to_component(value.as_collection().cloned())
    }

    /// Full re-derivation, run when the collection instance is replaced
    fn model_to_component(&self, collection: Option<Collection>) -> Result<(), SyncError> {
        let old = self.snapshot();
        self.clear_items()?;
        self.detach_collection();

        if let Some(collection) = &collection {
            self.observe(collection);
            self.derive(collection)?;
        }
        self.fire_change(old)
    }

    fn derive(&self, collection: &Collection) -> Result<(), SyncError> {
        let Some(factory) = self.factory.upgrade() else {
            return Ok(());
        };
        let reference = self.source.is_reference();

        let mut components = Vec::new();
        let mut missing = Vec::new();
        for item in collection.items() {
            self.check_item(&item)?;
            match factory.resolve::<C>(&item, !reference)? {
                Some(component) => components.push(component),
                None if reference => missing.push(item.gid().clone()),
                None => error!(
                    "Could not resolve component for {:?} in '{}'",
                    item,
                    self.source.path()
                ),
            }
        }

        if reference {
            let source = Value::Collection(collection.clone());
            self.source.set_attempted(&source, factory.registry().generation());
            if !missing.is_empty() {
                self.source.set_resolved(Value::Null);
                self.track(&factory, Vec::new(), missing);
                return Ok(());
            }
            self.source.set_resolved(source);
            self.track(&factory, gids_of(&components), Vec::new());
        }

        for component in components {
            self.push(component)?;
        }
        Ok(())
    }

    fn observe(&self, collection: &Collection) {
        let weak = self.self_weak.clone();
        let added = collection.added().on(move |event| match weak.upgrade() {
            Some(inner) => inner.on_item_added(&event.item),
            None => Ok(()),
        });
        let weak = self.self_weak.clone();
        let removed = collection.removed().on(move |event| match weak.upgrade() {
            Some(inner) => inner.on_item_removed(&event.item),
            None => Ok(()),
        });
        *self.observed.borrow_mut() = Some(ObservedCollection {
            collection: collection.clone(),
            added,
            removed,
        });
    }

    fn detach_collection(&self) {
        let observed = self.observed.borrow_mut().take();
        if let Some(observed) = observed {
            observed.collection.added().off(observed.added);
            observed.collection.removed().off(observed.removed);
        }
    }

    fn on_item_added(&self, item: &Model) -> Result<(), SyncError> {
        self.check_item(item)?;
        let reference = self.source.is_reference();
        if reference && self.source.is_pending() {
            return self.retry();
        }
        let Some(factory) = self.factory.upgrade() else {
            return Ok(());
        };

        match factory.resolve::<C>(item, !reference)? {
            Some(component) => {
                self.push(component)?;
                if reference {
                    self.track(&factory, gids_of(&self.snapshot()), Vec::new());
                }
                Ok(())
            }
            None if reference => {
                // drop back to unresolved rather than publish a partial list
                let old = self.snapshot();
                self.clear_items()?;
                let source = self.source.current_source();
                self.source.set_attempted(&source, factory.registry().generation());
                self.track(&factory, Vec::new(), vec![item.gid().clone()]);
                self.fire_change(old)
            }
            None => {
                error!(
                    "Could not resolve component for {:?} in '{}'",
                    item,
                    self.source.path()
                );
                Ok(())
            }
        }
    }

    fn on_item_removed(&self, item: &Model) -> Result<(), SyncError> {
        if self.source.is_reference() && self.source.is_pending() {
            return self.retry();
        }
        let index = self
            .items
            .borrow()
            .iter()
            .position(|component| C::upcast(component.clone()).gid() == item.gid());
        match index {
            Some(index) => self.remove_at(index),
            None => Ok(()),
        }
    }

    fn check_item(&self, item: &Model) -> Result<(), SyncError> {
        match self.item_type {
            Some(item_type) if !item.is_a(item_type) => Err(SyncError::TypeMismatch {
                path: self.source.path().to_string(),
                expected: format!("node<{}>", item_type),
                actual: format!("node<{}>", item.model_type()),
            }),
            _ => Ok(()),
        }
    }

    fn push(&self, component: Rc<C>) -> Result<(), SyncError> {
        if self.position_of(&component).is_some() {
            return Ok(());
        }
        let index = {
            let mut items = self.items.borrow_mut();
            items.push(component.clone());
            items.len() - 1
        };
        if !self.source.is_reference() {
            C::upcast(component.clone()).set_parent(Some(self.owner.clone()))?;
        }
        self.events.add.fire(&ComponentAdded { component, index })
    }

    fn remove_at(&self, index: usize) -> Result<(), SyncError> {
        let component = {
            let mut items = self.items.borrow_mut();
            if index >= items.len() {
                return Ok(());
            }
            items.remove(index)
        };
        if !self.source.is_reference() {
            let child = C::upcast(component.clone());
            if child.core().parent_gid().as_ref() == Some(&self.owner) {
                child.set_parent(None)?;
            }
        }
        self.events.remove.fire(&ComponentRemoved { component, index })
    }

    fn clear_items(&self) -> Result<(), SyncError> {
        if self.source.is_reference() {
            self.source.set_resolved(Value::Null);
        }
        loop {
            let len = self.items.borrow().len();
            let Some(index) = len.checked_sub(1) else {
                return Ok(());
            };
            self.remove_at(index)?;
        }
    }

    fn destroy_items(&self) {
        if !self.source.is_reference() {
            for component in self.snapshot() {
                let child = C::upcast(component);
                if child.core().parent_gid().as_ref() == Some(&self.owner) {
                    child.destroy();
                }
            }
        }
        if let Err(err) = self.clear_items() {
            error!("Failed to clear '{}': {}", self.source.path(), err);
        }
    }

    fn fire_change(&self, old: Vec<Rc<C>>) -> Result<(), SyncError> {
        let current = self.snapshot();
        let unchanged = old.len() == current.len()
            && old.iter().zip(&current).all(|(old, current)| Rc::ptr_eq(old, current));
        if unchanged {
            return Ok(());
        }
        self.events.change.fire(&ValueChange {
            path: self.source.path().to_string(),
            is_reference: self.source.is_reference(),
            current: Some(current),
            old: Some(old),
        })
    }

    fn should_retry(&self) -> bool {
        let generation = self
            .factory
            .upgrade()
            .map(|factory| factory.registry().generation())
            .unwrap_or_default();
        self.source.should_retry(generation)
    }

    fn retry(&self) -> Result<(), SyncError> {
        let collection = self.source.current_source().as_collection().cloned();
        self.model_to_component(collection)
    }

    fn track(&self, factory: &Factory, held: Vec<Gid>, missing: Vec<Gid>) {
        let sync: Weak<dyn ChildSync> = self.self_weak.clone();
        factory.track_references(&sync, held, missing);
    }

    fn holds(&self, gid: &Gid) -> bool {
        self.items
            .borrow()
            .iter()
            .any(|component| C::upcast(component.clone()).gid() == gid)
    }

    fn position_of(&self, component: &Rc<C>) -> Option<usize> {
        self.items
            .borrow()
            .iter()
            .position(|item| Rc::ptr_eq(item, component))
    }

    fn snapshot(&self) -> Vec<Rc<C>> {
        self.items.borrow().clone()
    }
}

impl<C: ComponentType + ?Sized> ChildSync for ListInner<C> {
    fn path(&self) -> &str {
        self.source.path()
    }

    fn is_reference(&self) -> bool {
        self.source.is_reference()
    }

    fn start_watching(&self) -> Result<(), SyncError> {
        self.begin_watching()
    }

    fn stop_watching(&self) {
        self.end_watching();
    }

    fn resolve_references(&self) -> Result<(), SyncError> {
        if !self.source.is_pending() {
            return Ok(());
        }
        self.retry()
    }

    fn release(&self, gid: &Gid) -> Result<(), SyncError> {
        if !self.source.is_reference() || !self.holds(gid) {
            return Ok(());
        }
        self.retry()
    }

    fn components(&self) -> Vec<Rc<dyn Component>> {
        self.snapshot().into_iter().map(C::upcast).collect()
    }

    fn destroy(&self) {
        self.end_watching();
        self.destroy_items();
        if self.source.is_reference() {
            if let Some(factory) = self.factory.upgrade() {
                let sync: Weak<dyn ChildSync> = self.self_weak.clone();
                factory.untrack_references(&sync);
            }
        }
    }
}

fn gids_of<C: ComponentType + ?Sized>(components: &[Rc<C>]) -> Vec<Gid> {
    components
        .iter()
        .map(|component| C::upcast(component.clone()).gid().clone())
        .collect()
}
