use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    rc::{Rc, Weak},
};

use log::{error, info, warn};

use crate::{
    component::{ChildSync, Component, ComponentType},
    model::{Gid, Model},
    SyncError,
};

use super::{reference_index::ReferenceIndex, FactoryConfig, Registry};

/// Builds the component for a model node. The component's core must be
/// bound to the given model.
pub type Constructor = Rc<dyn Fn(Model, &Factory) -> Result<Rc<dyn Component>, SyncError>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FactoryStats {
    /// Calls to `resolve`, hits included
    pub resolutions: u64,
    /// Components built by a constructor
    pub constructions: u64,
}

pub(crate) struct FactoryInner {
    config: FactoryConfig,
    registry: Registry,
    constructors: RefCell<HashMap<String, Constructor>>,
    resolving: RefCell<HashSet<Gid>>,
    /// Reference syncs waiting for a gid to get a component
    waiting: ReferenceIndex,
    /// Reference syncs holding the component registered under a gid
    pinned: ReferenceIndex,
    counterpart: RefCell<Option<Weak<FactoryInner>>>,
    stats: Cell<FactoryStats>,
}

/// Maps model types to component constructors and owns the registry of
/// live components. Cloning yields another handle to the same factory.
#[derive(Clone)]
pub struct Factory {
    inner: Rc<FactoryInner>,
}

/// Non-owning factory handle held by components
#[derive(Clone)]
pub struct FactoryRef {
    inner: Weak<FactoryInner>,
}

impl FactoryRef {
    pub fn upgrade(&self) -> Option<Factory> {
        self.inner.upgrade().map(|inner| Factory { inner })
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}

impl Factory {
    pub fn new() -> Self {
        Self::with_config(FactoryConfig::default())
    }

    pub fn with_config(config: FactoryConfig) -> Self {
        Self {
            inner: Rc::new(FactoryInner {
                config,
                registry: Registry::new(),
                constructors: RefCell::new(HashMap::new()),
                resolving: RefCell::new(HashSet::new()),
                waiting: ReferenceIndex::new(),
                pinned: ReferenceIndex::new(),
                counterpart: RefCell::new(None),
                stats: Cell::new(FactoryStats::default()),
            }),
        }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.inner.config
    }

    pub fn downgrade(&self) -> FactoryRef {
        FactoryRef {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn ptr_eq(&self, other: &Factory) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn stats(&self) -> FactoryStats {
        self.inner.stats.get()
    }

    // Mapping

    /// Maps a model type, and every type extending it without its own
    /// mapping, to a constructor
    pub fn register(
        &self,
        model_type: &str,
        constructor: impl Fn(Model, &Factory) -> Result<Rc<dyn Component>, SyncError> + 'static,
    ) {
        let previous = self
            .inner
            .constructors
            .borrow_mut()
            .insert(model_type.to_string(), Rc::new(constructor));
        if previous.is_some() {
            warn!("Replaced component constructor for model type '{}'", model_type);
        }
    }

    /// Typed convenience over `register`
    pub fn register_component<C: Component>(
        &self,
        model_type: &str,
        constructor: impl Fn(Model, &Factory) -> Result<Rc<C>, SyncError> + 'static,
    ) {
        self.register(model_type, move |model, factory| {
            let component: Rc<dyn Component> = constructor(model, factory)?;
            Ok(component)
        });
    }

    pub fn has_mapping(&self, model_type: &str) -> bool {
        self.inner.constructors.borrow().contains_key(model_type)
    }

    /// Constructor for a model, searching its own type first, then each
    /// ancestor type
    fn constructor_for(&self, model: &Model) -> Option<Constructor> {
        let constructors = self.inner.constructors.borrow();
        model
            .schema()
            .ancestors()
            .iter()
            .find_map(|model_type| constructors.get(*model_type).cloned())
    }

    // Resolution

    /// Returns the component registered for a model, or builds one when
    /// `create` is set. A missing mapping or a component of another type is
    /// logged and yields `None`.
    pub fn resolve<C: ComponentType + ?Sized>(
        &self,
        model: &Model,
        create: bool,
    ) -> Result<Option<Rc<C>>, SyncError> {
        self.resolve_with::<C>(model, create, None)
    }

    /// Like `resolve`, but builds with the given constructor instead of the
    /// mapped one
    pub fn resolve_with<C: ComponentType + ?Sized>(
        &self,
        model: &Model,
        create: bool,
        constructor: Option<Constructor>,
    ) -> Result<Option<Rc<C>>, SyncError> {
        self.bump(|stats| stats.resolutions += 1);

        if let Some(existing) = self.inner.registry.by_gid(model.gid()) {
            return Ok(self.downcast::<C>(model, existing));
        }
        if !create {
            return Ok(None);
        }

        if self.inner.resolving.borrow().contains(model.gid()) {
            return Err(SyncError::ReentrantResolve {
                gid: model.gid().clone(),
            });
        }
        let Some(constructor) = constructor.or_else(|| self.constructor_for(model)) else {
            error!(
                "No component registered for model type '{}' ({})",
                model.model_type(),
                model.gid()
            );
            return Ok(None);
        };

        self.inner.resolving.borrow_mut().insert(model.gid().clone());
        let result = self.construct::<C>(model, &constructor);
        self.inner.resolving.borrow_mut().remove(model.gid());
        result
    }

    /// Builds the root component for a model. Fails if no component of the
    /// requested type can be produced.
    pub fn create<C: ComponentType + ?Sized>(&self, model: &Model) -> Result<Rc<C>, SyncError> {
        let Some(component) = self.resolve::<C>(model, true)? else {
            return Err(SyncError::CannotCreate {
                gid: model.gid().clone(),
                model_type: model.model_type(),
                expected: C::expected_name(),
            });
        };

        let root = C::upcast(component.clone());
        root.core().set_root(true);
        if !self.inner.config.activate_roots {
            root.core().set_enabled_flag(false);
        }
        root.refresh_active()?;

        if self.inner.config.resolve_references_on_create {
            self.resolve_references()?;
        }
        Ok(component)
    }

    /// Retries every pending reference in every registered component
    pub fn resolve_references(&self) -> Result<(), SyncError> {
        for component in self.inner.registry.all() {
            if !component.core().is_destroyed() {
                component.resolve_references()?;
            }
        }
        Ok(())
    }

    /// Destroys registered components that are neither roots nor parented
    /// and whose model has left the ownership tree. Returns the number
    /// destroyed.
    pub fn destroy_orphans(&self) -> usize {
        let orphans: Vec<_> = self
            .inner
            .registry
            .all()
            .into_iter()
            .filter(|component| {
                let core = component.core();
                !core.is_root()
                    && !core.is_destroyed()
                    && core.parent_gid().is_none()
                    && !core.model().is_attached()
            })
            .collect();

        let mut destroyed = 0;
        for orphan in orphans {
            // destroying an earlier orphan may have taken this one with it
            if !orphan.core().is_destroyed() {
                info!("Destroying orphaned component {:?}", orphan);
                orphan.destroy();
                destroyed += 1;
            }
        }
        destroyed
    }

    /// Destroys every registered component and empties the registry
    pub fn destroy_all(&self) {
        for component in self.inner.registry.clear() {
            component.destroy();
        }
    }

    // Counterpart

    /// Links this factory to the one building the other side of a
    /// controller/view pair
    pub fn set_counterpart(&self, other: &Factory) {
        *self.inner.counterpart.borrow_mut() = Some(Rc::downgrade(&other.inner));
    }

    pub fn counterpart_factory(&self) -> Option<Factory> {
        self.inner
            .counterpart
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Factory { inner })
    }

    /// The component registered under the same gid in the counterpart factory
    pub fn counterpart<C: ComponentType + ?Sized>(&self, gid: &Gid) -> Option<Rc<C>> {
        self.counterpart_factory()?.registry().by_gid_as::<C>(gid)
    }

    // Internal

    /// Records what a reference sync currently holds and what it still
    /// waits for, replacing whatever was recorded for it before
    pub(crate) fn track_references(
        &self,
        sync: &Weak<dyn ChildSync>,
        resolved: Vec<Gid>,
        missing: Vec<Gid>,
    ) {
        self.untrack_references(sync);
        if !resolved.is_empty() {
            self.inner.pinned.insert(resolved, sync);
        }
        if self.inner.config.auto_resolve_references && !missing.is_empty() {
            self.inner.waiting.insert(missing, sync);
        }
    }

    pub(crate) fn untrack_references(&self, sync: &Weak<dyn ChildSync>) {
        self.inner.pinned.forget(sync);
        self.inner.waiting.forget(sync);
    }

    /// Called once the component for `gid` is destroyed. References still
    /// holding it drop it and wait for a new component under that gid.
    pub(crate) fn release_references(&self, gid: &Gid) {
        for sync in self.inner.pinned.take(gid) {
            if let Err(err) = sync.release(gid) {
                error!("Failed to release '{}' from '{}': {}", gid, sync.path(), err);
            }
        }
    }

    fn construct<C: ComponentType + ?Sized>(
        &self,
        model: &Model,
        constructor: &Constructor,
    ) -> Result<Option<Rc<C>>, SyncError> {
        let component = constructor(model.clone(), self)?;
        let Some(typed) = C::downcast(component.clone()) else {
            error!(
                "Component built for {:?} is a {}, expected {}",
                model,
                component.type_name(),
                C::expected_name()
            );
            return Ok(None);
        };

        self.inner.registry.register(component.clone())?;
        self.bump(|stats| stats.constructions += 1);
        info!("Created component {:?}", component);

        if let Err(err) = component.clone().init() {
            component.destroy();
            return Err(err);
        }

        for sync in self.inner.waiting.take(model.gid()) {
            sync.resolve_references()?;
        }
        Ok(Some(typed))
    }

    fn downcast<C: ComponentType + ?Sized>(
        &self,
        model: &Model,
        component: Rc<dyn Component>,
    ) -> Option<Rc<C>> {
        let type_name = component.type_name();
        let typed = C::downcast(component);
        if typed.is_none() {
            error!(
                "Component for {:?} is a {}, expected {}",
                model,
                type_name,
                C::expected_name()
            );
        }
        typed
    }

    fn bump(&self, update: impl FnOnce(&mut FactoryStats)) {
        let mut stats = self.inner.stats.get();
        update(&mut stats);
        self.inner.stats.set(stats);
    }
}
