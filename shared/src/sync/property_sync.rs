use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use log::error;

use crate::{
    component::{ChildSync, Component, ComponentType},
    emitter::ListenerId,
    factory::FactoryRef,
    model::{Gid, Model, Value, ValueKind},
    Emitter, SyncError,
};

use super::sync_source::SyncSource;

/// Values a sync can hold. `same` is the identity used to decide whether a
/// change event fires.
pub trait SyncValue: Clone + 'static {
    fn same(&self, other: &Self) -> bool;

    fn as_component(&self) -> Option<Rc<dyn Component>> {
        None
    }
}

impl SyncValue for Value {
    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

impl<C: ComponentType + ?Sized> SyncValue for Rc<C> {
    fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }

    fn as_component(&self) -> Option<Rc<dyn Component>> {
        Some(C::upcast(self.clone()))
    }
}

/// Outcome of resolving a raw model value
pub enum Resolution<T> {
    Resolved(T),
    /// The source is null
    Empty,
    /// A reference whose targets are not registered yet
    Pending(Vec<Gid>),
    /// Logged by the resolver; the sync holds nothing
    Failed,
}

/// Fired when the resolved value changes identity
#[derive(Clone)]
pub struct ValueChange<T> {
    pub path: String,
    pub is_reference: bool,
    pub current: Option<T>,
    pub old: Option<T>,
}

type Resolver<T> = Box<dyn Fn(&Value, bool) -> Result<Resolution<T>, SyncError>>;

pub(crate) struct PropertySyncInner<T: SyncValue> {
    source: SyncSource,
    owner: Option<Gid>,
    factory: Option<FactoryRef>,
    resolver: Resolver<T>,
    current: RefCell<Option<T>>,
    change: Emitter<ValueChange<T>>,
    self_weak: Weak<PropertySyncInner<T>>,
}

/// Mirrors the value at one model path, resolved to `T`.
///
/// Writes go through `set` to the model; the sync only ever updates from
/// the model watcher, so local and external edits look the same.
pub struct PropertySync<T: SyncValue> {
    inner: Rc<PropertySyncInner<T>>,
}

impl<T: SyncValue> Clone for PropertySync<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl PropertySync<Value> {
    /// Passes raw values through, typed by the declared property
    pub fn plain(model: &Model, path: &str) -> Result<Self, SyncError> {
        Self::new(model, path, None, pass_through)
    }

    /// Passes raw values through, validated against a narrower kind
    pub fn plain_as(model: &Model, path: &str, expected: ValueKind) -> Result<Self, SyncError> {
        Self::new(model, path, Some(expected), pass_through)
    }
}

fn pass_through(value: &Value, _is_reference: bool) -> Result<Resolution<Value>, SyncError> {
    Ok(match value {
        Value::Null => Resolution::Empty,
        value => Resolution::Resolved(value.clone()),
    })
}

impl<T: SyncValue> PropertySync<T> {
    pub fn new(
        model: &Model,
        path: &str,
        expected: Option<ValueKind>,
        resolver: impl Fn(&Value, bool) -> Result<Resolution<T>, SyncError> + 'static,
    ) -> Result<Self, SyncError> {
        Self::build(model, path, expected, None, None, Box::new(resolver))
    }

    pub(crate) fn build(
        model: &Model,
        path: &str,
        expected: Option<ValueKind>,
        owner: Option<Gid>,
        factory: Option<FactoryRef>,
        resolver: Resolver<T>,
    ) -> Result<Self, SyncError> {
        let source = SyncSource::new(model, path, expected)?;
        let inner = Rc::new_cyclic(|self_weak| PropertySyncInner {
            source,
            owner,
            factory,
            resolver,
            current: RefCell::new(None),
            change: Emitter::new(),
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

    /// Resolved value. A pending reference is retried first, but only if
    /// its source or the registry changed since the last attempt.
    pub fn current(&self) -> Option<T> {
        if self.inner.should_retry() {
            if let Err(err) = self.inner.retry() {
                error!("Failed to resolve '{}': {}", self.path(), err);
            }
        }
        self.inner.current.borrow().clone()
    }

    /// Like `current`, but a reference that is set and still unresolved is
    /// an error
    pub fn try_current(&self) -> Result<Option<T>, SyncError> {
        if self.inner.should_retry() {
            self.inner.retry()?;
        }
        if self.inner.source.is_pending() {
            return Err(SyncError::UnresolvedReference {
                path: self.path().to_string(),
            });
        }
        Ok(self.inner.current.borrow().clone())
    }

    /// Last raw value received from the model
    pub fn current_source(&self) -> Value {
        self.inner.source.current_source()
    }

    /// Raw value the reference was last resolved for
    pub fn resolved_reference(&self) -> Value {
        self.inner.source.resolved_reference()
    }

    /// Writes through to the model
    pub fn set(&self, value: impl Into<Value>) -> Result<(), SyncError> {
        let value = value.into();
        self.inner.source.check(&value)?;
        self.model().set_path(self.path(), value)
    }

    /// Re-reads the model and resolves again
    pub fn sync(&self) -> Result<(), SyncError> {
        self.inner.on_source_changed(&self.inner.source.read())
    }

    pub fn start_watching(&self) -> Result<(), SyncError> {
        self.inner.begin_watching()
    }

    pub fn stop_watching(&self) {
        self.inner.source.unwatch();
    }

    pub fn resolve_references(&self) -> Result<(), SyncError> {
        self.inner.resolve_references()
    }

    pub fn change(&self) -> &Emitter<ValueChange<T>> {
        &self.inner.change
    }

    pub fn on_change(
        &self,
        handler: impl Fn(&ValueChange<T>) -> Result<(), SyncError> + 'static,
    ) -> ListenerId {
        self.inner.change.on(handler)
    }

    /// Runs `callback` for the current value, if any, and for every new value
    pub fn init(
        &self,
        callback: impl Fn(&T) -> Result<(), SyncError> + 'static,
    ) -> Result<ListenerId, SyncError> {
        let existing = self.inner.current.borrow().clone();
        if let Some(value) = &existing {
            callback(value)?;
        }
        Ok(self.inner.change.on(move |change| match &change.current {
            Some(value) => callback(value),
            None => Ok(()),
        }))
    }

    /// Runs `callback` for every value that is replaced or cleared
    pub fn deinit(&self, callback: impl Fn(&T) -> Result<(), SyncError> + 'static) -> ListenerId {
        self.inner.change.on(move |change| match &change.old {
            Some(value) => callback(value),
            None => Ok(()),
        })
    }

    pub(crate) fn as_child_sync(&self) -> Rc<dyn ChildSync> {
        self.inner.clone()
    }
}

impl<T: SyncValue> PropertySyncInner<T> {
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

    fn on_source_changed(&self, value: &Value) -> Result<(), SyncError> {
        self.source.check(value)?;
        self.source.record_source(value);
        self.sync_value(value)
    }

    fn sync_value(&self, value: &Value) -> Result<(), SyncError> {
        let reference = self.source.is_reference();
        let mut held = Vec::new();
        let mut missing = Vec::new();
        let next = match (self.resolver)(value, reference)? {
            Resolution::Resolved(resolved) => {
                if reference {
                    self.source.set_resolved(value.clone());
                    held.extend(resolved.as_component().map(|c| c.gid().clone()));
                }
                Some(resolved)
            }
            Resolution::Empty => {
                if reference {
                    self.source.set_resolved(Value::Null);
                }
                None
            }
            Resolution::Pending(gids) => {
                self.source.set_resolved(Value::Null);
                missing = gids;
                None
            }
            Resolution::Failed => None,
        };
        if reference {
            self.source.set_attempted(value, self.generation());
            self.track(held, missing);
        }
        self.update(next)
    }

    fn update(&self, next: Option<T>) -> Result<(), SyncError> {
        let old = self.current.replace(next.clone());
        let unchanged = match (&old, &next) {
            (Some(old), Some(next)) => old.same(next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Ok(());
        }

        self.change.fire(&ValueChange {
            path: self.source.path().to_string(),
            is_reference: self.source.is_reference(),
            current: next,
            old,
        })
    }

    fn should_retry(&self) -> bool {
        self.source.should_retry(self.generation())
    }

    fn retry(&self) -> Result<(), SyncError> {
        self.sync_value(&self.source.current_source())
    }

    fn generation(&self) -> u64 {
        self.factory
            .as_ref()
            .and_then(FactoryRef::upgrade)
            .map(|factory| factory.registry().generation())
            .unwrap_or_default()
    }

    fn track(&self, held: Vec<Gid>, missing: Vec<Gid>) {
        let Some(factory) = self.factory.as_ref().and_then(FactoryRef::upgrade) else {
            return;
        };
        let sync: Weak<dyn ChildSync> = self.self_weak.clone();
        factory.track_references(&sync, held, missing);
    }

    fn holds(&self, gid: &Gid) -> bool {
        self.current
            .borrow()
            .as_ref()
            .and_then(SyncValue::as_component)
            .is_some_and(|component| component.gid() == gid)
    }
}

impl<T: SyncValue> ChildSync for PropertySyncInner<T> {
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
        self.source.unwatch();
    }

    /// Retries only while the reference is pending; a resolved reference
    /// stays pinned to its source.
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
        self.current
            .borrow()
            .as_ref()
            .and_then(SyncValue::as_component)
            .into_iter()
            .collect()
    }

    fn destroy(&self) {
        self.source.unwatch();
        let current = self.current.borrow_mut().take();
        if self.source.is_reference() {
            if let Some(factory) = self.factory.as_ref().and_then(FactoryRef::upgrade) {
                let sync: Weak<dyn ChildSync> = self.self_weak.clone();
                factory.untrack_references(&sync);
            }
            return;
        }
        let Some(child) = current.as_ref().and_then(SyncValue::as_component) else {
            return;
        };
        if child.core().parent_gid() == self.owner {
            child.destroy();
        }
    }
}
