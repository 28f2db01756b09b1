use std::cell::{Cell, RefCell};

use crate::{
    model::{Model, Value, ValueKind, WatchChange, Watcher},
    SyncError,
};

/// Watched model path plus the bookkeeping every sync primitive shares:
/// the last raw value seen, and for references the value that resolved and
/// the last value a resolution was attempted for.
pub(crate) struct SyncSource {
    model: Model,
    path: String,
    expected: ValueKind,
    is_reference: bool,
    current_source: RefCell<Value>,
    resolved_reference: RefCell<Value>,
    attempted: RefCell<Option<(Value, u64)>>,
    watcher: RefCell<Option<Watcher>>,
    watching: Cell<bool>,
}

impl SyncSource {
    pub fn new(model: &Model, path: &str, expected: Option<ValueKind>) -> Result<Self, SyncError> {
        let def = model.property_def_at(path)?;
        Ok(Self {
            model: model.clone(),
            path: path.to_string(),
            expected: expected.unwrap_or_else(|| def.kind().clone()),
            is_reference: def.is_reference(),
            current_source: RefCell::new(Value::Null),
            resolved_reference: RefCell::new(Value::Null),
            attempted: RefCell::new(None),
            watcher: RefCell::new(None),
            watching: Cell::new(false),
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_reference(&self) -> bool {
        self.is_reference
    }

    pub fn is_watching(&self) -> bool {
        self.watching.get()
    }

    /// Value at the path right now, read from the model
    pub fn read(&self) -> Value {
        self.model.path(&self.path)
    }

    pub fn check(&self, value: &Value) -> Result<(), SyncError> {
        if self.expected.accepts(value) {
            return Ok(());
        }
        Err(SyncError::TypeMismatch {
            path: self.path.clone(),
            expected: self.expected.to_string(),
            actual: value.type_name(),
        })
    }

    /// Subscribes without firing. Returns false if already watching.
    pub fn watch(
        &self,
        handler: impl Fn(&WatchChange) -> Result<(), SyncError> + 'static,
    ) -> Result<bool, SyncError> {
        if self.watching.get() {
            return Ok(false);
        }
        let watcher = self.model.watch(&self.path, handler)?;
        *self.watcher.borrow_mut() = Some(watcher);
        self.watching.set(true);
        Ok(true)
    }

    pub fn unwatch(&self) {
        self.watching.set(false);
        if let Some(watcher) = self.watcher.borrow_mut().take() {
            watcher.unwatch();
        }
    }

    pub fn current_source(&self) -> Value {
        self.current_source.borrow().clone()
    }

    pub fn record_source(&self, value: &Value) {
        *self.current_source.borrow_mut() = value.clone();
    }

    pub fn resolved_reference(&self) -> Value {
        self.resolved_reference.borrow().clone()
    }

    pub fn set_resolved(&self, value: Value) {
        *self.resolved_reference.borrow_mut() = value;
    }

    pub fn set_attempted(&self, value: &Value, generation: u64) {
        *self.attempted.borrow_mut() = Some((value.clone(), generation));
    }

    /// Whether a set reference source has not been resolved yet
    pub fn is_pending(&self) -> bool {
        if !self.is_reference {
            return false;
        }
        let source = self.current_source.borrow();
        !source.is_null() && *source != *self.resolved_reference.borrow()
    }

    /// Whether a lazy retry could succeed: the reference is pending and
    /// either the source or the registry changed since the last attempt.
    pub fn should_retry(&self, generation: u64) -> bool {
        if !self.is_pending() {
            return false;
        }
        match &*self.attempted.borrow() {
            Some((value, attempted_generation)) => {
                *value != *self.current_source.borrow() || *attempted_generation != generation
            }
            None => true,
        }
    }
}
