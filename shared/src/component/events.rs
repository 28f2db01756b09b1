use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use crate::{emitter::ListenerId, model::Gid, model::Value, Emitter, SyncError};

/// Named events a component emits. Events must be declared before they can
/// be listened to or fired.
pub struct EventRegistry {
    owner: Gid,
    events: RefCell<BTreeMap<String, Rc<Emitter<Value>>>>,
}

impl EventRegistry {
    pub(crate) fn new(owner: Gid) -> Self {
        Self {
            owner,
            events: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn declare(&self, name: &str) -> Rc<Emitter<Value>> {
        self.events
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| Rc::new(Emitter::new()))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Rc<Emitter<Value>>> {
        self.events.borrow().get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.events.borrow().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.events.borrow().keys().cloned().collect()
    }

    pub fn on(
        &self,
        name: &str,
        handler: impl Fn(&Value) -> Result<(), SyncError> + 'static,
    ) -> Result<ListenerId, SyncError> {
        Ok(self.emitter(name)?.on(handler))
    }

    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        self.get(name).is_some_and(|emitter| emitter.off(id))
    }

    pub fn fire(&self, name: &str, payload: impl Into<Value>) -> Result<(), SyncError> {
        self.emitter(name)?.fire(&payload.into())
    }

    pub(crate) fn clear_listeners(&self) {
        for emitter in self.events.borrow().values() {
            emitter.clear();
        }
    }

    fn emitter(&self, name: &str) -> Result<Rc<Emitter<Value>>, SyncError> {
        self.get(name).ok_or_else(|| SyncError::UnknownEvent {
            gid: self.owner.clone(),
            event: name.to_string(),
        })
    }
}
