use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use log::warn;

use crate::{
    emitter::ListenerId,
    model::{Gid, Record},
    Emitter, SyncError,
};

/// Whether an action may be invoked by triggers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// Exposed to triggers and other controllers
    Controller,
    /// Only callable from the owning component
    Internal,
}

/// A named operation a component exposes. The payload is an optional record.
pub struct Action {
    name: String,
    kind: ActionKind,
    handlers: Emitter<Option<Record>>,
}

impl Action {
    fn new(name: &str, kind: ActionKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            handlers: Emitter::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn is_controller_action(&self) -> bool {
        self.kind == ActionKind::Controller
    }

    pub fn on(
        &self,
        handler: impl Fn(&Option<Record>) -> Result<(), SyncError> + 'static,
    ) -> ListenerId {
        self.handlers.on(handler)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.handlers.off(id)
    }

    pub fn invoke(&self, payload: Option<Record>) -> Result<(), SyncError> {
        self.handlers.fire(&payload)
    }
}

pub struct ActionRegistry {
    owner: Gid,
    actions: RefCell<BTreeMap<String, Rc<Action>>>,
}

impl ActionRegistry {
    pub(crate) fn new(owner: Gid) -> Self {
        Self {
            owner,
            actions: RefCell::new(BTreeMap::new()),
        }
    }

    /// Declares an action, returning the existing one if the name is taken
    pub fn declare(&self, name: &str, kind: ActionKind) -> Rc<Action> {
        let mut actions = self.actions.borrow_mut();
        if let Some(existing) = actions.get(name) {
            if existing.kind != kind {
                warn!(
                    "Action '{}' on {} already declared as {:?}",
                    name, self.owner, existing.kind
                );
            }
            return existing.clone();
        }
        let action = Rc::new(Action::new(name, kind));
        actions.insert(name.to_string(), action.clone());
        action
    }

    pub fn get(&self, name: &str) -> Option<Rc<Action>> {
        self.actions.borrow().get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.actions.borrow().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.actions.borrow().keys().cloned().collect()
    }

    /// Invokes an action by name from outside the component. Only controller
    /// actions may be invoked this way.
    pub fn invoke(&self, name: &str, payload: Option<Record>) -> Result<(), SyncError> {
        let Some(action) = self.get(name) else {
            return Err(SyncError::UnknownAction {
                gid: self.owner.clone(),
                action: name.to_string(),
            });
        };
        if !action.is_controller_action() {
            return Err(SyncError::NotAnAction {
                gid: self.owner.clone(),
                action: name.to_string(),
            });
        }
        action.invoke(payload)
    }

    pub(crate) fn clear_listeners(&self) {
        for action in self.actions.borrow().values() {
            action.handlers.clear();
        }
    }
}
