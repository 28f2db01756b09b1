use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::SyncError;

pub type ListenerId = u64;

type Handler<T> = Rc<dyn Fn(&T) -> Result<(), SyncError>>;

/// A single named event: handlers are called synchronously, in registration
/// order, with a shared reference to the fired value.
///
/// The handler list is snapshotted before dispatch, so handlers may register
/// or remove listeners on the same emitter while it is firing. The first
/// handler error stops dispatch and is returned to the caller of `fire`.
pub struct Emitter<T> {
    next_id: Cell<ListenerId>,
    listeners: RefCell<Vec<(ListenerId, Handler<T>)>>,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Emitter<T> {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn on(&self, handler: impl Fn(&T) -> Result<(), SyncError> + 'static) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(index) = listeners.iter().position(|(listener_id, _)| *listener_id == id) else {
            return false;
        };
        listeners.remove(index);
        true
    }

    pub fn fire(&self, event: &T) -> Result<(), SyncError> {
        let handlers: Vec<Handler<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler(event)?;
        }
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}
