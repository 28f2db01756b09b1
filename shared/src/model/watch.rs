use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use crate::{emitter::ListenerId, SyncError};

use super::{node::NodeInner, Model, Value};

/// Delivered to a path watcher when the value at its path changes identity
#[derive(Clone, Debug)]
pub struct WatchChange {
    pub new_value: Value,
    pub old_value: Value,
    pub path: String,
}

type WatchHandler = Rc<dyn Fn(&WatchChange) -> Result<(), SyncError>>;

struct WatchState {
    root: Model,
    path: String,
    segments: Vec<String>,
    handler: WatchHandler,
    // one listener per node along the path, root first
    links: RefCell<Vec<(Weak<NodeInner>, ListenerId)>>,
    last: RefCell<Value>,
    active: Cell<bool>,
}

/// Subscription to a dotted path on a model node. Replacing any node along
/// the path re-links the subscription to the new nodes.
///
/// Dropping the watcher unsubscribes it.
pub struct Watcher {
    state: Rc<WatchState>,
}

impl Watcher {
    pub(crate) fn new(root: Model, path: &str, handler: WatchHandler) -> Self {
        let state = Rc::new(WatchState {
            last: RefCell::new(root.path(path)),
            root,
            path: path.to_string(),
            segments: path.split('.').map(str::to_string).collect(),
            handler,
            links: RefCell::new(Vec::new()),
            active: Cell::new(true),
        });
        WatchState::relink(&state);
        Self { state }
    }

    pub fn path(&self) -> &str {
        &self.state.path
    }

    /// The value at the watched path right now
    pub fn current(&self) -> Value {
        self.state.root.path(&self.state.path)
    }

    pub fn is_active(&self) -> bool {
        self.state.active.get()
    }

    pub fn unwatch(&self) {
        self.state.active.set(false);
        self.state.unlink();
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.unwatch();
    }
}

impl WatchState {
    fn relink(state: &Rc<WatchState>) {
        state.unlink();

        let mut links = Vec::new();
        let mut node = Some(state.root.clone());
        for (depth, segment) in state.segments.iter().enumerate() {
            let Some(current) = node.take() else {
                break;
            };

            let weak_state = Rc::downgrade(state);
            let property = segment.clone();
            let leaf = depth + 1 == state.segments.len();
            let id = current.on_change(move |change| {
                if change.property != property {
                    return Ok(());
                }
                match weak_state.upgrade() {
                    Some(state) => WatchState::on_link_changed(&state, !leaf),
                    None => Ok(()),
                }
            });
            links.push((current.downgrade(), id));

            if !leaf {
                node = current.get(segment).as_node().cloned();
            }
        }

        *state.links.borrow_mut() = links;
    }

    fn unlink(&self) {
        let links = std::mem::take(&mut *self.links.borrow_mut());
        for (node, id) in links {
            if let Some(node) = node.upgrade() {
                Model::from_inner(node).off_change(id);
            }
        }
    }

    fn on_link_changed(state: &Rc<WatchState>, relink: bool) -> Result<(), SyncError> {
        if !state.active.get() {
            return Ok(());
        }
        if relink {
            WatchState::relink(state);
        }

        let new_value = state.root.path(&state.path);
        let old_value = state.last.replace(new_value.clone());
        if new_value == old_value {
            return Ok(());
        }

        (state.handler)(&WatchChange {
            new_value,
            old_value,
            path: state.path.clone(),
        })
    }
}
