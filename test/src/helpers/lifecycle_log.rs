use std::{cell::RefCell, rc::Rc};

use parallax_shared::Gid;

/// Shared record of lifecycle hooks, as `"<hook> <gid>"` lines
#[derive(Clone, Default)]
pub struct LifecycleLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl LifecycleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, hook: &str, gid: &Gid) {
        self.entries.borrow_mut().push(format!("{} {}", hook, gid));
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Gids that went through `hook`, in order
    pub fn gids_for(&self, hook: &str) -> Vec<String> {
        let prefix = format!("{} ", hook);
        self.entries
            .borrow()
            .iter()
            .filter_map(|entry| entry.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn count(&self, hook: &str) -> usize {
        self.gids_for(hook).len()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
