use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use crate::{component::ChildSync, model::Gid};

/// Reference syncs keyed by a gid: the gids a sync is waiting for, or the
/// gids it has resolved to.
pub(crate) struct ReferenceIndex {
    syncs: RefCell<HashMap<Gid, Vec<Weak<dyn ChildSync>>>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self {
            syncs: RefCell::new(HashMap::new()),
        }
    }

    /// Adds `sync` under every gid. Entries left with no live sync are
    /// dropped on the way.
    pub fn insert(&self, gids: impl IntoIterator<Item = Gid>, sync: &Weak<dyn ChildSync>) {
        let mut syncs = self.syncs.borrow_mut();
        syncs.retain(|_, entry| {
            entry.retain(|existing| existing.strong_count() > 0);
            !entry.is_empty()
        });
        for gid in gids {
            let entry = syncs.entry(gid).or_default();
            if !entry.iter().any(|existing| Weak::ptr_eq(existing, sync)) {
                entry.push(sync.clone());
            }
        }
    }

    /// Removes `sync` from every gid
    pub fn forget(&self, sync: &Weak<dyn ChildSync>) {
        self.syncs.borrow_mut().retain(|_, entry| {
            entry.retain(|existing| !Weak::ptr_eq(existing, sync));
            !entry.is_empty()
        });
    }

    /// Removes and returns the live syncs under a gid
    pub fn take(&self, gid: &Gid) -> Vec<Rc<dyn ChildSync>> {
        let Some(syncs) = self.syncs.borrow_mut().remove(gid) else {
            return Vec::new();
        };
        syncs.iter().filter_map(Weak::upgrade).collect()
    }

    /// Number of gids with at least one entry
    pub fn len(&self) -> usize {
        self.syncs.borrow().len()
    }
}
