use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use crate::{Emitter, SyncError};

use super::{
    node::{NodeInner, Owner},
    Model,
};

/// Fired by a collection when an item is added or removed
#[derive(Clone, Debug)]
pub struct CollectionEvent {
    pub item: Model,
    pub index: usize,
}

pub(crate) struct CollectionInner {
    item_type: Cell<Option<&'static str>>,
    reference: Cell<bool>,
    owner: RefCell<Option<(Weak<NodeInner>, String)>>,
    items: RefCell<Vec<Model>>,
    added: Emitter<CollectionEvent>,
    removed: Emitter<CollectionEvent>,
}

/// Ordered, duplicate-free list of model nodes. A collection stored in an
/// owned property owns its items; one stored in a reference property only
/// links to them.
#[derive(Clone)]
pub struct Collection {
    inner: Rc<CollectionInner>,
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

impl Collection {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(CollectionInner {
                item_type: Cell::new(None),
                reference: Cell::new(false),
                owner: RefCell::new(None),
                items: RefCell::new(Vec::new()),
                added: Emitter::new(),
                removed: Emitter::new(),
            }),
        }
    }

    /// A detached collection pre-filled with items, ready to be assigned to
    /// a property. Items are claimed when the collection is assigned.
    pub fn with_items(items: impl IntoIterator<Item = Model>) -> Self {
        let collection = Self::new();
        {
            let mut list = collection.inner.items.borrow_mut();
            for item in items {
                if !list.iter().any(|existing| existing.ptr_eq(&item)) {
                    list.push(item);
                }
            }
        }
        collection
    }

    pub(crate) fn from_inner(inner: Rc<CollectionInner>) -> Self {
        Self { inner }
    }

    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_reference(&self) -> bool {
        self.inner.reference.get()
    }

    pub fn item_type(&self) -> Option<&'static str> {
        self.inner.item_type.get()
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Snapshot of the current items, in order
    pub fn items(&self) -> Vec<Model> {
        self.inner.items.borrow().clone()
    }

    pub fn get(&self, index: usize) -> Option<Model> {
        self.inner.items.borrow().get(index).cloned()
    }

    pub fn contains(&self, item: &Model) -> bool {
        self.index_of(item).is_some()
    }

    pub fn index_of(&self, item: &Model) -> Option<usize> {
        self.inner
            .items
            .borrow()
            .iter()
            .position(|existing| existing.ptr_eq(item))
    }

    /// Appends an item. Adding an item that is already present is a no-op.
    pub fn add(&self, item: Model) -> Result<(), SyncError> {
        if let Some(item_type) = self.item_type() {
            if !item.is_a(item_type) {
                return Err(SyncError::TypeMismatch {
                    path: self.owner_path(),
                    expected: format!("node<{}>", item_type),
                    actual: format!("node<{}>", item.model_type()),
                });
            }
        }
        if self.contains(&item) {
            return Ok(());
        }

        if !self.is_reference() {
            item.detach()?;
        }

        let index = {
            let mut items = self.inner.items.borrow_mut();
            items.push(item.clone());
            items.len() - 1
        };
        if !self.is_reference() {
            item.set_owner(Owner::Collection(Rc::downgrade(&self.inner)));
        }

        self.inner.added.fire(&CollectionEvent { item, index })
    }

    /// Removes an item, returns false if it was not in the collection.
    pub fn remove(&self, item: &Model) -> Result<bool, SyncError> {
        let Some(index) = self.index_of(item) else {
            return Ok(false);
        };
        self.inner.items.borrow_mut().remove(index);
        if !self.is_reference() {
            item.clear_owner_if_collection(&self.inner);
        }

        self.inner.removed.fire(&CollectionEvent {
            item: item.clone(),
            index,
        })?;
        Ok(true)
    }

    /// Removes every item, last first, firing `removed` for each
    pub fn clear(&self) -> Result<(), SyncError> {
        while let Some(item) = self.get(self.len().wrapping_sub(1)) {
            self.remove(&item)?;
        }
        Ok(())
    }

    pub fn added(&self) -> &Emitter<CollectionEvent> {
        &self.inner.added
    }

    pub fn removed(&self) -> &Emitter<CollectionEvent> {
        &self.inner.removed
    }

    // Internal

    /// Called when the collection is stored in a property: takes the
    /// property's item type and reference flag, and claims items if owned.
    pub(crate) fn adopt(
        &self,
        node: &Model,
        property: &str,
        item_type: Option<&'static str>,
        reference: bool,
    ) -> Result<(), SyncError> {
        *self.inner.owner.borrow_mut() = Some((node.downgrade(), property.to_string()));
        self.inner.item_type.set(item_type);
        self.inner.reference.set(reference);

        if !reference {
            for item in self.items() {
                if !item.is_owned_by_collection(&self.inner) {
                    item.detach()?;
                    item.set_owner(Owner::Collection(Rc::downgrade(&self.inner)));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn release_owner(&self) {
        *self.inner.owner.borrow_mut() = None;
    }

    fn owner_path(&self) -> String {
        match &*self.inner.owner.borrow() {
            Some((node, property)) => match node.upgrade() {
                Some(node) => format!("{}.{}", Model::from_inner(node).gid(), property),
                None => property.clone(),
            },
            None => "collection".to_string(),
        }
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.items.borrow().iter()).finish()
    }
}
