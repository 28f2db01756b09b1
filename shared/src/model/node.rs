use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt,
    rc::{Rc, Weak},
};

use crate::{emitter::ListenerId, Emitter, SyncError};

use super::{
    collection::CollectionInner,
    model_factory::ModelContext,
    watch::{WatchChange, Watcher},
    Collection, Gid, PropertyDef, Schema, Value, ValueKind,
};

/// Fired on a node whenever one of its own properties changes identity
#[derive(Clone, Debug)]
pub struct PropertyChange {
    pub property: String,
    pub new_value: Value,
    pub old_value: Value,
}

pub(crate) enum Owner {
    Property { node: Weak<NodeInner>, property: String },
    Collection(Weak<CollectionInner>),
}

/// Where a node currently lives in the ownership tree
#[derive(Clone, Debug)]
pub enum ModelOwner {
    Property(Model, String),
    Collection(Collection),
}

pub(crate) struct NodeInner {
    gid: Gid,
    schema: Rc<Schema>,
    context: Rc<ModelContext>,
    values: RefCell<BTreeMap<String, Value>>,
    owner: RefCell<Option<Owner>>,
    changed: Emitter<PropertyChange>,
}

impl Drop for NodeInner {
    fn drop(&mut self) {
        self.context.forget(&self.gid);
    }
}

/// Handle to an observable model node. Cloning the handle does not clone
/// the node; equality of handles is identity of nodes.
#[derive(Clone)]
pub struct Model {
    inner: Rc<NodeInner>,
}

impl Model {
    pub(crate) fn new(gid: Gid, schema: Rc<Schema>, context: Rc<ModelContext>) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                gid,
                schema,
                context,
                values: RefCell::new(BTreeMap::new()),
                owner: RefCell::new(None),
                changed: Emitter::new(),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<NodeInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<NodeInner> {
        Rc::downgrade(&self.inner)
    }

    pub fn gid(&self) -> &Gid {
        &self.inner.gid
    }

    pub fn model_type(&self) -> &'static str {
        self.inner.schema.model_type()
    }

    pub fn schema(&self) -> &Rc<Schema> {
        &self.inner.schema
    }

    pub fn is_a(&self, model_type: &str) -> bool {
        self.inner.schema.is_a(model_type)
    }

    pub fn ptr_eq(&self, other: &Model) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Current value of a property; null when unset or undeclared
    pub fn get(&self, property: &str) -> Value {
        self.inner
            .values
            .borrow()
            .get(property)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn set(&self, property: &str, value: impl Into<Value>) -> Result<(), SyncError> {
        let def = self.property_def(property)?.clone();
        let value = value.into();

        if value.is_null() && def.is_required() {
            return Err(SyncError::RequiredProperty {
                model_type: self.model_type(),
                property: property.to_string(),
            });
        }
        if !def.kind().accepts(&value) {
            return Err(SyncError::TypeMismatch {
                path: property.to_string(),
                expected: def.kind().to_string(),
                actual: value.type_name(),
            });
        }

        self.assign(&def, value)
    }

    /// Value at a dotted path, null if any segment is missing
    pub fn path(&self, path: &str) -> Value {
        let mut value = Value::Node(self.clone());
        for segment in path.split('.') {
            let Some(node) = value.as_node() else {
                return Value::Null;
            };
            value = node.get(segment);
        }
        value
    }

    pub fn set_path(&self, path: &str, value: impl Into<Value>) -> Result<(), SyncError> {
        let (parent, property) = match path.rsplit_once('.') {
            Some((prefix, property)) => {
                let Value::Node(parent) = self.path(prefix) else {
                    return Err(SyncError::NotANode {
                        path: prefix.to_string(),
                    });
                };
                (parent, property)
            }
            None => (self.clone(), path),
        };
        parent.set(property, value)
    }

    /// Declared property at a dotted path. Intermediate segments are looked
    /// up on the live node when present, else on the declared node type.
    pub fn property_def_at(&self, path: &str) -> Result<PropertyDef, SyncError> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut schema = self.inner.schema.clone();
        let mut live = Some(self.clone());

        for (depth, segment) in segments.iter().enumerate() {
            let Some(def) = schema.property_def(segment) else {
                return Err(SyncError::UnknownProperty {
                    model_type: schema.model_type(),
                    property: segments[..=depth].join("."),
                });
            };
            if depth + 1 == segments.len() {
                return Ok(def.clone());
            }

            let next_live = live.as_ref().and_then(|node| node.get(segment).as_node().cloned());
            schema = match (&next_live, def.kind()) {
                (Some(node), _) => node.schema().clone(),
                (None, ValueKind::Node(Some(model_type))) => self
                    .inner
                    .context
                    .schema(model_type)
                    .ok_or_else(|| SyncError::UnknownModelType {
                        model_type: model_type.to_string(),
                    })?,
                _ => {
                    return Err(SyncError::NotANode {
                        path: segments[..=depth].join("."),
                    })
                }
            };
            live = next_live;
        }

        Err(SyncError::NotANode {
            path: path.to_string(),
        })
    }

    /// Whether the property at a dotted path is flagged as a reference
    pub fn is_reference(&self, path: &str) -> Result<bool, SyncError> {
        Ok(self.property_def_at(path)?.is_reference())
    }

    pub fn collection(&self, property: &str) -> Result<Collection, SyncError> {
        match self.get(property) {
            Value::Collection(collection) => Ok(collection),
            other => Err(SyncError::TypeMismatch {
                path: property.to_string(),
                expected: "collection".to_string(),
                actual: other.type_name(),
            }),
        }
    }

    pub fn owner(&self) -> Option<ModelOwner> {
        match &*self.inner.owner.borrow() {
            Some(Owner::Property { node, property }) => node
                .upgrade()
                .map(|node| ModelOwner::Property(Model::from_inner(node), property.clone())),
            Some(Owner::Collection(collection)) => collection
                .upgrade()
                .map(|collection| ModelOwner::Collection(Collection::from_inner(collection))),
            None => None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.owner().is_some()
    }

    /// Removes this node from wherever it is currently owned, notifying the
    /// previous owner.
    pub fn detach(&self) -> Result<(), SyncError> {
        match self.owner() {
            Some(ModelOwner::Property(node, property)) => {
                if node.get(&property) == Value::Node(self.clone()) {
                    let def = node.property_def(&property)?.clone();
                    node.assign(&def, Value::Null)?;
                } else {
                    // stale link, the property was already overwritten
                    *self.inner.owner.borrow_mut() = None;
                }
            }
            Some(ModelOwner::Collection(collection)) => {
                if !collection.remove(self)? {
                    *self.inner.owner.borrow_mut() = None;
                }
            }
            None => {
                *self.inner.owner.borrow_mut() = None;
            }
        }
        Ok(())
    }

    /// Subscribes to changes of the value at a dotted path. The handler is
    /// not called for the current value; callers catch up themselves.
    pub fn watch(
        &self,
        path: &str,
        handler: impl Fn(&WatchChange) -> Result<(), SyncError> + 'static,
    ) -> Result<Watcher, SyncError> {
        self.property_def_at(path)?;
        Ok(Watcher::new(self.clone(), path, Rc::new(handler)))
    }

    /// Raw per-node property events, used by watchers
    pub fn on_change(
        &self,
        handler: impl Fn(&PropertyChange) -> Result<(), SyncError> + 'static,
    ) -> ListenerId {
        self.inner.changed.on(handler)
    }

    pub fn off_change(&self, id: ListenerId) -> bool {
        self.inner.changed.off(id)
    }

    // Internal

    fn property_def(&self, property: &str) -> Result<&PropertyDef, SyncError> {
        self.inner
            .schema
            .property_def(property)
            .ok_or_else(|| SyncError::UnknownProperty {
                model_type: self.model_type(),
                property: property.to_string(),
            })
    }

    /// Stores a value without validation and fires the change. Owned nodes
    /// are detached from their previous owner first, so the old owner is
    /// always notified before this one.
    pub(crate) fn assign(&self, def: &PropertyDef, value: Value) -> Result<(), SyncError> {
        let property = def.name();
        if self.get(property) == value {
            return Ok(());
        }

        if !def.is_reference() {
            if let Value::Node(child) = &value {
                if !child.is_owned_by(self, property) {
                    child.detach()?;
                }
            }
        }

        let old_value = self
            .inner
            .values
            .borrow_mut()
            .insert(property.to_string(), value.clone())
            .unwrap_or(Value::Null);
        if old_value == value {
            return Ok(());
        }

        match &old_value {
            Value::Node(old_child) if !def.is_reference() => {
                if old_child.is_owned_by(self, property) {
                    *old_child.inner.owner.borrow_mut() = None;
                }
            }
            Value::Collection(old_collection) => old_collection.release_owner(),
            _ => {}
        }
        match &value {
            Value::Node(child) if !def.is_reference() => {
                child.set_owner(Owner::Property {
                    node: self.downgrade(),
                    property: property.to_string(),
                });
            }
            Value::Collection(collection) => {
                collection.adopt(self, property, def.kind().item_type(), def.is_reference())?;
            }
            _ => {}
        }

        self.inner.changed.fire(&PropertyChange {
            property: property.to_string(),
            new_value: value,
            old_value,
        })
    }

    /// Stores an initial value during construction, without events
    pub(crate) fn initialize(&self, def: &PropertyDef, value: Value) -> Result<(), SyncError> {
        match &value {
            Value::Node(child) if !def.is_reference() => child.set_owner(Owner::Property {
                node: self.downgrade(),
                property: def.name().to_string(),
            }),
            Value::Collection(collection) => {
                collection.adopt(self, def.name(), def.kind().item_type(), def.is_reference())?
            }
            _ => {}
        }
        self.inner
            .values
            .borrow_mut()
            .insert(def.name().to_string(), value);
        Ok(())
    }

    pub(crate) fn set_owner(&self, owner: Owner) {
        *self.inner.owner.borrow_mut() = Some(owner);
    }

    pub(crate) fn clear_owner_if_collection(&self, collection: &Rc<CollectionInner>) {
        let mut owner = self.inner.owner.borrow_mut();
        if let Some(Owner::Collection(current)) = &*owner {
            if current.as_ptr() == Rc::as_ptr(collection) {
                *owner = None;
            }
        }
    }

    pub(crate) fn is_owned_by_collection(&self, collection: &Rc<CollectionInner>) -> bool {
        match &*self.inner.owner.borrow() {
            Some(Owner::Collection(current)) => current.as_ptr() == Rc::as_ptr(collection),
            _ => false,
        }
    }

    fn is_owned_by(&self, node: &Model, property: &str) -> bool {
        match &*self.inner.owner.borrow() {
            Some(Owner::Property {
                node: owner,
                property: owner_property,
            }) => owner.as_ptr() == Rc::as_ptr(&node.inner) && owner_property == property,
            _ => false,
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.model_type(), self.gid())
    }
}
