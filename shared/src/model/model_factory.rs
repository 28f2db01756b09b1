use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::{Rc, Weak},
};

use log::info;

use crate::SyncError;

use super::{node::NodeInner, Collection, Gid, Model, Schema, TypeRegistry, Value, ValueKind};

pub(crate) struct ModelContext {
    types: RefCell<TypeRegistry>,
    nodes: RefCell<HashMap<Gid, Weak<NodeInner>>>,
    next_gid: Cell<u64>,
}

impl ModelContext {
    pub(crate) fn schema(&self, model_type: &str) -> Option<Rc<Schema>> {
        self.types.borrow().get(model_type)
    }

    pub(crate) fn forget(&self, gid: &Gid) {
        // nodes may be dropped while the index is being walked
        let Ok(mut nodes) = self.nodes.try_borrow_mut() else {
            return;
        };
        if nodes.get(gid).is_some_and(|node| node.strong_count() == 0) {
            nodes.remove(gid);
        }
    }
}

/// Registers model schemas and creates model nodes bound to them.
///
/// All nodes created by one factory share its type registry and gid index,
/// so gids are unique per factory.
#[derive(Clone)]
pub struct ModelFactory {
    context: Rc<ModelContext>,
}

impl Default for ModelFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelFactory {
    pub fn new() -> Self {
        Self {
            context: Rc::new(ModelContext {
                types: RefCell::new(TypeRegistry::new()),
                nodes: RefCell::new(HashMap::new()),
                next_gid: Cell::new(1),
            }),
        }
    }

    pub fn register(&self, schema: Schema) -> Result<(), SyncError> {
        self.context.types.borrow_mut().register(schema)?;
        Ok(())
    }

    pub fn is_registered(&self, model_type: &str) -> bool {
        self.context.types.borrow().contains(model_type)
    }

    pub fn schema(&self, model_type: &str) -> Option<Rc<Schema>> {
        self.context.schema(model_type)
    }

    /// Creates a node with a generated gid
    pub fn create(&self, model_type: &str) -> Result<Model, SyncError> {
        let gid = self.generate_gid(model_type);
        self.create_node(model_type, gid)
    }

    pub fn create_with_gid(&self, model_type: &str, gid: impl Into<Gid>) -> Result<Model, SyncError> {
        let gid = gid.into();
        if self.by_gid(&gid).is_some() {
            return Err(SyncError::DuplicateGid { gid });
        }
        self.create_node(model_type, gid)
    }

    /// Live node with the given gid, if any
    pub fn by_gid(&self, gid: &Gid) -> Option<Model> {
        self.context
            .nodes
            .borrow()
            .get(gid)
            .and_then(Weak::upgrade)
            .map(Model::from_inner)
    }

    pub fn node_count(&self) -> usize {
        self.context
            .nodes
            .borrow()
            .values()
            .filter(|node| node.strong_count() > 0)
            .count()
    }

    fn generate_gid(&self, model_type: &str) -> Gid {
        loop {
            let index = self.context.next_gid.get();
            self.context.next_gid.set(index + 1);
            let gid = Gid::new(format!("{}-{}", model_type, index));
            if self.by_gid(&gid).is_none() {
                return gid;
            }
        }
    }

    fn create_node(&self, model_type: &str, gid: Gid) -> Result<Model, SyncError> {
        let Some(schema) = self.schema(model_type) else {
            return Err(SyncError::UnknownModelType {
                model_type: model_type.to_string(),
            });
        };

        let node = Model::new(gid.clone(), schema.clone(), self.context.clone());
        self.context
            .nodes
            .borrow_mut()
            .insert(gid, node.downgrade());

        for def in schema.properties() {
            let value = match (def.kind(), def.default_value()) {
                (ValueKind::Collection(_), _) => Value::Collection(Collection::new()),
                (_, Some(default)) => default.clone(),
                (ValueKind::Node(Some(child_type)), None)
                    if def.is_required() && !def.is_reference() =>
                {
                    Value::Node(self.create(child_type)?)
                }
                _ => Value::Null,
            };
            if !value.is_null() {
                node.initialize(def, value)?;
            }
        }

        info!("Created model {:?}", node);
        Ok(node)
    }
}
