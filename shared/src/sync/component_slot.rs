use std::rc::Rc;

use log::error;

use crate::{
    component::{ChildSync, ComponentCore, ComponentType},
    emitter::ListenerId,
    model::{Model, Value, ValueKind},
    SyncError,
};

use super::{PropertySync, Resolution, ValueChange};

/// A single child component mirrored from a node property.
///
/// An owned slot builds its child through the Factory and parents it to
/// the owner; a reference slot only looks the target up in the Registry.
pub struct ComponentSlot<C: ComponentType + ?Sized> {
    sync: PropertySync<Rc<C>>,
}

impl<C: ComponentType + ?Sized> Clone for ComponentSlot<C> {
    fn clone(&self) -> Self {
        Self {
            sync: self.sync.clone(),
        }
    }
}

impl<C: ComponentType + ?Sized> ComponentSlot<C> {
    pub fn new(owner: &ComponentCore, path: &str) -> Result<Self, SyncError> {
        let factory = owner.factory_ref().clone();
        let resolver = move |value: &Value, is_reference: bool| {
            let Value::Node(node) = value else {
                return Ok(Resolution::Empty);
            };
            let Some(factory) = factory.upgrade() else {
                return Ok(Resolution::Failed);
            };
            Ok(match factory.resolve::<C>(node, !is_reference)? {
                Some(component) => Resolution::Resolved(component),
                None if is_reference => Resolution::Pending(vec![node.gid().clone()]),
                None => {
                    error!("Could not resolve component for {:?}", node);
                    Resolution::Failed
                }
            })
        };

        let model = owner.model();
        let expected = match model.property_def_at(path)?.kind() {
            ValueKind::Node(model_type) => ValueKind::Node(*model_type),
            other => {
                return Err(SyncError::TypeMismatch {
                    path: path.to_string(),
                    expected: "node".to_string(),
                    actual: other.to_string(),
                })
            }
        };
        let sync = PropertySync::build(
            model,
            path,
            Some(expected),
            Some(owner.gid().clone()),
            Some(owner.factory_ref().clone()),
            Box::new(resolver),
        )?;

        if !sync.is_reference() {
            let owner_gid = owner.gid().clone();
            sync.on_change(move |change: &ValueChange<Rc<C>>| {
                if let Some(old) = &change.old {
                    let old = C::upcast(old.clone());
                    if old.core().parent_gid().as_ref() == Some(&owner_gid) {
                        old.set_parent(None)?;
                    }
                }
                if let Some(current) = &change.current {
                    C::upcast(current.clone()).set_parent(Some(owner_gid.clone()))?;
                }
                Ok(())
            });
        }

        Ok(Self { sync })
    }

    pub fn model(&self) -> &Model {
        self.sync.model()
    }

    pub fn path(&self) -> &str {
        self.sync.path()
    }

    pub fn is_reference(&self) -> bool {
        self.sync.is_reference()
    }

    pub fn current(&self) -> Option<Rc<C>> {
        self.sync.current()
    }

    pub fn try_current(&self) -> Result<Option<Rc<C>>, SyncError> {
        self.sync.try_current()
    }

    /// Points the property at another node, or clears it
    pub fn set(&self, node: Option<&Model>) -> Result<(), SyncError> {
        self.sync.set(node.cloned())
    }

    pub fn resolve_references(&self) -> Result<(), SyncError> {
        self.sync.resolve_references()
    }

    pub fn on_change(
        &self,
        handler: impl Fn(&ValueChange<Rc<C>>) -> Result<(), SyncError> + 'static,
    ) -> ListenerId {
        self.sync.on_change(handler)
    }

    pub fn init(
        &self,
        callback: impl Fn(&Rc<C>) -> Result<(), SyncError> + 'static,
    ) -> Result<ListenerId, SyncError> {
        self.sync.init(callback)
    }

    pub fn deinit(&self, callback: impl Fn(&Rc<C>) -> Result<(), SyncError> + 'static) -> ListenerId {
        self.sync.deinit(callback)
    }

    pub fn sync(&self) -> &PropertySync<Rc<C>> {
        &self.sync
    }

    pub(crate) fn as_child_sync(&self) -> Rc<dyn ChildSync> {
        self.sync.as_child_sync()
    }
}
