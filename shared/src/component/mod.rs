//! # Runtime components
//! A component is the runtime object bound 1:1 to a model node. It owns the
//! sync primitives that mirror the node's properties and collections, and
//! exposes lifecycle hooks plus named actions and events.

mod actions;
mod child_sync;
mod component_core;
mod events;
mod tree;

pub use actions::{Action, ActionKind, ActionRegistry};
pub use child_sync::ChildSync;
pub use component_core::{ComponentCore, LoadState};
pub use events::EventRegistry;
pub use tree::{ComponentTree, TreeEdge};

use std::{any::Any, fmt, rc::Rc};

use futures::future::{self, try_join, try_join_all, LocalBoxFuture};

use crate::{
    model::{Gid, Model},
    SyncError,
};

/// Upcasting helper so `Rc<dyn Component>` can be downcast to its concrete type
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

pub trait Component: AsAny {
    fn core(&self) -> &ComponentCore;

    // Hooks

    /// Called once after the component is registered and before its child
    /// syncs start watching, so listeners attached here see the initial sync.
    fn on_init(self: Rc<Self>) -> Result<(), SyncError> {
        Ok(())
    }

    fn on_enable(&self) -> Result<(), SyncError> {
        Ok(())
    }

    fn on_disable(&self) {}

    fn on_destroy(&self) {}

    fn on_load(self: Rc<Self>) -> LocalBoxFuture<'static, Result<(), SyncError>> {
        Box::pin(future::ready(Ok(())))
    }

    // Provided

    fn gid(&self) -> &Gid {
        self.core().gid()
    }

    fn model(&self) -> &Model {
        self.core().model()
    }

    fn type_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    fn is_active(&self) -> bool {
        self.core().is_active()
    }

    /// Runs the init hook, then starts every registered child sync with an
    /// explicit catch-up to the current model value.
    fn init(self: Rc<Self>) -> Result<(), SyncError> {
        let core = self.core();
        if core.is_initialized() || core.is_destroyed() {
            return Ok(());
        }
        core.mark_initialized();

        self.clone().on_init()?;
        for sync in core.syncs() {
            sync.start_watching()?;
        }
        self.refresh_active()
    }

    fn set_enabled(&self, enabled: bool) -> Result<(), SyncError> {
        self.core().set_enabled_flag(enabled);
        self.refresh_active()
    }

    fn set_parent(&self, parent: Option<Gid>) -> Result<(), SyncError> {
        self.core().set_parent_gid(parent);
        self.refresh_active()
    }

    /// Recomputes whether this component is active and cascades the result
    /// to its owned children.
    fn refresh_active(&self) -> Result<(), SyncError> {
        let core = self.core();
        let should_be_active = core.is_initialized()
            && !core.is_destroyed()
            && core.is_enabled()
            && (core.is_root() || core.parent().is_some_and(|parent| parent.is_active()));

        if should_be_active == core.is_active() {
            return Ok(());
        }
        core.set_active_flag(should_be_active);
        if should_be_active {
            self.on_enable()?;
        } else {
            self.on_disable();
        }

        for child in core.owned_children() {
            child.refresh_active()?;
        }
        Ok(())
    }

    fn resolve_references(&self) -> Result<(), SyncError> {
        for sync in self.core().syncs() {
            sync.resolve_references()?;
        }
        Ok(())
    }

    /// Terminal. Destroys owned children, releases references and removes
    /// this component from the registry.
    fn destroy(&self) {
        let core = self.core();
        if core.is_destroyed() {
            return;
        }
        core.mark_destroyed();
        if core.is_active() {
            core.set_active_flag(false);
            self.on_disable();
        }

        for sync in core.syncs() {
            sync.destroy();
        }
        self.on_destroy();

        core.actions().clear_listeners();
        core.events().clear_listeners();
        core.set_parent_gid(None);
        if let Some(factory) = core.factory() {
            if factory.registry().unregister(core.gid(), core) {
                factory.release_references(core.gid());
            }
        }
    }

    /// Loads this component and every owned child. Children attached after
    /// the call are not part of the returned future.
    fn load(self: Rc<Self>) -> LocalBoxFuture<'static, Result<(), SyncError>> {
        let core = self.core();
        if core.is_destroyed() {
            return Box::pin(future::ready(Err(SyncError::ComponentDestroyed {
                gid: core.gid().clone(),
            })));
        }

        let load_state = core.load_state_cell();
        load_state.set(LoadState::Loading);

        let children: Vec<_> = core
            .owned_children()
            .into_iter()
            .map(|child| child.load())
            .collect();
        let own = self.clone().on_load();

        Box::pin(async move {
            let result = try_join(own, try_join_all(children)).await.map(|_| ());
            load_state.set(match result {
                Ok(()) => LoadState::Loaded,
                Err(_) => LoadState::Failed,
            });
            result
        })
    }

    /// Debug dump of this component and everything it owns
    fn to_tree(&self) -> ComponentTree {
        let core = self.core();
        let edges = core
            .syncs()
            .iter()
            .filter_map(|sync| {
                let components = sync.components();
                if components.is_empty() {
                    return None;
                }
                Some(if sync.is_reference() {
                    TreeEdge::references(
                        sync.path(),
                        components.iter().map(|component| component.gid().clone()).collect(),
                    )
                } else {
                    TreeEdge::owned(
                        sync.path(),
                        components.iter().map(|component| component.to_tree()).collect(),
                    )
                })
            })
            .collect();

        ComponentTree {
            type_name: self.type_name(),
            gid: core.gid().clone(),
            active: core.is_active(),
            edges,
        }
    }
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_name(), self.gid())
    }
}

/// The runtime type a sync primitive expects to resolve to. Implemented for
/// every concrete component, and for `dyn Component` to accept any.
pub trait ComponentType: 'static {
    fn downcast(component: Rc<dyn Component>) -> Option<Rc<Self>>;
    fn upcast(component: Rc<Self>) -> Rc<dyn Component>;
    fn expected_name() -> &'static str;
}

impl<C: Component> ComponentType for C {
    fn downcast(component: Rc<dyn Component>) -> Option<Rc<Self>> {
        component.as_any_rc().downcast::<C>().ok()
    }

    fn upcast(component: Rc<Self>) -> Rc<dyn Component> {
        component
    }

    fn expected_name() -> &'static str {
        short_type_name(std::any::type_name::<C>())
    }
}

impl ComponentType for dyn Component {
    fn downcast(component: Rc<dyn Component>) -> Option<Rc<Self>> {
        Some(component)
    }

    fn upcast(component: Rc<Self>) -> Rc<dyn Component> {
        component
    }

    fn expected_name() -> &'static str {
        "Component"
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rsplit_once("::") {
        Some((_, name)) => name,
        None => base,
    }
}
