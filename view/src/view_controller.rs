use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use futures::future::LocalBoxFuture;
use log::{info, warn};

use parallax_shared::{
    Component, ComponentCore, ComponentList, ComponentType, Factory, Model, PropertySync,
    SyncError, Value,
};

use crate::{SparseVector3, View, ViewBackend};

pub const CLICK_EVENT: &str = "click";

/// Mirrors a view model into a backend scene node.
///
/// The root node carries position, scale, visibility and name, and holds
/// the roots of the child view controllers. Content is created on `load`.
pub struct ViewController {
    core: ComponentCore,
    backend: Rc<dyn ViewBackend>,
    root: Rc<dyn View>,
    content: RefCell<Option<Rc<dyn View>>>,
    children: ComponentList<ViewController>,
    position: [PropertySync<Value>; 3],
    scale: PropertySync<Value>,
    visible: PropertySync<Value>,
    name: PropertySync<Value>,
}

impl ViewController {
    pub fn new(
        model: Model,
        factory: &Factory,
        backend: Rc<dyn ViewBackend>,
    ) -> Result<Rc<Self>, SyncError> {
        let core = ComponentCore::new(model, factory);
        let root = backend.create_root(core.gid());
        core.events().declare(CLICK_EVENT);

        Ok(Rc::new(Self {
            children: core.list("children")?,
            position: [
                core.property("position.x")?,
                core.property("position.y")?,
                core.property("position.z")?,
            ],
            scale: core.property("scale")?,
            visible: core.property("visible")?,
            name: core.property("name")?,
            core,
            backend,
            root,
            content: RefCell::new(None),
        }))
    }

    pub fn root(&self) -> &Rc<dyn View> {
        &self.root
    }

    pub fn content(&self) -> Option<Rc<dyn View>> {
        self.content.borrow().clone()
    }

    pub fn children(&self) -> &ComponentList<ViewController> {
        &self.children
    }

    /// The controller built for the same model node in the counterpart
    /// factory
    pub fn controller<C: ComponentType + ?Sized>(&self) -> Option<Rc<C>> {
        self.core.factory()?.counterpart::<C>(self.gid())
    }

    fn attach_content(&self, content: Rc<dyn View>) {
        if let Some(previous) = self.content.replace(Some(content.clone())) {
            self.root.remove(&previous);
        }
        self.root.add(content);
    }
}

impl Component for ViewController {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn on_init(self: Rc<Self>) -> Result<(), SyncError> {
        let root = self.root.clone();
        self.children.on_add(move |added| {
            root.add(added.component.root.clone());
            Ok(())
        });
        let root = self.root.clone();
        self.children.on_remove(move |removed| {
            root.remove(&removed.component.root);
            Ok(())
        });

        let setters: [fn(f64) -> SparseVector3; 3] = [
            |x| SparseVector3::new().with_x(x),
            |y| SparseVector3::new().with_y(y),
            |z| SparseVector3::new().with_z(z),
        ];
        for (sync, setter) in self.position.iter().zip(setters) {
            let root = self.root.clone();
            sync.init(move |value| {
                if let Some(component) = value.as_number() {
                    root.set_position(setter(component));
                }
                Ok(())
            })?;
        }

        let root = self.root.clone();
        self.scale.init(move |value| {
            if let Some(scale) = value.as_number() {
                root.set_scale(scale);
            }
            Ok(())
        })?;
        // an inactive view stays hidden until enabled
        let this: Weak<Self> = Rc::downgrade(&self);
        self.visible.init(move |value| {
            if let (Some(this), Some(visible)) = (this.upgrade(), value.as_bool()) {
                this.root.set_visible(visible && this.is_active());
            }
            Ok(())
        })?;
        let root = self.root.clone();
        self.name.init(move |value| {
            if let Some(name) = value.as_text() {
                root.set_name(name);
            }
            Ok(())
        })?;

        let this: Weak<Self> = Rc::downgrade(&self);
        self.root.clicked().on(move |_| {
            let Some(this) = this.upgrade() else {
                return Ok(());
            };
            if !this.is_active() {
                return Ok(());
            }
            let payload = Value::record([("gid", this.gid().as_str())]);
            this.core.events().fire(CLICK_EVENT, payload)
        });
        Ok(())
    }

    fn on_enable(&self) -> Result<(), SyncError> {
        if let Some(visible) = self.visible.current().and_then(|value| value.as_bool()) {
            self.root.set_visible(visible);
        }
        Ok(())
    }

    fn on_disable(&self) {
        self.root.set_visible(false);
    }

    fn on_destroy(&self) {
        if let Some(content) = self.content.borrow_mut().take() {
            self.root.remove(&content);
        }
        self.root.clicked().clear();
    }

    fn on_load(self: Rc<Self>) -> LocalBoxFuture<'static, Result<(), SyncError>> {
        let pending = self.backend.create_content(self.model());
        Box::pin(async move {
            let content = pending.await?;
            if self.core.is_destroyed() {
                warn!("View {} was destroyed while loading, dropping its content", self.gid());
                return Ok(());
            }
            info!("Loaded content for view {}", self.gid());
            self.attach_content(content);
            Ok(())
        })
    }
}
