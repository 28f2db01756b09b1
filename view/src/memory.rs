use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    rc::Rc,
};

use futures::future::{self, LocalBoxFuture};
use log::info;

use parallax_shared::{Emitter, Gid, Model, SyncError};

use crate::{SparseVector3, Vector3, View, ViewBackend, ViewClick};

/// Headless view that only records its state
pub struct MemoryView {
    name: RefCell<String>,
    children: RefCell<Vec<Rc<dyn View>>>,
    position: Cell<Vector3>,
    scale: Cell<f64>,
    visible: Cell<bool>,
    clicked: Emitter<ViewClick>,
}

impl MemoryView {
    pub fn new(name: &str) -> Self {
        Self {
            name: RefCell::new(name.to_string()),
            children: RefCell::new(Vec::new()),
            position: Cell::new(Vector3::ZERO),
            scale: Cell::new(1.0),
            visible: Cell::new(true),
            clicked: Emitter::new(),
        }
    }

    /// Simulates a click at `point`
    pub fn click(&self, point: Vector3) -> Result<(), SyncError> {
        self.clicked.fire(&ViewClick { point })
    }

    pub fn child_names(&self) -> Vec<String> {
        self.children.borrow().iter().map(|child| child.name()).collect()
    }
}

impl View for MemoryView {
    fn name(&self) -> String {
        self.name.borrow().clone()
    }

    fn set_name(&self, name: &str) {
        *self.name.borrow_mut() = name.to_string();
    }

    fn add(&self, child: Rc<dyn View>) {
        let mut children = self.children.borrow_mut();
        if !children.iter().any(|existing| Rc::ptr_eq(existing, &child)) {
            children.push(child);
        }
    }

    fn remove(&self, child: &Rc<dyn View>) -> bool {
        let mut children = self.children.borrow_mut();
        let Some(index) = children.iter().position(|existing| Rc::ptr_eq(existing, child)) else {
            return false;
        };
        children.remove(index);
        true
    }

    fn children(&self) -> Vec<Rc<dyn View>> {
        self.children.borrow().clone()
    }

    fn position(&self) -> Vector3 {
        self.position.get()
    }

    fn set_position(&self, position: SparseVector3) {
        self.position.set(position.apply_to(self.position.get()));
    }

    fn scale(&self) -> f64 {
        self.scale.get()
    }

    fn set_scale(&self, scale: f64) {
        self.scale.set(scale);
    }

    fn is_visible(&self) -> bool {
        self.visible.get()
    }

    fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    fn clicked(&self) -> &Emitter<ViewClick> {
        &self.clicked
    }
}

/// Backend producing `MemoryView`s. Keeps every root it creates so tests
/// can inspect them by gid.
#[derive(Default)]
pub struct MemoryBackend {
    roots: RefCell<HashMap<Gid, Rc<MemoryView>>>,
    failing: RefCell<HashSet<Gid>>,
    contents_created: Cell<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root_for(&self, gid: &Gid) -> Option<Rc<MemoryView>> {
        self.roots.borrow().get(gid).cloned()
    }

    /// Makes content creation for `gid` fail with a load error
    pub fn fail_load(&self, gid: &Gid) {
        self.failing.borrow_mut().insert(gid.clone());
    }

    pub fn contents_created(&self) -> usize {
        self.contents_created.get()
    }
}

impl ViewBackend for MemoryBackend {
    fn create_root(&self, gid: &Gid) -> Rc<dyn View> {
        let root = Rc::new(MemoryView::new(gid.as_str()));
        self.roots.borrow_mut().insert(gid.clone(), root.clone());
        root
    }

    fn create_content(&self, model: &Model) -> LocalBoxFuture<'static, Result<Rc<dyn View>, SyncError>> {
        let gid = model.gid().clone();
        if self.failing.borrow().contains(&gid) {
            return Box::pin(future::ready(Err(SyncError::Load {
                gid,
                reason: "backend refused content".to_string(),
            })));
        }

        self.contents_created.set(self.contents_created.get() + 1);
        info!("Created content view for {}", gid);
        let content: Rc<dyn View> = Rc::new(MemoryView::new(&format!("content:{}", gid)));
        Box::pin(future::ready(Ok(content)))
    }
}
