//! # Parallax View
//! The view tree: a capability trait for backend scene nodes, view
//! controllers that mirror view models into them, and a headless in-memory
//! backend.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod memory;
mod models;
mod vector;
mod view;
mod view_controller;

pub use memory::{MemoryBackend, MemoryView};
pub use models::{register_models, VECTOR3, VIEW};
pub use vector::{SparseVector3, Vector3};
pub use view::{View, ViewBackend, ViewClick};
pub use view_controller::{ViewController, CLICK_EVENT};

use std::rc::Rc;

use parallax_shared::Factory;

/// Maps the view model type to view controllers drawing through `backend`
pub fn register_views(factory: &Factory, backend: Rc<dyn ViewBackend>) {
    factory.register_component(VIEW, move |model, factory| {
        ViewController::new(model, factory, backend.clone())
    });
}
