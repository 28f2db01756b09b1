use std::rc::Rc;

use futures::future::LocalBoxFuture;

use parallax_shared::{Emitter, Gid, Model, SyncError};

use crate::{SparseVector3, Vector3};

/// A click on a view, in the view's local coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewClick {
    pub point: Vector3,
}

/// What a view controller needs from a rendering backend's scene node
pub trait View {
    fn name(&self) -> String;
    fn set_name(&self, name: &str);

    fn add(&self, child: Rc<dyn View>);
    /// Returns false if `child` was not attached here
    fn remove(&self, child: &Rc<dyn View>) -> bool;
    fn children(&self) -> Vec<Rc<dyn View>>;

    fn position(&self) -> Vector3;
    /// Full vectors convert into sparse ones that set every component
    fn set_position(&self, position: SparseVector3);

    fn scale(&self) -> f64;
    fn set_scale(&self, scale: f64);

    fn is_visible(&self) -> bool;
    fn set_visible(&self, visible: bool);

    fn clicked(&self) -> &Emitter<ViewClick>;
}

/// Creates scene nodes for view controllers
pub trait ViewBackend {
    /// The node a controller positions and attaches its children to
    fn create_root(&self, gid: &Gid) -> Rc<dyn View>;

    /// The node holding the controller's rendered content. May complete
    /// after the controller has been destroyed.
    fn create_content(&self, model: &Model) -> LocalBoxFuture<'static, Result<Rc<dyn View>, SyncError>>;
}
