use std::rc::Rc;

use crate::{model::Gid, SyncError};

use super::Component;

/// Type-erased view of a sync primitive held by a component, used to drive
/// lifecycle and reference resolution without knowing the child type.
pub trait ChildSync {
    fn path(&self) -> &str;
    fn is_reference(&self) -> bool;

    /// Subscribes to the model and catches up with its current value
    fn start_watching(&self) -> Result<(), SyncError>;
    fn stop_watching(&self);

    /// Retries pending reference resolution. A no-op for owned syncs.
    fn resolve_references(&self) -> Result<(), SyncError>;

    /// Drops a resolved reference to the destroyed component under `gid`
    /// and goes back to pending. A no-op if nothing held refers to it.
    fn release(&self, gid: &Gid) -> Result<(), SyncError>;

    /// Components currently held, owned or referenced
    fn components(&self) -> Vec<Rc<dyn Component>>;

    /// Stops watching and destroys owned children
    fn destroy(&self);
}
