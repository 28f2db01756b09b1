//! # Sync primitives
//! One-directional mirrors from a model path to runtime state. Each
//! primitive watches its path, resolves raw model values (through the
//! Factory where components are involved) and emits change events.

mod component_list;
mod component_slot;
mod property_sync;
mod sync_source;

pub use component_list::{ComponentAdded, ComponentList, ComponentListEvents, ComponentRemoved, ControllerList};
pub use component_slot::ComponentSlot;
pub use property_sync::{PropertySync, Resolution, SyncValue, ValueChange};
