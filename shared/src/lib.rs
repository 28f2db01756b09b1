//! # Parallax Shared
//! Model layer, Factory + Registry and sync primitives shared by the
//! parallax controller & view trees.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod emitter;
mod error;

pub mod component;
pub mod factory;
pub mod model;
pub mod sync;

pub use component::{
    Action, ActionKind, ActionRegistry, AsAny, ChildSync, Component, ComponentCore, ComponentTree,
    ComponentType, EventRegistry, LoadState, TreeEdge,
};
pub use emitter::{Emitter, ListenerId};
pub use error::SyncError;
pub use factory::{Constructor, Factory, FactoryConfig, FactoryRef, FactoryStats, Registry};
pub use model::{
    Collection, CollectionEvent, Gid, Model, ModelFactory, ModelOwner, PropertyChange,
    PropertyDef, Record, Schema, TypeRegistry, Value, ValueKind, WatchChange, Watcher,
};
pub use sync::{
    ComponentAdded, ComponentList, ComponentListEvents, ComponentRemoved, ComponentSlot,
    ControllerList, PropertySync, Resolution, SyncValue, ValueChange,
};
