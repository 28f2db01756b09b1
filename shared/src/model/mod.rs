//! # Model layer
//! A small observable model graph: typed nodes with stable gids, ordered
//! collections, schema-declared reference vs. owned edges and dotted-path
//! watchers. Everything above this module treats the model as the single
//! source of truth and only ever reads from it or writes through it.

mod collection;
mod gid;
mod model_factory;
mod node;
mod schema;
mod value;
mod watch;

pub use collection::{Collection, CollectionEvent};
pub use gid::Gid;
pub use model_factory::ModelFactory;
pub use node::{Model, ModelOwner, PropertyChange};
pub use schema::{PropertyDef, Schema, TypeRegistry};
pub use value::{Record, Value, ValueKind};
pub use watch::{WatchChange, Watcher};
