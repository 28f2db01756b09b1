pub mod assertions;
pub mod lifecycle_log;
pub mod model_builder;

pub use lifecycle_log::LifecycleLog;
pub use model_builder::FooBuilder;

use std::rc::Rc;

use parallax_shared::{ComponentType, Gid};

/// Gids of a list of components, in order
pub fn gids<C: ComponentType + ?Sized>(components: &[Rc<C>]) -> Vec<String> {
    components
        .iter()
        .map(|component| C::upcast(component.clone()).gid().to_string())
        .collect()
}

pub fn gid(value: &str) -> Gid {
    Gid::from(value)
}
