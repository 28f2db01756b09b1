mod factory_config;
mod registry;
mod reference_index;
mod sync_factory;

pub use factory_config::FactoryConfig;
pub use registry::Registry;
pub use sync_factory::{Constructor, Factory, FactoryRef, FactoryStats};
