pub mod helpers;
pub mod test_world;

pub use helpers::*;
pub use test_components::{
    ButtonComponent, FooComponent, GhostComponent, LampComponent, SceneComponent,
    WidgetController,
};
pub use test_models::register_test_models;
pub use test_world::TestWorld;
