//! A model factory plus a controller and a view factory wired as
//! counterparts, with every test component registered.

use std::rc::Rc;

use parallax_shared::{Factory, FactoryConfig, Model, ModelFactory, SyncError};
use parallax_view::MemoryBackend;

use crate::{
    test_models::{register_test_models, BUTTON, FOO, GHOST, LAMP, SCENE, WIDGET},
    ButtonComponent, FooBuilder, FooComponent, GhostComponent, LampComponent, LifecycleLog,
    SceneComponent, WidgetController,
};

pub struct TestWorld {
    pub models: ModelFactory,
    pub controllers: Factory,
    pub views: Factory,
    pub backend: Rc<MemoryBackend>,
    pub log: LifecycleLog,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    pub fn new() -> Self {
        Self::with_config(FactoryConfig::default())
    }

    pub fn with_config(config: FactoryConfig) -> Self {
        let models = ModelFactory::new();
        if let Err(err) = register_test_models(&models) {
            panic!("Test models failed to register: {}", err);
        }

        let log = LifecycleLog::new();
        let controllers = Factory::with_config(config.clone());
        parallax_controller::register_controllers(&controllers);
        let foo_log = log.clone();
        controllers.register_component(FOO, move |model, factory| {
            FooComponent::new(model, factory, foo_log.clone())
        });
        controllers.register_component(GHOST, GhostComponent::new);
        controllers.register_component(BUTTON, ButtonComponent::new);
        controllers.register_component(LAMP, LampComponent::new);
        controllers.register_component(WIDGET, WidgetController::new);
        controllers.register_component(SCENE, SceneComponent::new);

        let backend = Rc::new(MemoryBackend::new());
        let views = Factory::with_config(config);
        parallax_view::register_views(&views, backend.clone());

        views.set_counterpart(&controllers);
        controllers.set_counterpart(&views);

        Self {
            models,
            controllers,
            views,
            backend,
            log,
        }
    }

    /// A named Foo node with the given gid
    pub fn foo(&self, gid: &str) -> Model {
        self.build(FooBuilder::new(gid).name(gid))
    }

    pub fn build(&self, builder: FooBuilder) -> Model {
        match builder.build(&self.models) {
            Ok(model) => model,
            Err(err) => panic!("Could not build Foo model: {}", err),
        }
    }

    pub fn create_foo(&self, model: &Model) -> Result<Rc<FooComponent>, SyncError> {
        self.controllers.create::<FooComponent>(model)
    }

    pub fn node(&self, model_type: &str) -> Model {
        match self.models.create(model_type) {
            Ok(model) => model,
            Err(err) => panic!("Could not create {} model: {}", model_type, err),
        }
    }
}
