/// Integration tests for Factory + Registry
/// Resolution reuses registered instances, owned and referenced edges share
/// one component per gid, and roots are activated on create.

use std::rc::Rc;

use parallax_shared::{Component, Constructor, Factory, FactoryConfig, Model, SyncError};
use parallax_test::{
    assert_same_component, FooBuilder, FooComponent, GhostComponent, LampComponent, TestWorld,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn repeated_resolution_returns_the_same_instance() {
    init_logger();
    let world = TestWorld::new();
    let model = world.foo("solo");

    let first = world
        .controllers
        .resolve::<FooComponent>(&model, true)
        .unwrap()
        .unwrap();
    let second = world
        .controllers
        .resolve::<FooComponent>(&model, true)
        .unwrap()
        .unwrap();

    assert_same_component!(first, second);
    assert_eq!(world.controllers.stats().constructions, 1);
    assert_eq!(world.log.count("init"), 1);
}

#[test]
fn owned_and_referenced_edges_share_one_component() {
    init_logger();
    let world = TestWorld::new();
    let child = world.foo("child");
    let root = world.build(FooBuilder::new("root").foo(&child).bar(&child));

    let root = world.create_foo(&root).unwrap();
    let owned = root.foo.current().unwrap();
    let referenced = root.bar.current().unwrap();

    assert_same_component!(owned, referenced);
    assert_eq!(owned.core().parent_gid(), Some(root.gid().clone()));
    assert_eq!(world.controllers.registry().len(), 2);
}

#[test]
fn create_marks_and_activates_the_root() {
    init_logger();
    let world = TestWorld::new();
    let child = world.foo("child");
    let root = world.build(FooBuilder::new("root").child(&child));

    let root = world.create_foo(&root).unwrap();
    let child = root.children.get(0).unwrap();

    assert!(root.core().is_root());
    assert!(root.is_active());
    assert!(!child.core().is_root());
    assert!(child.is_active());
    assert_eq!(world.log.gids_for("enable"), vec!["root", "child"]);
}

#[test]
fn roots_can_start_disabled() {
    init_logger();
    let world = TestWorld::with_config(FactoryConfig {
        activate_roots: false,
        ..FactoryConfig::default()
    });
    let child = world.foo("child");
    let root = world.build(FooBuilder::new("root").child(&child));

    let root = world.create_foo(&root).unwrap();
    assert!(!root.is_active());
    assert!(!root.children.get(0).unwrap().is_active());
    assert_eq!(world.log.count("enable"), 0);

    root.set_enabled(true).unwrap();
    assert!(root.children.get(0).unwrap().is_active());
    assert_eq!(world.log.count("enable"), 2);
}

#[test]
fn registry_lookup_by_gid() {
    init_logger();
    let world = TestWorld::new();
    let child = world.foo("child");
    let root = world.build(FooBuilder::new("root").foo(&child));
    let root = world.create_foo(&root).unwrap();

    let found = world
        .controllers
        .registry()
        .by_gid_as::<FooComponent>(child.gid())
        .unwrap();
    assert_same_component!(found, root.foo.current().unwrap());
    assert_eq!(found.core().parent().unwrap().gid(), root.gid());
    assert!(world
        .controllers
        .registry()
        .by_gid_as::<LampComponent>(child.gid())
        .is_none());
}

fn ghost(model: Model, factory: &Factory) -> Result<Rc<dyn Component>, SyncError> {
    let ghost: Rc<dyn Component> = GhostComponent::new(model, factory)?;
    Ok(ghost)
}

#[test]
fn constructor_override_at_the_call_site() {
    init_logger();
    let world = TestWorld::new();
    let model = world.foo("special");
    let constructor: Constructor = Rc::new(ghost);

    let built = world
        .controllers
        .resolve_with::<GhostComponent>(&model, true, Some(constructor))
        .unwrap();

    assert!(built.is_some());
    assert!(world
        .controllers
        .resolve::<FooComponent>(&model, true)
        .unwrap()
        .is_none());
    assert_eq!(world.controllers.stats().constructions, 1);
    assert_eq!(world.log.count("init"), 0);
}

#[test]
fn tree_dump_lists_owned_children_and_references() {
    init_logger();
    let world = TestWorld::new();
    let target = world.foo("target");
    let first = world.foo("first");
    let second = world.foo("second");
    let root = world.build(
        FooBuilder::new("root")
            .foo(&target)
            .child(&first)
            .child(&second)
            .reference(&target),
    );

    let root = world.create_foo(&root).unwrap();
    let tree = root.to_tree();

    assert_eq!(tree.size(), 4);
    let dump = tree.to_string();
    assert!(dump.starts_with("FooComponent root\n"));
    assert!(dump.contains(".refs -> [target]"));
    assert!(dump.contains("    FooComponent first\n"));
}
