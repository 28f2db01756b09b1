/// Integration tests for PropertySync and ComponentSlot
/// Covers write-through, change events, init/deinit callbacks, nested
/// paths, owned slot reparenting and lazy reference resolution.

use std::{cell::RefCell, rc::Rc};

use parallax_shared::{Component, FactoryConfig, PropertySync, SyncError, Value};
use parallax_test::{assert_same_component, FooBuilder, FooComponent, TestWorld};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn plain_sync_follows_the_model() {
    init_logger();
    let world = TestWorld::new();
    let model = world.foo("foo");
    let foo = world.create_foo(&model).unwrap();

    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = changes.clone();
    foo.name.on_change(move |change| {
        sink.borrow_mut()
            .push((change.old.clone(), change.current.clone()));
        Ok(())
    });

    model.set("name", "renamed").unwrap();
    model.set("name", "renamed").unwrap();

    assert_eq!(foo.name(), Some("renamed".to_string()));
    assert_eq!(
        *changes.borrow(),
        vec![(Some(Value::from("foo")), Some(Value::from("renamed")))]
    );
}

#[test]
fn set_writes_through_to_the_model() {
    init_logger();
    let world = TestWorld::new();
    let model = world.foo("foo");
    let foo = world.create_foo(&model).unwrap();

    foo.name.set("written").unwrap();

    assert_eq!(model.get("name"), Value::from("written"));
    assert_eq!(foo.name(), Some("written".to_string()));
}

#[test]
fn set_rejects_the_wrong_type() {
    init_logger();
    let world = TestWorld::new();
    let model = world.foo("foo");
    let foo = world.create_foo(&model).unwrap();

    assert!(matches!(
        foo.name.set(5),
        Err(SyncError::TypeMismatch { .. })
    ));
    assert_eq!(model.get("name"), Value::from("foo"));
}

#[test]
fn init_runs_for_existing_and_new_values() {
    init_logger();
    let world = TestWorld::new();
    let model = world.foo("first");
    let sync = PropertySync::plain(&model, "name").unwrap();
    sync.start_watching().unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let released = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    sync.init(move |value| {
        sink.borrow_mut().push(value.clone());
        Ok(())
    })
    .unwrap();
    let sink = released.clone();
    sync.deinit(move |value| {
        sink.borrow_mut().push(value.clone());
        Ok(())
    });

    model.set("name", "second").unwrap();
    model.set("name", Value::Null).unwrap();

    assert_eq!(*seen.borrow(), vec![Value::from("first"), Value::from("second")]);
    assert_eq!(*released.borrow(), vec![Value::from("first"), Value::from("second")]);
    assert_eq!(sync.current(), None);
}

#[test]
fn nested_path_follows_a_replaced_node() {
    init_logger();
    let world = TestWorld::new();
    let inner = world.foo("inner");
    let root = world.build(FooBuilder::new("root").foo(&inner));
    let sync = PropertySync::plain(&root, "foo.name").unwrap();
    sync.start_watching().unwrap();
    assert_eq!(sync.current(), Some(Value::from("inner")));

    root.set("foo", world.foo("replacement")).unwrap();
    assert_eq!(sync.current(), Some(Value::from("replacement")));

    root.set("foo", Value::Null).unwrap();
    assert_eq!(sync.current(), None);
}

#[test]
fn stopped_sync_ignores_the_model() {
    init_logger();
    let world = TestWorld::new();
    let model = world.foo("foo");
    let sync = PropertySync::plain(&model, "name").unwrap();
    sync.start_watching().unwrap();

    sync.stop_watching();
    model.set("name", "ignored").unwrap();
    assert_eq!(sync.current(), Some(Value::from("foo")));

    sync.sync().unwrap();
    assert_eq!(sync.current(), Some(Value::from("ignored")));
}

#[test]
fn owned_slot_reparents_old_and_new_children() {
    init_logger();
    let world = TestWorld::new();
    let first = world.foo("first");
    let root = world.build(FooBuilder::new("root").foo(&first));
    let root = world.create_foo(&root).unwrap();
    let first = root.foo.current().unwrap();

    root.foo.set(Some(&world.foo("second"))).unwrap();
    let second = root.foo.current().unwrap();

    assert_eq!(first.core().parent_gid(), None);
    assert!(!first.is_active());
    assert_eq!(second.core().parent_gid(), Some(root.gid().clone()));
    assert!(second.is_active());
    assert_eq!(world.controllers.destroy_orphans(), 1);
    assert!(first.core().is_destroyed());
}

#[test]
fn reference_slot_never_touches_parents() {
    init_logger();
    let world = TestWorld::new();
    let target = world.foo("target");
    let holder = world.build(FooBuilder::new("holder").foo(&target));
    let root = world.build(FooBuilder::new("root").child(&holder).bar(&target));

    let root = world.create_foo(&root).unwrap();
    let target = root.bar.current().unwrap();
    assert_eq!(target.core().parent_gid(), Some("holder".into()));

    root.bar.set(None).unwrap();
    assert!(root.bar.current().is_none());
    assert_eq!(target.core().parent_gid(), Some("holder".into()));
    assert!(target.is_active());
}

#[test]
fn lazy_current_does_no_redundant_work() {
    init_logger();
    let world = TestWorld::with_config(FactoryConfig {
        auto_resolve_references: false,
        ..FactoryConfig::default()
    });
    let target = world.foo("target");
    let root = world.build(FooBuilder::new("root").bar(&target));
    let root = world.create_foo(&root).unwrap();

    let before = world.controllers.stats().resolutions;
    assert!(root.bar.current().is_none());
    assert!(root.bar.current().is_none());
    assert!(matches!(
        root.bar.try_current(),
        Err(SyncError::UnresolvedReference { .. })
    ));
    assert_eq!(world.controllers.stats().resolutions, before);

    let built = world
        .controllers
        .resolve::<FooComponent>(&target, true)
        .unwrap()
        .unwrap();
    let before = world.controllers.stats().resolutions;

    assert_same_component!(root.bar.current().unwrap(), built);
    assert!(root.bar.current().is_some());
    assert_eq!(world.controllers.stats().resolutions, before + 1);
    assert_eq!(root.bar.sync().resolved_reference(), Value::from(&target));
}

#[test]
fn pending_reference_resolves_when_its_target_appears() {
    init_logger();
    let world = TestWorld::new();
    let target = world.foo("target");
    let root = world.build(FooBuilder::new("root").bar(&target));
    let root = world.create_foo(&root).unwrap();

    let changes = Rc::new(RefCell::new(0));
    let counter = changes.clone();
    root.bar.on_change(move |_| {
        *counter.borrow_mut() += 1;
        Ok(())
    });
    assert!(root.bar.current().is_none());

    let built = world
        .controllers
        .resolve::<FooComponent>(&target, true)
        .unwrap()
        .unwrap();

    assert_eq!(*changes.borrow(), 1);
    assert_same_component!(root.bar.current().unwrap(), built);
}
