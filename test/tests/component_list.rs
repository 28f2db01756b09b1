/// Integration tests for ComponentList
/// Covers full re-derivation, incremental add/remove, queries, local
/// removal and skipping of owned items that cannot be built.

use std::{cell::RefCell, rc::Rc};

use parallax_shared::{Collection, Component, Record, Value};
use parallax_test::{
    assert_gids, assert_same_component, gids, test_models::GHOST, FooBuilder, FooComponent,
    TestWorld,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn owned_list_mirrors_the_collection() {
    init_logger();
    let world = TestWorld::new();
    let (a, b) = (world.foo("a"), world.foo("b"));
    let root = world.build(FooBuilder::new("root").child(&a).child(&b));

    let root = world.create_foo(&root).unwrap();

    assert_gids!(root.children.current(), ["a", "b"]);
    root.children.each(|child, _| {
        assert_eq!(child.core().parent_gid(), Some("root".into()));
        assert!(child.is_active());
    });
}

#[test]
fn incremental_add_and_remove() {
    init_logger();
    let world = TestWorld::new();
    let (a, b) = (world.foo("a"), world.foo("b"));
    let root_model = world.build(FooBuilder::new("root").child(&a).child(&b));
    let root = world.create_foo(&root_model).unwrap();

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    root.children.on_add(move |added| {
        sink.borrow_mut()
            .push(format!("add {} @{}", added.component.gid(), added.index));
        Ok(())
    });
    let sink = events.clone();
    root.children.on_remove(move |removed| {
        sink.borrow_mut()
            .push(format!("remove {} @{}", removed.component.gid(), removed.index));
        Ok(())
    });

    let children = root_model.collection("children").unwrap();
    children.add(world.foo("c")).unwrap();
    let removed = root.children.get(1).unwrap();
    children.remove(&b).unwrap();

    assert_gids!(root.children.current(), ["a", "c"]);
    assert_eq!(*events.borrow(), vec!["add c @2", "remove b @1"]);
    assert_eq!(removed.core().parent_gid(), None);
    assert!(!removed.is_active());

    assert_eq!(world.controllers.destroy_orphans(), 1);
    assert!(removed.core().is_destroyed());
    assert!(!world.controllers.registry().contains(b.gid()));
}

#[test]
fn adding_a_listed_item_again_is_a_no_op() {
    init_logger();
    let world = TestWorld::new();
    let a = world.foo("a");
    let root_model = world.build(FooBuilder::new("root").child(&a));
    let root = world.create_foo(&root_model).unwrap();

    root_model.collection("children").unwrap().add(a).unwrap();
    let first = root.children.get(0).unwrap();
    root.children.add(first).unwrap();

    assert_eq!(root.children.count(), 1);
}

#[test]
fn replacing_the_collection_rederives_the_list() {
    init_logger();
    let world = TestWorld::new();
    let (a, b) = (world.foo("a"), world.foo("b"));
    let root_model = world.build(FooBuilder::new("root").child(&a).child(&b));
    let root = world.create_foo(&root_model).unwrap();
    let old_collection = root.children.collection().unwrap();

    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = changes.clone();
    root.children.on_change(move |change| {
        let gids_of = |list: &Option<Vec<Rc<FooComponent>>>| gids(list.as_deref().unwrap_or_default());
        sink.borrow_mut()
            .push((gids_of(&change.old), gids_of(&change.current)));
        Ok(())
    });

    let (d, e) = (world.foo("d"), world.foo("e"));
    root_model
        .set("children", Collection::with_items([d, e]))
        .unwrap();

    assert_gids!(root.children.current(), ["d", "e"]);
    assert_eq!(
        *changes.borrow(),
        vec![(
            vec!["a".to_string(), "b".to_string()],
            vec!["d".to_string(), "e".to_string()]
        )]
    );

    // the old collection is no longer observed
    old_collection.add(world.foo("stray")).unwrap();
    assert_gids!(root.children.current(), ["d", "e"]);
}

#[test]
fn queries_over_the_list() {
    init_logger();
    let world = TestWorld::new();
    let (a, b, c) = (world.foo("a"), world.foo("b"), world.foo("c"));
    b.set("name", "special").unwrap();
    let root = world.build(FooBuilder::new("root").child(&a).child(&b).child(&c));
    let root = world.create_foo(&root).unwrap();

    let b = root.children.get(1).unwrap();
    assert!(root.children.has(&b));
    assert!(root.children.get(3).is_none());
    assert_eq!(
        root.children.map(|child| child.name().unwrap_or_default()),
        vec!["a", "special", "c"]
    );
    assert_gids!(
        root.children.filter(|child| child.name() != Some("special".to_string())),
        ["a", "c"]
    );
    assert_same_component!(
        root.children
            .find(|child| child.gid().as_str() == "b")
            .unwrap(),
        b
    );

    let criteria = Record::from([("name".to_string(), Value::from("special"))]);
    assert_same_component!(root.children.find_by(&criteria).unwrap(), b);
    let criteria = Record::from([("name".to_string(), Value::from("missing"))]);
    assert!(root.children.find_by(&criteria).is_none());

    let mut visited = Vec::new();
    root.children.each(|child, index| visited.push((child.gid().to_string(), index)));
    assert_eq!(visited[2], ("c".to_string(), 2));
}

#[test]
fn local_removal_fires_one_event_per_match() {
    init_logger();
    let world = TestWorld::new();
    let models: Vec<_> = ["x1", "y", "x2", "x3"]
        .into_iter()
        .map(|gid| world.foo(gid))
        .collect();
    let builder = models
        .iter()
        .fold(FooBuilder::new("root"), |builder, child| builder.child(child));
    let root_model = world.build(builder);
    let root = world.create_foo(&root_model).unwrap();

    let removed = Rc::new(RefCell::new(Vec::new()));
    let sink = removed.clone();
    root.children.on_remove(move |event| {
        sink.borrow_mut().push(event.component.gid().to_string());
        Ok(())
    });

    let count = root
        .children
        .remove_where(|child| child.gid().as_str().starts_with('x'))
        .unwrap();

    assert_eq!(count, 3);
    assert_eq!(*removed.borrow(), vec!["x3", "x2", "x1"]);
    assert_gids!(root.children.current(), ["y"]);
    // local removal leaves the model alone
    assert_eq!(root_model.collection("children").unwrap().len(), 4);

    let y = root.children.get(0).unwrap();
    assert_eq!(root.children.remove_all(&[y.clone(), y]).unwrap(), 1);
    assert!(root.children.is_empty());
}

#[test]
fn owned_items_that_cannot_be_built_are_skipped() {
    init_logger();
    let world = TestWorld::new();
    let ghost = world
        .models
        .create_with_gid(GHOST, "ghost")
        .unwrap();
    let (a, b) = (world.foo("a"), world.foo("b"));
    let root_model = world.build(FooBuilder::new("root").child(&a).child(&ghost).child(&b));

    let root = world.create_foo(&root_model).unwrap();

    assert_gids!(root.children.current(), ["a", "b"]);
    assert!(!world.controllers.registry().contains(ghost.gid()));

    root_model
        .collection("children")
        .unwrap()
        .add(world.foo("c"))
        .unwrap();
    assert_gids!(root.children.current(), ["a", "b", "c"]);
}

#[test]
fn clear_removes_last_first_and_unparents() {
    init_logger();
    let world = TestWorld::new();
    let (a, b) = (world.foo("a"), world.foo("b"));
    let root = world.build(FooBuilder::new("root").child(&a).child(&b));
    let root = world.create_foo(&root).unwrap();
    let children = root.children.current();

    let removed = Rc::new(RefCell::new(Vec::new()));
    let sink = removed.clone();
    root.children.on_remove(move |event| {
        sink.borrow_mut().push((event.component.gid().to_string(), event.index));
        Ok(())
    });
    root.children.clear().unwrap();

    assert_eq!(
        *removed.borrow(),
        vec![("b".to_string(), 1), ("a".to_string(), 0)]
    );
    assert!(children
        .iter()
        .all(|child| child.core().parent_gid().is_none()));
}
