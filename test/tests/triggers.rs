/// Integration tests for trigger dispatch
/// Triggers forward an event on a source component to a controller action
/// on a target, gated by conditions, with payload remapping and a default
/// controller supplied by their aggregator.

use std::rc::Rc;

use parallax_controller::{
    BehaviourController, TriggerController, TriggerState, BEHAVIOUR, CONDITION, CONDITION_EQUALS,
    TRIGGER,
};
use parallax_shared::{Component, Model, Record, Schema, SyncError, Value};
use parallax_test::{
    test_models::{BUTTON, LAMP, SCENE, WIDGET},
    ButtonComponent, LampComponent, SceneComponent, TestWorld,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn record(entries: &[(&str, &str)]) -> Record {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), Value::from(*value)))
        .collect()
}

fn trigger_model(
    world: &TestWorld,
    source: Option<&Model>,
    event: &str,
    target: Option<&Model>,
    action: &str,
) -> Model {
    let trigger = world.node(TRIGGER);
    trigger.set_path("event.source", source).unwrap();
    trigger.set_path("event.name", event).unwrap();
    trigger.set_path("action.target", target).unwrap();
    trigger.set_path("action.name", action).unwrap();
    trigger
}

struct Fixture {
    world: TestWorld,
    scene_model: Model,
    scene: Rc<SceneComponent>,
    button: Rc<ButtonComponent>,
    lamp: Rc<LampComponent>,
    trigger_model: Model,
    trigger: Rc<TriggerController>,
}

/// A scene with one button, one lamp and a `select -> highlight` trigger
/// between them. `configure` runs on the trigger model before the scene is
/// built.
fn fixture(configure: impl FnOnce(&TestWorld, &Model)) -> Fixture {
    init_logger();
    let world = TestWorld::new();
    let button = world.node(BUTTON);
    let lamp = world.node(LAMP);
    let trigger_model = trigger_model(&world, Some(&button), "select", Some(&lamp), "highlight");
    configure(&world, &trigger_model);

    let scene_model = world.node(SCENE);
    scene_model.collection("buttons").unwrap().add(button).unwrap();
    scene_model.collection("lamps").unwrap().add(lamp).unwrap();
    scene_model
        .collection("triggers")
        .unwrap()
        .add(trigger_model.clone())
        .unwrap();

    let scene = world
        .controllers
        .create::<SceneComponent>(&scene_model)
        .unwrap();
    Fixture {
        button: scene.buttons.get(0).unwrap(),
        lamp: scene.lamps.get(0).unwrap(),
        trigger: scene.triggers.get(0).unwrap(),
        world,
        scene_model,
        scene,
        trigger_model,
    }
}

#[test]
fn mapping_forwards_only_mapped_keys() {
    let fixture = fixture(|_, trigger| {
        trigger
            .set("mapping", Value::record([("targetId", "objectGid")]))
            .unwrap();
    });
    assert_eq!(fixture.trigger.state(), TriggerState::Listening);

    fixture
        .button
        .emit(
            "select",
            record(&[("objectGid", "obj-1"), ("color", "red")]),
        )
        .unwrap();

    assert_eq!(
        fixture.lamp.highlighted(),
        vec![Some(record(&[("targetId", "obj-1")]))]
    );
}

#[test]
fn missing_source_keys_are_left_out() {
    let fixture = fixture(|_, trigger| {
        trigger
            .set(
                "mapping",
                Value::record([("targetId", "objectGid"), ("tint", "color")]),
            )
            .unwrap();
    });

    fixture
        .button
        .emit("select", record(&[("objectGid", "obj-2")]))
        .unwrap();

    assert_eq!(
        fixture.lamp.highlighted(),
        vec![Some(record(&[("targetId", "obj-2")]))]
    );
}

#[test]
fn empty_mapping_forwards_the_payload() {
    let fixture = fixture(|_, _| {});

    let payload = record(&[("objectGid", "obj-1"), ("color", "red")]);
    fixture.button.emit("select", payload.clone()).unwrap();
    fixture.button.emit("select", Value::Null).unwrap();

    assert_eq!(fixture.lamp.highlighted(), vec![Some(payload), None]);
}

#[test]
fn non_record_payloads_are_skipped() {
    let fixture = fixture(|_, _| {});

    assert!(fixture.button.emit("select", 5).is_ok());
    assert!(fixture.button.emit("select", "text").is_ok());

    assert!(fixture.lamp.highlighted().is_empty());
}

#[test]
fn condition_gates_the_action() {
    let fixture = fixture(|world, trigger| {
        let condition = world.node(CONDITION_EQUALS);
        condition
            .set("check", Value::record([("color", "red")]))
            .unwrap();
        trigger.set("condition", condition).unwrap();
    });

    fixture
        .button
        .emit("select", record(&[("color", "blue")]))
        .unwrap();
    fixture
        .button
        .emit("select", record(&[("color", "red")]))
        .unwrap();
    fixture.button.emit("select", Value::Null).unwrap();

    assert_eq!(
        fixture.lamp.highlighted(),
        vec![Some(record(&[("color", "red")]))]
    );
}

#[test]
fn unknown_condition_fails_closed() {
    let fixture = fixture(|world, trigger| {
        world
            .models
            .register(Schema::new("Mystery").extends(CONDITION))
            .unwrap();
        trigger.set("condition", world.node("Mystery")).unwrap();
    });

    fixture
        .button
        .emit("select", record(&[("color", "red")]))
        .unwrap();

    assert!(fixture.lamp.highlighted().is_empty());
}

#[test]
fn disabled_trigger_stops_listening() {
    let fixture = fixture(|_, _| {});

    fixture.scene.set_enabled(false).unwrap();
    assert_eq!(fixture.trigger.state(), TriggerState::Idle);
    fixture.button.emit("select", Value::Null).unwrap();
    assert!(fixture.lamp.highlighted().is_empty());

    fixture.scene.set_enabled(true).unwrap();
    assert_eq!(fixture.trigger.state(), TriggerState::Listening);
    fixture.button.emit("select", Value::Null).unwrap();
    assert_eq!(fixture.lamp.highlighted().len(), 1);
}

#[test]
fn event_name_change_resubscribes() {
    let fixture = fixture(|_, _| {});

    fixture
        .trigger_model
        .set_path("event.name", "press")
        .unwrap();
    fixture.button.emit("select", Value::Null).unwrap();
    assert!(fixture.lamp.highlighted().is_empty());

    fixture.button.emit("press", Value::Null).unwrap();
    assert_eq!(fixture.lamp.highlighted().len(), 1);

    fixture
        .trigger_model
        .set_path("event.name", "missing")
        .unwrap();
    assert_eq!(fixture.trigger.state(), TriggerState::Idle);
}

#[test]
fn source_change_resubscribes() {
    let fixture = fixture(|_, _| {});
    let other = fixture.world.node(BUTTON);
    fixture
        .scene_model
        .collection("buttons")
        .unwrap()
        .add(other.clone())
        .unwrap();
    let other_button = fixture.scene.buttons.get(1).unwrap();

    fixture
        .trigger_model
        .set_path("event.source", &other)
        .unwrap();
    fixture.button.emit("select", Value::Null).unwrap();
    assert!(fixture.lamp.highlighted().is_empty());

    other_button.emit("select", Value::Null).unwrap();
    assert_eq!(fixture.lamp.highlighted().len(), 1);
}

#[test]
fn trigger_follows_a_rebuilt_source() {
    let fixture = fixture(|_, _| {});
    let button_model = fixture.button.model().clone();

    fixture.button.destroy();
    assert_eq!(fixture.trigger.state(), TriggerState::Idle);

    let buttons = fixture.scene_model.collection("buttons").unwrap();
    buttons.remove(&button_model).unwrap();
    buttons.add(button_model).unwrap();
    let rebuilt = fixture.scene.buttons.get(0).unwrap();
    assert!(!Rc::ptr_eq(&rebuilt, &fixture.button));
    assert_eq!(fixture.trigger.state(), TriggerState::Listening);

    rebuilt.emit("select", Value::Null).unwrap();
    assert_eq!(fixture.lamp.highlighted(), vec![None]);
}

#[test]
fn unknown_and_internal_actions_are_errors() {
    let fixture = fixture(|_, _| {});

    fixture
        .trigger_model
        .set_path("action.name", "explode")
        .unwrap();
    assert!(matches!(
        fixture.button.emit("select", Value::Null),
        Err(SyncError::UnknownAction { .. })
    ));

    fixture
        .trigger_model
        .set_path("action.name", "reset")
        .unwrap();
    assert!(matches!(
        fixture.button.emit("select", Value::Null),
        Err(SyncError::NotAnAction { .. })
    ));
}

#[test]
fn aggregator_is_the_default_controller() {
    let fixture = fixture(|_, _| {});
    let widget_model = fixture.world.node(WIDGET);
    let inner = trigger_model(&fixture.world, None, "click", None, "highlight");
    widget_model
        .collection("triggers")
        .unwrap()
        .add(inner.clone())
        .unwrap();
    fixture
        .scene_model
        .collection("widgets")
        .unwrap()
        .add(widget_model.clone())
        .unwrap();

    let widget = fixture.scene.widgets.get(0).unwrap();
    let trigger = widget.triggers.get(0).unwrap();
    assert_eq!(trigger.default_controller(), Some(widget.gid().clone()));
    assert_eq!(trigger.state(), TriggerState::Listening);

    widget
        .core()
        .events()
        .fire("click", record(&[("x", "1")]))
        .unwrap();
    assert_eq!(widget.highlighted(), vec![Some(record(&[("x", "1")]))]);

    widget_model
        .collection("triggers")
        .unwrap()
        .remove(&inner)
        .unwrap();
    assert_eq!(trigger.default_controller(), None);
    assert_eq!(trigger.state(), TriggerState::Idle);
    widget.core().events().fire("click", Value::Null).unwrap();
    assert_eq!(widget.highlighted().len(), 1);
}

#[test]
fn behaviour_adopts_its_triggers() {
    let fixture = fixture(|_, _| {});
    let button = fixture.button.model().clone();
    let lamp = fixture.lamp.model().clone();

    let behaviour_model = fixture.world.node(BEHAVIOUR);
    behaviour_model.set("name", "wiring").unwrap();
    let explicit = trigger_model(&fixture.world, Some(&button), "press", Some(&lamp), "highlight");
    let implicit = trigger_model(&fixture.world, None, "press", None, "highlight");
    let triggers = behaviour_model.collection("triggers").unwrap();
    triggers.add(explicit).unwrap();
    triggers.add(implicit).unwrap();
    fixture
        .scene_model
        .collection("behaviours")
        .unwrap()
        .add(behaviour_model)
        .unwrap();

    let behaviour: Rc<BehaviourController> = fixture.scene.behaviours.get(0).unwrap();
    assert_eq!(behaviour.name(), Some("wiring".to_string()));
    let explicit = behaviour.triggers().get(0).unwrap();
    let implicit = behaviour.triggers().get(1).unwrap();
    assert_eq!(explicit.default_controller(), Some(behaviour.gid().clone()));
    assert_eq!(explicit.state(), TriggerState::Listening);
    // the behaviour itself declares no events
    assert_eq!(implicit.state(), TriggerState::Idle);

    fixture
        .button
        .emit("press", record(&[("objectGid", "obj-3")]))
        .unwrap();
    assert_eq!(
        fixture.lamp.highlighted(),
        vec![Some(record(&[("objectGid", "obj-3")]))]
    );
}
