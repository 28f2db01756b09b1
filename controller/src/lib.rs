//! # Parallax Controller
//! The controller tree: triggers that forward events from one component to
//! an action on another, the conditions that gate them, and the behaviour
//! aggregator that hosts triggers.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod behaviour_controller;
mod condition;
mod models;
mod trigger_controller;

pub use behaviour_controller::{adopt_triggers, BehaviourController};
pub use condition::evaluate_condition;
pub use models::{
    register_models, BEHAVIOUR, CONDITION, CONDITION_EQUALS, TRIGGER, TRIGGER_ACTION,
    TRIGGER_EVENT,
};
pub use trigger_controller::{TriggerController, TriggerState};

use parallax_shared::Factory;

/// Maps the controller model types to their controllers
pub fn register_controllers(factory: &Factory) {
    factory.register_component(TRIGGER, TriggerController::new);
    factory.register_component(BEHAVIOUR, BehaviourController::new);
}
