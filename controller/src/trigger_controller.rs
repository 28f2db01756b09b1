use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use log::{error, info, warn};

use parallax_shared::{
    Component, ComponentCore, ComponentSlot, Factory, Gid, ListenerId, Model, PropertySync,
    Record, SyncError, Value,
};

use crate::condition::evaluate_condition;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Listening,
}

struct Subscription {
    source: Weak<dyn Component>,
    event: String,
    listener: ListenerId,
}

/// Listens to a named event on a source component and invokes a named
/// action on a target component, optionally gated by a condition and with
/// the payload remapped.
///
/// Source and target come from the trigger's own references first, then
/// from the default controller set by the enclosing aggregator.
pub struct TriggerController {
    core: ComponentCore,
    source: ComponentSlot<dyn Component>,
    target: ComponentSlot<dyn Component>,
    event_name: PropertySync<Value>,
    action_name: PropertySync<Value>,
    default_controller: RefCell<Option<Gid>>,
    subscription: RefCell<Option<Subscription>>,
    this: Weak<TriggerController>,
}

impl TriggerController {
    pub fn new(model: Model, factory: &Factory) -> Result<Rc<Self>, SyncError> {
        let core = ComponentCore::new(model, factory);
        let source = core.slot::<dyn Component>("event.source")?;
        let target = core.slot::<dyn Component>("action.target")?;
        let event_name = core.property("event.name")?;
        let action_name = core.property("action.name")?;

        let trigger = Rc::new_cyclic(|this| Self {
            core,
            source,
            target,
            event_name,
            action_name,
            default_controller: RefCell::new(None),
            subscription: RefCell::new(None),
            this: this.clone(),
        });

        let this = trigger.this.clone();
        trigger.source.on_change(move |_| resubscribe(&this));
        let this = trigger.this.clone();
        trigger.event_name.on_change(move |_| resubscribe(&this));

        Ok(trigger)
    }

    pub fn state(&self) -> TriggerState {
        match &*self.subscription.borrow() {
            Some(_) => TriggerState::Listening,
            None => TriggerState::Idle,
        }
    }

    pub fn event_name(&self) -> Option<String> {
        self.event_name.current()?.as_text().map(str::to_string)
    }

    pub fn action_name(&self) -> Option<String> {
        self.action_name.current()?.as_text().map(str::to_string)
    }

    pub fn default_controller(&self) -> Option<Gid> {
        self.default_controller.borrow().clone()
    }

    /// Sets the fallback source and target. Re-subscribes if listening.
    pub fn set_default_controller(&self, controller: Option<Gid>) -> Result<(), SyncError> {
        if *self.default_controller.borrow() == controller {
            return Ok(());
        }
        *self.default_controller.borrow_mut() = controller;
        self.refresh_subscription()
    }

    /// Explicit source, else the default controller
    pub fn source(&self) -> Option<Rc<dyn Component>> {
        self.source.current().or_else(|| self.default_component())
    }

    /// Explicit target, else the default controller
    pub fn target(&self) -> Option<Rc<dyn Component>> {
        self.target.current().or_else(|| self.default_component())
    }

    fn default_component(&self) -> Option<Rc<dyn Component>> {
        let gid = self.default_controller()?;
        self.core.factory()?.registry().by_gid(&gid)
    }

    // Listening

    fn refresh_subscription(&self) -> Result<(), SyncError> {
        if !self.is_active() {
            return Ok(());
        }
        self.stop_listening();
        self.start_listening()
    }

    fn start_listening(&self) -> Result<(), SyncError> {
        if self.state() == TriggerState::Listening {
            return Ok(());
        }
        let Some(event) = self.event_name() else {
            return Ok(());
        };
        let Some(source) = self.source() else {
            info!("Trigger {} has no source for '{}' yet", self.gid(), event);
            return Ok(());
        };
        if !source.core().events().has(&event) {
            warn!(
                "Trigger {}: source {:?} has no event '{}', not listening",
                self.gid(),
                source,
                event
            );
            return Ok(());
        }

        let this = self.this.clone();
        let listener = source.core().events().on(&event, move |payload| match this.upgrade() {
            Some(trigger) => trigger.on_event(payload),
            None => Ok(()),
        })?;
        *self.subscription.borrow_mut() = Some(Subscription {
            source: Rc::downgrade(&source),
            event,
            listener,
        });
        Ok(())
    }

    fn stop_listening(&self) {
        let subscription = self.subscription.borrow_mut().take();
        let Some(subscription) = subscription else {
            return;
        };
        if let Some(source) = subscription.source.upgrade() {
            source
                .core()
                .events()
                .off(&subscription.event, subscription.listener);
        }
    }

    // Dispatch

    fn on_event(&self, payload: &Value) -> Result<(), SyncError> {
        if !self.is_active() {
            return Ok(());
        }
        if let Value::Node(condition) = self.model().get("condition") {
            if !evaluate_condition(&condition, payload) {
                info!("Condition for trigger {} not met, not calling target action", self.gid());
                return Ok(());
            }
        }
        self.target_action(payload)
    }

    fn target_action(&self, payload: &Value) -> Result<(), SyncError> {
        let input = match payload {
            Value::Null => None,
            Value::Record(record) => Some(self.remap(record)),
            other => {
                error!(
                    "Trigger {}: action payload should be a record, got {}",
                    self.gid(),
                    other.type_name()
                );
                return Ok(());
            }
        };
        let Some(action) = self.action_name() else {
            warn!("Trigger {} has no action name", self.gid());
            return Ok(());
        };
        let Some(target) = self.target() else {
            error!("Trigger {}: no target for action '{}'", self.gid(), action);
            return Ok(());
        };

        target.core().actions().invoke(&action, input)
    }

    /// A non-empty mapping forwards only mapped keys, `target <- source`.
    /// Missing source keys are left out.
    fn remap(&self, payload: &Record) -> Record {
        let mapping = match self.model().get("mapping") {
            Value::Record(mapping) if !mapping.is_empty() => mapping,
            _ => return payload.clone(),
        };

        let mut input = Record::new();
        for (to, from) in &mapping {
            let Some(from) = from.as_text() else {
                error!(
                    "Trigger {}: cannot map '{}' from non-string {:?}",
                    self.gid(),
                    to,
                    from
                );
                continue;
            };
            if let Some(value) = payload.get(from) {
                input.insert(to.clone(), value.clone());
            }
        }
        input
    }
}

fn resubscribe(trigger: &Weak<TriggerController>) -> Result<(), SyncError> {
    match trigger.upgrade() {
        Some(trigger) => trigger.refresh_subscription(),
        None => Ok(()),
    }
}

impl Component for TriggerController {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn on_enable(&self) -> Result<(), SyncError> {
        self.start_listening()
    }

    fn on_disable(&self) {
        self.stop_listening();
    }

    fn on_destroy(&self) {
        self.stop_listening();
    }
}
