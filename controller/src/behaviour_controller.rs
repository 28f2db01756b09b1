use std::rc::Rc;

use parallax_shared::{
    Component, ComponentCore, ControllerList, Factory, Gid, Model, PropertySync, SyncError, Value,
};

use crate::TriggerController;

/// Hosts a list of triggers and acts as their default controller, so a
/// trigger without an explicit source or target talks to the behaviour.
pub struct BehaviourController {
    core: ComponentCore,
    name: PropertySync<Value>,
    triggers: ControllerList<TriggerController>,
}

impl BehaviourController {
    pub fn new(model: Model, factory: &Factory) -> Result<Rc<Self>, SyncError> {
        let core = ComponentCore::new(model, factory);
        let name = core.property("name")?;
        let triggers = core.list("triggers")?;
        Ok(Rc::new(Self {
            core,
            name,
            triggers,
        }))
    }

    pub fn name(&self) -> Option<String> {
        self.name.current()?.as_text().map(str::to_string)
    }

    pub fn triggers(&self) -> &ControllerList<TriggerController> {
        &self.triggers
    }
}

impl Component for BehaviourController {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn on_init(self: Rc<Self>) -> Result<(), SyncError> {
        adopt_triggers(self.gid(), &self.triggers)
    }
}

/// Makes `owner` the default controller of every trigger in the list, now
/// and as triggers come and go.
pub fn adopt_triggers(
    owner: &Gid,
    triggers: &ControllerList<TriggerController>,
) -> Result<(), SyncError> {
    for trigger in triggers.current() {
        trigger.set_default_controller(Some(owner.clone()))?;
    }

    let adopter = owner.clone();
    triggers.on_add(move |added| {
        added
            .component
            .set_default_controller(Some(adopter.clone()))
    });
    let adopter = owner.clone();
    triggers.on_remove(move |removed| {
        if removed.component.default_controller().as_ref() == Some(&adopter) {
            removed.component.set_default_controller(None)?;
        }
        Ok(())
    });
    Ok(())
}
