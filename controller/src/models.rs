use parallax_shared::{ModelFactory, PropertyDef, Schema, SyncError, ValueKind};

pub const TRIGGER_EVENT: &str = "TriggerEvent";
pub const TRIGGER_ACTION: &str = "TriggerAction";
pub const CONDITION: &str = "Condition";
pub const CONDITION_EQUALS: &str = "ConditionEquals";
pub const TRIGGER: &str = "Trigger";
pub const BEHAVIOUR: &str = "Behaviour";

/// Registers the trigger, condition and behaviour schemas
pub fn register_models(models: &ModelFactory) -> Result<(), SyncError> {
    models.register(
        Schema::new(TRIGGER_EVENT)
            .property(PropertyDef::new("source", ValueKind::Node(None)).reference())
            .property(PropertyDef::new("name", ValueKind::Text)),
    )?;
    models.register(
        Schema::new(TRIGGER_ACTION)
            .property(PropertyDef::new("target", ValueKind::Node(None)).reference())
            .property(PropertyDef::new("name", ValueKind::Text)),
    )?;
    models.register(Schema::new(CONDITION))?;
    models.register(
        Schema::new(CONDITION_EQUALS)
            .extends(CONDITION)
            .property(PropertyDef::new("check", ValueKind::Record)),
    )?;
    models.register(
        Schema::new(TRIGGER)
            .property(PropertyDef::new("event", ValueKind::Node(Some(TRIGGER_EVENT))).required())
            .property(PropertyDef::new("action", ValueKind::Node(Some(TRIGGER_ACTION))).required())
            .property(PropertyDef::new("condition", ValueKind::Node(Some(CONDITION))))
            .property(PropertyDef::new("mapping", ValueKind::Record)),
    )?;
    models.register(
        Schema::new(BEHAVIOUR)
            .property(PropertyDef::new("name", ValueKind::Text))
            .property(PropertyDef::new("triggers", ValueKind::Collection(Some(TRIGGER)))),
    )?;
    Ok(())
}
