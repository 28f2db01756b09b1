use parallax_shared::{ModelFactory, PropertyDef, Schema, SyncError, ValueKind};

pub const VECTOR3: &str = "Vector3";
pub const VIEW: &str = "View";

/// Registers the vector and view schemas
pub fn register_models(models: &ModelFactory) -> Result<(), SyncError> {
    models.register(
        Schema::new(VECTOR3)
            .property(PropertyDef::new("x", ValueKind::Number).with_default(0.0))
            .property(PropertyDef::new("y", ValueKind::Number).with_default(0.0))
            .property(PropertyDef::new("z", ValueKind::Number).with_default(0.0)),
    )?;
    models.register(
        Schema::new(VIEW)
            .property(PropertyDef::new("name", ValueKind::Text))
            .property(PropertyDef::new("position", ValueKind::Node(Some(VECTOR3))).required())
            .property(PropertyDef::new("scale", ValueKind::Number).with_default(1.0))
            .property(PropertyDef::new("visible", ValueKind::Bool).with_default(true))
            .property(PropertyDef::new("children", ValueKind::Collection(Some(VIEW)))),
    )?;
    Ok(())
}
