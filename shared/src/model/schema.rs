use std::{collections::HashMap, rc::Rc};

use crate::SyncError;

use super::{Value, ValueKind};

/// Declaration of one property on a model type
#[derive(Clone, Debug)]
pub struct PropertyDef {
    name: String,
    kind: ValueKind,
    reference: bool,
    required: bool,
    default: Option<Value>,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            reference: false,
            required: false,
            default: None,
        }
    }

    /// The value is a link to a node owned elsewhere. Reference edges never
    /// take part in ownership or destruction.
    pub fn reference(mut self) -> Self {
        self.reference = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn is_reference(&self) -> bool {
        self.reference
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// A model type: its name, optional parent type and property declarations
#[derive(Clone, Debug)]
pub struct Schema {
    model_type: &'static str,
    extends: Option<&'static str>,
    properties: Vec<PropertyDef>,
    ancestors: Vec<&'static str>,
}

impl Schema {
    pub fn new(model_type: &'static str) -> Self {
        Self {
            model_type,
            extends: None,
            properties: Vec::new(),
            ancestors: vec![model_type],
        }
    }

    pub fn extends(mut self, parent: &'static str) -> Self {
        self.extends = Some(parent);
        self
    }

    pub fn property(mut self, def: PropertyDef) -> Self {
        self.properties.retain(|existing| existing.name != def.name);
        self.properties.push(def);
        self
    }

    pub fn model_type(&self) -> &'static str {
        self.model_type
    }

    pub fn parent_type(&self) -> Option<&'static str> {
        self.extends
    }

    pub fn property_def(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|def| def.name == name)
    }

    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    /// This type followed by every parent type, nearest first
    pub fn ancestors(&self) -> &[&'static str] {
        &self.ancestors
    }

    pub fn is_a(&self, model_type: &str) -> bool {
        self.ancestors.iter().any(|ancestor| *ancestor == model_type)
    }
}

/// All schemas known to one ModelFactory
#[derive(Default)]
pub struct TypeRegistry {
    schemas: HashMap<&'static str, Rc<Schema>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Registers a schema. A child schema inherits every property of its
    /// parent that it does not redeclare, so parents must come first.
    pub fn register(&mut self, schema: Schema) -> Result<Rc<Schema>, SyncError> {
        if self.schemas.contains_key(schema.model_type) {
            return Err(SyncError::DuplicateModelType {
                model_type: schema.model_type,
            });
        }

        let mut schema = schema;
        if let Some(parent_type) = schema.extends {
            let Some(parent) = self.schemas.get(parent_type) else {
                return Err(SyncError::UnknownModelType {
                    model_type: parent_type.to_string(),
                });
            };
            let mut properties: Vec<PropertyDef> = parent
                .properties
                .iter()
                .filter(|inherited| schema.property_def(&inherited.name).is_none())
                .cloned()
                .collect();
            properties.append(&mut schema.properties);
            schema.properties = properties;
            schema.ancestors = std::iter::once(schema.model_type)
                .chain(parent.ancestors.iter().copied())
                .collect();
        }

        let schema = Rc::new(schema);
        self.schemas.insert(schema.model_type, schema.clone());
        Ok(schema)
    }

    pub fn get(&self, model_type: &str) -> Option<Rc<Schema>> {
        self.schemas.get(model_type).cloned()
    }

    pub fn contains(&self, model_type: &str) -> bool {
        self.schemas.contains_key(model_type)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
