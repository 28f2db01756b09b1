use std::{collections::BTreeMap, fmt};

use super::{Collection, Model};

/// A plain keyed record, used for event/action payloads and mapping tables
pub type Record = BTreeMap<String, Value>;

/// A raw property value as stored on a model node.
///
/// Nodes and collections compare by identity, everything else by value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Node(Model),
    Collection(Collection),
    Record(Record),
}

impl Value {
    pub fn record<K: Into<String>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Record(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Model> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Value::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Human readable type, used in error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Number(_) => "number".to_string(),
            Value::Text(_) => "text".to_string(),
            Value::Node(node) => format!("node<{}>", node.model_type()),
            Value::Collection(_) => "collection".to_string(),
            Value::Record(_) => "record".to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a.ptr_eq(b),
            (Value::Collection(a), Value::Collection(b)) => a.ptr_eq(b),
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Model> for Value {
    fn from(value: Model) -> Self {
        Value::Node(value)
    }
}

impl From<&Model> for Value {
    fn from(value: &Model) -> Self {
        Value::Node(value.clone())
    }
}

impl From<Collection> for Value {
    fn from(value: Collection) -> Self {
        Value::Collection(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Value::Null,
        }
    }
}

/// The declared raw type of a property, collection item or sync source.
///
/// `Node(Some(type))` accepts any node whose schema *is-a* `type`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Any,
    Bool,
    Number,
    Text,
    Record,
    Node(Option<&'static str>),
    Collection(Option<&'static str>),
}

impl ValueKind {
    /// Null is accepted by every kind; required-ness is checked by the schema.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ValueKind::Any, _) => true,
            (ValueKind::Bool, Value::Bool(_)) => true,
            (ValueKind::Number, Value::Number(_)) => true,
            (ValueKind::Text, Value::Text(_)) => true,
            (ValueKind::Record, Value::Record(_)) => true,
            (ValueKind::Node(None), Value::Node(_)) => true,
            (ValueKind::Node(Some(model_type)), Value::Node(node)) => node.is_a(model_type),
            (ValueKind::Collection(None), Value::Collection(_)) => true,
            (ValueKind::Collection(Some(item_type)), Value::Collection(collection)) => collection
                .items()
                .iter()
                .all(|item| item.is_a(item_type)),
            _ => false,
        }
    }

    /// Item type of a collection kind
    pub fn item_type(&self) -> Option<&'static str> {
        match self {
            ValueKind::Collection(item_type) => *item_type,
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Any => write!(f, "any"),
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Number => write!(f, "number"),
            ValueKind::Text => write!(f, "text"),
            ValueKind::Record => write!(f, "record"),
            ValueKind::Node(None) => write!(f, "node"),
            ValueKind::Node(Some(model_type)) => write!(f, "node<{}>", model_type),
            ValueKind::Collection(None) => write!(f, "collection"),
            ValueKind::Collection(Some(item_type)) => write!(f, "collection<{}>", item_type),
        }
    }
}
