use thiserror::Error;

use crate::model::Gid;

/// Errors that can occur while building, mutating or mirroring a model tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A model type name was used before its schema was registered
    #[error("Model type '{model_type}' is not registered. Must call `register()` on the ModelFactory first")]
    UnknownModelType { model_type: String },

    /// A schema with the same type name was registered twice
    #[error("Model type '{model_type}' is already registered")]
    DuplicateModelType { model_type: &'static str },

    /// A property name or path segment does not exist on the model's schema
    #[error("Property '{property}' does not exist on model type '{model_type}'")]
    UnknownProperty {
        model_type: &'static str,
        property: String,
    },

    /// A value does not satisfy the declared raw type of a property, collection or sync
    #[error("Value at '{path}' is not of expected type: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// A required property was set to null
    #[error("Required property '{property}' on model type '{model_type}' cannot be null")]
    RequiredProperty {
        model_type: &'static str,
        property: String,
    },

    /// A dotted path walked through a value that is not a model node
    #[error("Path '{path}' does not lead through model nodes")]
    NotANode { path: String },

    /// Two model nodes were created with the same gid
    #[error("A model node with gid '{gid}' already exists")]
    DuplicateGid { gid: Gid },

    /// A different component is already registered under this gid
    #[error("A different component is already registered for gid '{gid}'")]
    DuplicateComponent { gid: Gid },

    /// The gid is already being resolved further up the current call stack
    #[error("Reentrant resolution of gid '{gid}' while it is still being resolved")]
    ReentrantResolve { gid: Gid },

    /// The factory could not build a component where one was required
    #[error("Could not create a {expected} component for '{model_type}' ({gid})")]
    CannotCreate {
        gid: Gid,
        model_type: &'static str,
        expected: &'static str,
    },

    /// A reference was read strictly while its target is not available yet
    #[error("Could not resolve reference at '{path}'")]
    UnresolvedReference { path: String },

    /// An event name was used that the component never declared
    #[error("Component '{gid}' has no event named '{event}'")]
    UnknownEvent { gid: Gid, event: String },

    /// An action name was used that the component never declared
    #[error("Component '{gid}' has no action named '{action}'")]
    UnknownAction { gid: Gid, action: String },

    /// The action exists but is not one that triggers are allowed to invoke
    #[error("Action '{action}' on component '{gid}' is not a controller action")]
    NotAnAction { gid: Gid, action: String },

    /// Attempted to use a component after it was destroyed
    #[error("Component '{gid}' was already destroyed")]
    ComponentDestroyed { gid: Gid },

    /// A component failed to load its runtime resources
    #[error("Component '{gid}' failed to load: {reason}")]
    Load { gid: Gid, reason: String },

    /// Application logic invoked through a handler reported a failure
    #[error("Handler failed: {message}")]
    Handler { message: String },
}

impl SyncError {
    pub fn handler(message: impl Into<String>) -> Self {
        SyncError::Handler {
            message: message.into(),
        }
    }
}
