//! Model configuration errors.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Configuration errors detected while building or querying a [`Model`](crate::Model).
///
/// These are raised before any batch is processed; they indicate a mapping
/// bug, never a data problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("entity kind '{0}' is registered more than once")]
    DuplicateKind(String),

    #[error("entity kind '{0}' is not part of the model")]
    UnknownKind(String),

    #[error("entity kind '{kind}' has a cyclic base type chain")]
    InheritanceCycle { kind: String },

    #[error("derived entity kind '{kind}' cannot configure {setting}; configure it on '{root}'")]
    DerivedKindMapping {
        kind: String,
        root: String,
        setting: &'static str,
    },

    #[error("ownership of entity kind '{kind}' never reaches a document root")]
    OwnershipCycle { kind: String },

    #[error("entity kind '{kind}' is not a document root")]
    NotDocumentRoot { kind: String },

    #[error("document root '{kind}' has no target name and the model has no default target")]
    MissingTargetName { kind: String },

    #[error("document root '{kind}' has no key property")]
    MissingKey { kind: String },

    #[error(
        "properties '{property}' and '{other}' of entity kind '{kind}' both map to JSON property '{json_name}'"
    )]
    JsonPropertyCollision {
        kind: String,
        property: String,
        other: String,
        json_name: String,
    },

    #[error("entity kind '{kind}' has a discriminator value but its hierarchy has no discriminator property")]
    MissingDiscriminatorProperty { kind: String },
}
