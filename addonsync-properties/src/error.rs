//! Error types for the properties crate.

use addonsync_types::{EntityTypeId, PropertyKind, PropertyValue};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    #[error("property name cannot be empty")]
    EmptyName,

    #[error("property '{name}': min and max must be of the same kind")]
    MixedBoundKinds { name: String },

    #[error("property '{name}': bounds must be {kind} values")]
    BoundKind { name: String, kind: PropertyKind },

    #[error("property '{name}': bounds must be non-negative")]
    NegativeBound { name: String },

    #[error("property '{name}': minimum {min} is greater than maximum {max}")]
    InvertedRange {
        name: String,
        min: PropertyValue,
        max: PropertyValue,
    },

    #[error("property '{name}': default {default} is outside [{min}, {max}]")]
    DefaultOutOfRange {
        name: String,
        default: PropertyValue,
        min: PropertyValue,
        max: PropertyValue,
    },

    #[error("property '{name}' of {entity_type} is already registered")]
    DuplicateProperty { entity_type: EntityTypeId, name: String },

    #[error("property '{name}' of {entity_type} is already registered as {existing}, not {requested}")]
    KindMismatch {
        entity_type: EntityTypeId,
        name: String,
        existing: PropertyKind,
        requested: PropertyKind,
    },

    #[error("property '{name}' not found for {entity_type}")]
    UnknownProperty { entity_type: EntityTypeId, name: String },

    #[error("value {value} is not a valid {kind} for property '{name}'")]
    ValueKind {
        name: String,
        kind: PropertyKind,
        value: PropertyValue,
    },

    #[error("value {value} for property '{name}' of {entity_type} is outside [{min}, {max}]")]
    OutOfRange {
        entity_type: EntityTypeId,
        name: String,
        value: PropertyValue,
        min: PropertyValue,
        max: PropertyValue,
    },
}
