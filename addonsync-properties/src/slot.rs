//! Property slot declarations.

use addonsync_protocol::{CompoundTag, Tag};
use addonsync_types::{EntityTypeId, PropertyKind, PropertyValue};

use crate::PropertyError;

/// A property as requested by a caller, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotDefinition {
    pub name: String,
    pub kind: PropertyKind,
    pub default: PropertyValue,
    pub min: PropertyValue,
    pub max: PropertyValue,
}

impl SlotDefinition {
    pub fn int(name: impl Into<String>, default: i32, min: i32, max: i32) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Int,
            default: PropertyValue::Int(default),
            min: PropertyValue::Int(min),
            max: PropertyValue::Int(max),
        }
    }

    pub fn float(name: impl Into<String>, default: f32, min: f32, max: f32) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Float,
            default: PropertyValue::Float(default),
            min: PropertyValue::Float(min),
            max: PropertyValue::Float(max),
        }
    }

    /// Checks the definition and normalizes the default into the slot kind.
    pub(crate) fn validate(&self) -> Result<PropertyValue, PropertyError> {
        let name = || self.name.clone();

        if self.name.trim().is_empty() {
            return Err(PropertyError::EmptyName);
        }
        if self.min.kind() != self.max.kind() {
            return Err(PropertyError::MixedBoundKinds { name: name() });
        }
        if self.min.kind() != self.kind {
            return Err(PropertyError::BoundKind {
                name: name(),
                kind: self.kind,
            });
        }
        let (min, max) = (self.min.as_f64(), self.max.as_f64());
        if min.is_nan() || max.is_nan() || min < 0.0 || max < 0.0 {
            return Err(PropertyError::NegativeBound { name: name() });
        }
        if min > max {
            return Err(PropertyError::InvertedRange {
                name: name(),
                min: self.min,
                max: self.max,
            });
        }

        let out_of_range = || PropertyError::DefaultOutOfRange {
            name: name(),
            default: self.default,
            min: self.min,
            max: self.max,
        };
        let default = self.default.coerce(self.kind).ok_or_else(out_of_range)?;
        if !(min..=max).contains(&default.as_f64()) {
            return Err(out_of_range());
        }
        Ok(default)
    }
}

/// A registered property slot. `index` is assigned at registration and
/// never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySlot {
    pub entity_type: EntityTypeId,
    pub name: String,
    pub kind: PropertyKind,
    pub default: PropertyValue,
    pub min: PropertyValue,
    pub max: PropertyValue,
    pub index: u32,
}

impl PropertySlot {
    /// Coerces `value` into this slot's kind and checks the bounds.
    pub fn check(&self, value: PropertyValue) -> Result<PropertyValue, PropertyError> {
        let coerced = value.coerce(self.kind).ok_or_else(|| PropertyError::ValueKind {
            name: self.name.clone(),
            kind: self.kind,
            value,
        })?;
        if !(self.min.as_f64()..=self.max.as_f64()).contains(&coerced.as_f64()) {
            return Err(PropertyError::OutOfRange {
                entity_type: self.entity_type.clone(),
                name: self.name.clone(),
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(coerced)
    }

    /// Schema entry sent to clients.
    pub(crate) fn to_tag(&self) -> CompoundTag {
        let kind = match self.kind {
            PropertyKind::Int => 0,
            PropertyKind::Float => 1,
        };
        CompoundTag::new()
            .with("default", value_tag(self.default))
            .with("max", value_tag(self.max))
            .with("min", value_tag(self.min))
            .with("name", Tag::String(self.name.clone()))
            .with("type", Tag::Int(kind))
    }
}

fn value_tag(value: PropertyValue) -> Tag {
    match value {
        PropertyValue::Int(v) => Tag::Int(v),
        PropertyValue::Float(v) => Tag::Float(v),
    }
}
