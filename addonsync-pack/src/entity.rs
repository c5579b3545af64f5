//! Declarative entity definitions (`entities/*.json`).
//!
//! Only the description block is interpreted: the identifier, spawn flags
//! and the numeric property declarations that feed the property schema.

use addonsync_types::{PropertyKind, PropertyValue};
use serde::Deserialize;
use serde_json::{Map, Value};

/// One entity definition from a pack.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDefinition {
    pub format_version: String,
    pub identifier: String,
    pub spawn_category: String,
    pub is_spawnable: bool,
    pub is_summonable: bool,
    /// Property declarations in the order they appear in the file.
    pub properties: Vec<PropertyDeclaration>,
}

/// A numeric property as declared in an entity definition.
///
/// `min` and `max` are the extremes of the declared `range` array and,
/// like `default`, are already converted to `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDeclaration {
    pub name: String,
    pub kind: PropertyKind,
    pub default: PropertyValue,
    pub min: PropertyValue,
    pub max: PropertyValue,
}

#[derive(Deserialize)]
struct EntityFile {
    format_version: String,
    #[serde(rename = "minecraft:entity")]
    entity: EntityBody,
}

#[derive(Deserialize)]
struct EntityBody {
    description: Description,
}

#[derive(Deserialize)]
struct Description {
    identifier: String,
    spawn_category: String,
    #[serde(default = "yes")]
    is_spawnable: bool,
    #[serde(default = "yes")]
    is_summonable: bool,
    #[serde(default)]
    properties: Map<String, Value>,
}

fn yes() -> bool {
    true
}

impl EntityDefinition {
    /// Decodes an entity definition. The error string describes the
    /// problem without the entry path; callers attach it.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let file: EntityFile = serde_json::from_str(text).map_err(|e| e.to_string())?;
        let description = file.entity.description;

        let properties = description
            .properties
            .iter()
            .map(|(name, decl)| PropertyDeclaration::decode(name, decl))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            format_version: file.format_version,
            identifier: description.identifier,
            spawn_category: description.spawn_category,
            is_spawnable: description.is_spawnable,
            is_summonable: description.is_summonable,
            properties,
        })
    }
}

impl PropertyDeclaration {
    fn decode(name: &str, decl: &Value) -> Result<Self, String> {
        let decl = decl
            .as_object()
            .ok_or_else(|| format!("property '{name}' must be an object"))?;

        let declared = decl
            .get("type")
            .ok_or_else(|| format!("missing type for property '{name}'"))?;
        let kind = declared
            .as_str()
            .and_then(PropertyKind::from_declared)
            .ok_or_else(|| {
                format!("invalid type {declared} for property '{name}', must be 'int' or 'float'")
            })?;

        let range = decl
            .get("range")
            .ok_or_else(|| format!("missing range for property '{name}'"))?
            .as_array()
            .ok_or_else(|| format!("range must be an array for property '{name}'"))?;
        if range.is_empty() {
            return Err(format!("range cannot be empty for property '{name}'"));
        }

        let mut bounds: Option<(f64, f64)> = None;
        for value in range {
            let v = value
                .as_f64()
                .ok_or_else(|| format!("range values must be numeric for property '{name}'"))?;
            bounds = Some(match bounds {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
        let Some((min, max)) = bounds else {
            return Err(format!("range cannot be empty for property '{name}'"));
        };

        let default = decl
            .get("default")
            .ok_or_else(|| format!("missing default for property '{name}'"))?
            .as_f64()
            .ok_or_else(|| format!("default must be numeric for property '{name}'"))?;

        Ok(Self {
            name: name.to_string(),
            kind,
            default: to_kind(default, kind, name, "default")?,
            min: to_kind(min, kind, name, "range minimum")?,
            max: to_kind(max, kind, name, "range maximum")?,
        })
    }
}

fn to_kind(v: f64, kind: PropertyKind, name: &str, what: &str) -> Result<PropertyValue, String> {
    match kind {
        PropertyKind::Float => Ok(PropertyValue::Float(v as f32)),
        PropertyKind::Int => {
            if v.fract() != 0.0 || v < f64::from(i32::MIN) || v > f64::from(i32::MAX) {
                return Err(format!("{what} {v} of int property '{name}' is not a 32-bit integer"));
            }
            Ok(PropertyValue::Int(v as i32))
        }
    }
}
