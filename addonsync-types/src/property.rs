//! Numeric property kinds and values.
//!
//! Entity properties are either 32-bit integers or 32-bit floats on the
//! wire. A slot's kind is fixed when it is declared; values crossing the
//! API boundary are coerced into that kind or rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The numeric kind of a property slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Int,
    Float,
}

impl PropertyKind {
    /// Parses the `type` field of an entity property declaration.
    /// Matching is case-insensitive.
    pub fn from_declared(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("int") {
            Some(Self::Int)
        } else if s.eq_ignore_ascii_case("float") {
            Some(Self::Float)
        } else {
            None
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
        }
    }
}

/// A property value of either kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Int(i32),
    Float(f32),
}

impl PropertyValue {
    #[must_use]
    pub const fn kind(&self) -> PropertyKind {
        match self {
            Self::Int(_) => PropertyKind::Int,
            Self::Float(_) => PropertyKind::Float,
        }
    }

    /// Widened value for bounds comparisons across kinds.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Int(v) => f64::from(v),
            Self::Float(v) => f64::from(v),
        }
    }

    /// Converts into `kind`. Floats only become ints when they are
    /// integral and fit in an `i32`; NaN never converts.
    #[must_use]
    pub fn coerce(self, kind: PropertyKind) -> Option<Self> {
        match (self, kind) {
            (Self::Int(_), PropertyKind::Int) => Some(self),
            (Self::Float(v), PropertyKind::Float) if !v.is_nan() => Some(self),
            (Self::Float(_), PropertyKind::Float) => None,
            (Self::Int(v), PropertyKind::Float) => Some(Self::Float(v as f32)),
            (Self::Float(v), PropertyKind::Int) => {
                let wide = f64::from(v);
                if wide.fract() == 0.0 && wide >= f64::from(i32::MIN) && wide <= f64::from(i32::MAX) {
                    Some(Self::Int(wide as i32))
                } else {
                    None
                }
            }
        }
    }

    /// Returns the value when it is an int.
    #[must_use]
    pub const fn as_int(&self) -> Option<i32> {
        match *self {
            Self::Int(v) => Some(v),
            Self::Float(_) => None,
        }
    }

    /// Returns the value when it is a float.
    #[must_use]
    pub const fn as_float(&self) -> Option<f32> {
        match *self {
            Self::Float(v) => Some(v),
            Self::Int(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}
