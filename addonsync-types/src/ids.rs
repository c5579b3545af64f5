//! Identifier types used throughout addonsync.
//!
//! Content packages are identified by the UUID in their manifest header.
//! Entities are addressed by the runtime id the host assigns them, and
//! entity types by their namespaced identifier (`minecraft:player`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a content package (the manifest header UUID).
///
/// Parsing accepts only the 8-4-4-4-12 hyphenated form, in either case;
/// `Display` always yields the lowercase hyphenated form used as the
/// registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(Uuid);

impl ContentId {
    /// Creates a content id from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Creates a random content id. Mostly useful for tests and tooling.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses a hyphenated content id. Simple, braced and URN forms are
    /// rejected.
    pub fn parse(s: &str) -> Result<Self, crate::Error> {
        let s = s.trim();
        let hyphenated = s.len() == 36
            && s.bytes().enumerate().all(|(i, b)| match i {
                8 | 13 | 18 | 23 => b == b'-',
                _ => b.is_ascii_hexdigit(),
            });
        if !hyphenated {
            return Err(crate::Error::InvalidContentId(s.to_string()));
        }
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Compares against an arbitrary string form without allocating a key.
    /// Strings that are not UUIDs never match.
    #[must_use]
    pub fn matches(&self, s: &str) -> bool {
        Self::parse(s).is_ok_and(|other| other == *self)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ContentId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Runtime id the host assigns to a live entity (players included).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeId(pub u64);

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one connected session (the unit of dispatch serialization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Namespaced entity type identifier, e.g. `minecraft:player`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityTypeId(String);

impl EntityTypeId {
    /// The built-in player entity type. Its schema doubles as the
    /// player snapshot sent on game start.
    pub const PLAYER: &'static str = "minecraft:player";

    /// Creates an entity type id, rejecting empty or whitespace-only input.
    pub fn new(id: impl Into<String>) -> Result<Self, crate::Error> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(crate::Error::InvalidEntityType(id));
        }
        Ok(Self(id))
    }

    /// Returns the player entity type.
    #[must_use]
    pub fn player() -> Self {
        Self(Self::PLAYER.to_string())
    }

    /// Returns true if this is the player entity type.
    #[must_use]
    pub fn is_player(&self) -> bool {
        self.0 == Self::PLAYER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityTypeId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for EntityTypeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
