//! Core type definitions for addonsync.
//!
//! This crate defines the small, protocol-agnostic types shared by every
//! other crate in the workspace:
//! - Content package and entity identifiers
//! - Version triples as they appear in pack manifests
//! - Numeric property kinds and values
//!
//! Packet shapes live in `addonsync-protocol`; archive handling lives in
//! `addonsync-pack`.

mod ids;
mod property;
mod version;

pub use ids::{ContentId, EntityTypeId, RuntimeId, SessionId};
pub use property::{PropertyKind, PropertyValue};
pub use version::PackVersion;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("content id must be a hyphenated UUID: {0:?}")]
    InvalidContentId(String),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("invalid entity type identifier: {0:?}")]
    InvalidEntityType(String),
}
