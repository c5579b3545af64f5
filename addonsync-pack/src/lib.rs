//! Addon content packages.
//!
//! An addon archive is a zip (`.mcpack` or `.zip`) holding a JSON
//! `manifest.json` and, optionally, declarative entity definitions under
//! `entities/`. [`ContentPackageLoader::load`] validates an archive and
//! yields an immutable [`ContentPackage`] that can serve itself to clients
//! in chunks.

mod builder;
mod entity;
mod error;
pub mod json;
mod manifest;
mod package;

pub use builder::ArchiveBuilder;
pub use entity::{EntityDefinition, PropertyDeclaration};
pub use error::PackError;
pub use manifest::{Manifest, ManifestDependency, ManifestHeader, ManifestMetadata, ManifestModule};
pub use package::{ContentPackage, ContentPackageLoader, PackSource};
