//! Reports behind the `addonsync` command.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use addonsync_host::{
    AddonConfig, AddonEngine, EntityDirectory, InMemoryPackManager, LoadedPackageInfo, TaskPool,
};
use addonsync_pack::{ArchiveBuilder, ContentPackage, ContentPackageLoader};
use addonsync_types::{ContentId, EntityTypeId, PackVersion, PropertyKind, PropertyValue, RuntimeId};
use anyhow::{bail, Context, Result};
use serde::Serialize;

/// Stand-in world with no spawned entities.
struct Offline;

impl EntityDirectory for Offline {
    fn entity_type_of(&self, _runtime_id: RuntimeId) -> Option<EntityTypeId> {
        None
    }

    fn entities_visible_to(&self, _viewer: RuntimeId, _entity_type: &EntityTypeId) -> Vec<RuntimeId> {
        Vec::new()
    }

    fn resend_actor_data(&self, _runtime_id: RuntimeId, _recipient: Option<RuntimeId>) {}
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PropertyRow {
    pub index: u32,
    pub name: String,
    pub kind: PropertyKind,
    pub default: PropertyValue,
    pub min: PropertyValue,
    pub max: PropertyValue,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct EntitySchema {
    pub entity_type: String,
    pub properties: Vec<PropertyRow>,
}

/// Everything a packs directory would install into a server.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct InspectReport {
    pub packs_dir: PathBuf,
    pub requested: Vec<String>,
    pub packages: Vec<LoadedPackageInfo>,
    pub schemas: Vec<EntitySchema>,
}

/// Loads the packs directory the way a server would at startup.
pub async fn inspect(packs_dir: &Path) -> Result<InspectReport> {
    let config = AddonConfig::load_or_init(packs_dir)
        .with_context(|| format!("Failed to read config in {}", packs_dir.display()))?;
    let requested = config.addons.behavior_stack.clone();

    let engine = AddonEngine::with_config(
        config,
        packs_dir,
        Arc::new(InMemoryPackManager::new()),
        Arc::new(Offline),
    );
    let pool = TaskPool::current().context("Task pool needs a tokio runtime")?;
    engine.warm_hashes(&pool).await;

    let packages = engine
        .packages()
        .list_loaded_packages()
        .context("Failed to hash loaded packages")?;

    let schema = engine.properties().schema();
    let schemas = schema
        .entity_types()
        .into_iter()
        .map(|entity_type| EntitySchema {
            properties: schema
                .slots(&entity_type)
                .into_iter()
                .map(|slot| PropertyRow {
                    index: slot.index,
                    name: slot.name,
                    kind: slot.kind,
                    default: slot.default,
                    min: slot.min,
                    max: slot.max,
                })
                .collect(),
            entity_type: entity_type.to_string(),
        })
        .collect();

    Ok(InspectReport {
        packs_dir: packs_dir.to_path_buf(),
        requested,
        packages,
        schemas,
    })
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct EntitySummary {
    pub identifier: String,
    pub properties: Vec<String>,
}

/// What a single archive contains.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PackageSummary {
    pub path: PathBuf,
    pub id: ContentId,
    pub name: String,
    pub version: PackVersion,
    pub size: u64,
    pub sha256: String,
    pub has_scripts: bool,
    pub entities: Vec<EntitySummary>,
}

impl PackageSummary {
    fn of(package: &ContentPackage) -> Result<Self> {
        Ok(Self {
            path: package.path().to_path_buf(),
            id: package.content_id(),
            name: package.name().to_string(),
            version: package.version(),
            size: package.size(),
            sha256: package.sha256_hex().context("Failed to hash package")?,
            has_scripts: package.has_scripts(),
            entities: package
                .entities()
                .iter()
                .map(|e| EntitySummary {
                    identifier: e.identifier.clone(),
                    properties: e.properties.iter().map(|p| p.name.clone()).collect(),
                })
                .collect(),
        })
    }
}

/// Loads one archive and summarizes it.
pub fn check(path: &Path) -> Result<PackageSummary> {
    let package = ContentPackageLoader::load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    PackageSummary::of(&package)
}

/// Writes a skeleton package to `path` and returns its new content id.
/// With `script`, a javascript module is declared and an empty entry file
/// is written at that path inside the archive.
pub fn scaffold(path: &Path, name: &str, script: Option<&str>) -> Result<ContentId> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    let id = ContentId::random();
    let mut builder = ArchiveBuilder::new(name, id);
    if let Some(entry) = script {
        builder = builder.script("javascript", entry).entry(entry, Vec::new());
    }
    builder
        .write_to(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(id)
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} of {} packages loaded",
            self.packs_dir.display(),
            self.packages.len(),
            self.requested.len()
        )?;
        for p in &self.packages {
            writeln!(
                f,
                "  {} v{}  {} bytes  sha256 {}{}",
                p.id,
                p.version,
                p.size,
                p.hash,
                if p.has_scripts { "  [scripts]" } else { "" }
            )?;
        }
        for schema in &self.schemas {
            writeln!(f, "{}", schema.entity_type)?;
            for row in &schema.properties {
                writeln!(
                    f,
                    "  #{} {} {} = {} in [{}, {}]",
                    row.index, row.name, row.kind, row.default, row.min, row.max
                )?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for PackageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.path.display())?;
        writeln!(f, "  id       {}", self.id)?;
        writeln!(f, "  version  {}", self.version)?;
        writeln!(f, "  size     {} bytes", self.size)?;
        writeln!(f, "  sha256   {}", self.sha256)?;
        writeln!(f, "  scripts  {}", if self.has_scripts { "yes" } else { "no" })?;
        for entity in &self.entities {
            writeln!(f, "  entity   {} ({})", entity.identifier, entity.properties.join(", "))?;
        }
        Ok(())
    }
}
