//! Loaded behavior packages and the session hooks that advertise them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use addonsync_pack::{ContentPackage, ContentPackageLoader, PackError, PackSource};
use addonsync_protocol::packets::{
    PackStackEntry, ResourcePackDataInfoPacket, ResourcePackStackPacket, ResourcePackType,
    ResourcePacksInfoPacket, StartGamePacket,
};
use addonsync_protocol::PacketPipeline;
use addonsync_types::{ContentId, PackVersion};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::ProtocolConfig;
use crate::error::HostError;
use crate::host::ResourcePackManager;

const KEY_EXTENSION: &str = "key";
const KEY_LENGTH: usize = 32;

/// Summary of one loaded package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedPackageInfo {
    pub id: ContentId,
    pub version: PackVersion,
    pub size: u64,
    /// Lowercase hex SHA-256 of the archive.
    pub hash: String,
    pub has_scripts: bool,
}

/// Behavior packages loaded at startup, in stack order.
///
/// Filled once by [`load_all`](Self::load_all) and read-only afterwards.
pub struct ContentPackageRegistry {
    manager: Arc<dyn ResourcePackManager>,
    packages: Vec<Arc<ContentPackage>>,
    by_id: HashMap<ContentId, usize>,
}

impl ContentPackageRegistry {
    pub fn new(manager: Arc<dyn ResourcePackManager>) -> Self {
        Self {
            manager,
            packages: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Loads each archive named in `order` from `base`, then appends the
    /// loaded packages to the host stack and hands over their keys.
    ///
    /// A package that fails to load is logged and skipped. Returns the
    /// number of packages added.
    pub fn load_all<S: AsRef<str>>(&mut self, order: &[S], base: &Path) -> usize {
        let before = self.packages.len();

        for name in order {
            let name = name.as_ref();
            let package = match load_keyed(name, base) {
                Ok(package) => package,
                Err(e) => {
                    error!(package = name, error = %e, "could not load behavior package");
                    continue;
                }
            };

            let id = package.content_id();
            if self.by_id.contains_key(&id) {
                warn!(package = name, content_id = %id, "duplicate content id, skipping");
                continue;
            }
            debug!(
                package = name,
                content_id = %id,
                version = %package.version(),
                has_scripts = package.has_scripts(),
                "loaded behavior package"
            );
            self.by_id.insert(id, self.packages.len());
            self.packages.push(Arc::new(package));
        }

        let added = &self.packages[before..];
        let mut stack = self.manager.resource_stack();
        stack.extend(added.iter().map(|p| Arc::clone(p) as Arc<dyn PackSource>));
        self.manager.set_resource_stack(stack);

        for package in added {
            if let Some(key) = package.encryption_key() {
                self.manager.set_encryption_key(package.content_id(), key);
            }
        }

        info!(
            loaded = added.len(),
            requested = order.len(),
            "behavior packages loaded"
        );
        added.len()
    }

    /// Looks a package up by any textual form of its content id.
    pub fn get(&self, content_id: &str) -> Option<&Arc<ContentPackage>> {
        let id = ContentId::parse(content_id).ok()?;
        self.get_by_id(id)
    }

    pub fn get_by_id(&self, id: ContentId) -> Option<&Arc<ContentPackage>> {
        self.by_id.get(&id).map(|&i| &self.packages[i])
    }

    /// Loaded packages in stack order.
    pub fn packages(&self) -> &[Arc<ContentPackage>] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Whether any loaded package carries a script module.
    pub fn has_scripts(&self) -> bool {
        self.packages.iter().any(|p| p.has_scripts())
    }

    /// Summaries in stack order. Hashes are computed on first request.
    pub fn list_loaded_packages(&self) -> Result<Vec<LoadedPackageInfo>, PackError> {
        self.packages
            .iter()
            .map(|p| {
                Ok(LoadedPackageInfo {
                    id: p.content_id(),
                    version: p.version(),
                    size: p.size(),
                    hash: p.sha256_hex()?,
                    has_scripts: p.has_scripts(),
                })
            })
            .collect()
    }

    /// Installs the session hooks that advertise loaded packages. Nothing is
    /// installed when no package loaded.
    pub fn install_hooks(self: &Arc<Self>, pipeline: &PacketPipeline, protocol: &ProtocolConfig) {
        if self.is_empty() {
            debug!("no behavior packages loaded, pack hooks not installed");
            return;
        }

        let experiments = protocol.experiments.clone();
        pipeline.monitor_typed::<StartGamePacket, _>(move |packet, _| {
            for name in &experiments {
                packet.level_settings.experiments.set(name, true);
            }
            Ok(())
        });

        let registry = Arc::clone(self);
        let advertise_scripts = protocol.advertise_scripts;
        pipeline.monitor_typed::<ResourcePacksInfoPacket, _>(move |packet, _| {
            registry.patch_packs_info(packet, advertise_scripts);
            Ok(())
        });

        let registry = Arc::clone(self);
        pipeline.monitor_typed::<ResourcePackDataInfoPacket, _>(move |packet, _| {
            if registry.get(pack_uuid(&packet.pack_id)).is_some() {
                packet.pack_type = ResourcePackType::Behaviors;
            }
            Ok(())
        });

        let registry = Arc::clone(self);
        pipeline.monitor_typed::<ResourcePackStackPacket, _>(move |packet, _| {
            registry.patch_stack(packet);
            Ok(())
        });

        info!(packages = self.len(), "pack hooks installed");
    }

    fn patch_packs_info(&self, packet: &mut ResourcePacksInfoPacket, advertise_scripts: bool) {
        packet.must_accept = true;
        packet.has_addons = true;
        if advertise_scripts {
            packet.has_scripts = self.has_scripts();
        }
        for entry in &mut packet.entries {
            let package = self
                .get(&entry.content_id)
                .or_else(|| self.get(&entry.pack_id));
            if let Some(package) = package {
                entry.is_addon_pack = true;
                entry.has_scripts = package.has_scripts();
                entry.is_ray_tracing_capable = false;
            }
        }
    }

    fn patch_stack(&self, packet: &mut ResourcePackStackPacket) {
        packet.resource_pack_stack = self
            .manager
            .resource_stack()
            .iter()
            .filter(|p| !self.by_id.contains_key(&p.pack_id()))
            .map(|p| PackStackEntry::new(p.pack_id().to_string(), p.version().to_string()))
            .collect();
        packet.behavior_pack_stack = self
            .packages
            .iter()
            .map(|p| PackStackEntry::new(p.content_id().to_string(), p.version().to_string()))
            .collect();
    }
}

/// Pack ids in transfer packets may carry a `_<version>` suffix.
fn pack_uuid(pack_id: &str) -> &str {
    pack_id.split('_').next().unwrap_or(pack_id)
}

fn load_keyed(name: &str, base: &Path) -> Result<ContentPackage, HostError> {
    let path = base.join(name);
    let package = ContentPackageLoader::load(&path)?;
    match read_key(&key_path(&path))? {
        Some(key) => Ok(package.with_encryption_key(key)),
        None => Ok(package),
    }
}

fn key_path(package: &Path) -> PathBuf {
    let mut name = package.as_os_str().to_owned();
    name.push(".");
    name.push(KEY_EXTENSION);
    PathBuf::from(name)
}

/// Reads an adjacent key file. Trailing line endings are ignored.
fn read_key(path: &Path) -> Result<Option<[u8; KEY_LENGTH]>, HostError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path).map_err(|source| HostError::KeyUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let end = bytes
        .iter()
        .rposition(|b| *b != b'\r' && *b != b'\n')
        .map_or(0, |i| i + 1);
    let key: [u8; KEY_LENGTH] =
        bytes[..end]
            .try_into()
            .map_err(|_| HostError::InvalidKeyLength {
                path: path.to_path_buf(),
                length: end,
            })?;
    Ok(Some(key))
}
