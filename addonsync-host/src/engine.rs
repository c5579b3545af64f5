//! Startup wiring: config, packages, properties and hooks in one place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use addonsync_properties::{PropertySchemaRegistry, PropertySyncState};
use addonsync_protocol::PacketPipeline;
use tracing::{info, warn};

use crate::config::AddonConfig;
use crate::error::HostError;
use crate::host::{EntityDirectory, ResourcePackManager};
use crate::properties::EntityProperties;
use crate::registry::ContentPackageRegistry;
use crate::task::{Task, TaskOutput, TaskPool};

/// Everything addonsync installs into a server, built once at startup.
pub struct AddonEngine {
    packs_dir: PathBuf,
    config: AddonConfig,
    pipeline: Arc<PacketPipeline>,
    packages: Arc<ContentPackageRegistry>,
    properties: Arc<EntityProperties>,
}

impl AddonEngine {
    /// Reads `addons.toml` from `packs_dir` (creating it if missing) and
    /// starts with that configuration.
    pub fn start(
        packs_dir: impl AsRef<Path>,
        manager: Arc<dyn ResourcePackManager>,
        directory: Arc<dyn EntityDirectory>,
    ) -> Result<Self, HostError> {
        let config = AddonConfig::load_or_init(packs_dir.as_ref())?;
        Ok(Self::with_config(config, packs_dir, manager, directory))
    }

    /// Loads the configured packages, registers the properties their
    /// entity definitions declare, and installs every hook.
    pub fn with_config(
        config: AddonConfig,
        packs_dir: impl AsRef<Path>,
        manager: Arc<dyn ResourcePackManager>,
        directory: Arc<dyn EntityDirectory>,
    ) -> Self {
        let packs_dir = packs_dir.as_ref().to_path_buf();
        let pipeline = Arc::new(PacketPipeline::new());

        let mut registry = ContentPackageRegistry::new(manager);
        registry.load_all(&config.addons.behavior_stack, &packs_dir);
        let packages = Arc::new(registry);
        packages.install_hooks(&pipeline, &config.protocol);

        let schema = Arc::new(PropertySchemaRegistry::new());
        let state = Arc::new(PropertySyncState::new(schema));
        let properties = Arc::new(EntityProperties::new(state, directory));
        let declared: usize = packages
            .packages()
            .iter()
            .flat_map(|p| p.entities())
            .map(|definition| properties.register_definition(definition))
            .sum();
        properties.install_hooks(&pipeline);

        info!(
            packs_dir = %packs_dir.display(),
            packages = packages.len(),
            declared_properties = declared,
            "addon engine started"
        );

        Self {
            packs_dir,
            config,
            pipeline,
            packages,
            properties,
        }
    }

    pub fn packs_dir(&self) -> &Path {
        &self.packs_dir
    }

    pub fn config(&self) -> &AddonConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<PacketPipeline> {
        &self.pipeline
    }

    pub fn packages(&self) -> &Arc<ContentPackageRegistry> {
        &self.packages
    }

    pub fn properties(&self) -> &Arc<EntityProperties> {
        &self.properties
    }

    /// Hashes every loaded package on the pool so the first client
    /// download does not pay for it. Returns how many succeeded.
    pub async fn warm_hashes(&self, pool: &TaskPool) -> usize {
        let pending: Vec<_> = self
            .packages
            .packages()
            .iter()
            .map(|p| pool.submit(Task::HashPackage(Arc::clone(p))))
            .collect();

        let mut warmed = 0;
        for promise in pending {
            match promise.settled().await {
                Ok(output) => {
                    if let TaskOutput::Hashed { content_id, sha256 } = &*output {
                        info!(%content_id, sha256 = %hex::encode(sha256), "package hash ready");
                        warmed += 1;
                    }
                }
                Err(e) => warn!(error = %e, "package hash failed"),
            }
        }
        warmed
    }
}
