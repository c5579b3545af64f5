//! Server-side glue for addonsync.
//!
//! [`AddonEngine`] is built once at startup. It reads `addons.toml`,
//! loads the configured behavior packages through
//! [`ContentPackageRegistry`], registers the entity properties those
//! packages declare with [`EntityProperties`], and installs the packet
//! hooks that advertise both to every session.
//!
//! The server supplies its resource stack and entity world through the
//! [`ResourcePackManager`] and [`EntityDirectory`] traits.

mod config;
mod engine;
mod error;
mod host;
mod properties;
mod registry;
mod task;

pub use config::{AddonConfig, AddonsConfig, ProtocolConfig, CONFIG_FILE};
pub use engine::AddonEngine;
pub use error::{ConfigError, HostError, TaskError, TaskFailure};
pub use host::{EntityDirectory, InMemoryPackManager, ResourcePackManager};
pub use properties::EntityProperties;
pub use registry::{ContentPackageRegistry, LoadedPackageInfo};
pub use task::{promise, Promise, Resolver, Task, TaskOutput, TaskPool};
