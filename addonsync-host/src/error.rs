//! Error types for the host crate.

use std::path::PathBuf;

use addonsync_pack::PackError;
use addonsync_properties::PropertyError;
use addonsync_types::RuntimeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("package error: {0}")]
    Pack(#[from] PackError),

    #[error("property error: {0}")]
    Property(#[from] PropertyError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("could not read encryption key file {}: {source}", path.display())]
    KeyUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid encryption key length in {}: {length} bytes, must be exactly 32", path.display())]
    InvalidKeyLength { path: PathBuf, length: usize },

    #[error("entity {0} is not known to the host")]
    UnknownEntity(RuntimeId),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("packs path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("malformed {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("promise has already been settled")]
    AlreadySettled,

    #[error("no async runtime is available for the task pool")]
    NoRuntime,
}

/// Why a background task did not produce its output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TaskFailure {
    pub message: String,
}

impl TaskFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(err: &HostError) -> &'static str {
        match err {
            HostError::Pack(_) => "pack",
            HostError::Property(_) => "property",
            HostError::Config(_) => "config",
            HostError::KeyUnreadable { .. } => "key",
            HostError::InvalidKeyLength { .. } => "key",
            HostError::UnknownEntity(_) => "entity",
        }
    }

    #[test]
    fn host_errors_come_from_package_property_and_config_failures() {
        let pack: HostError = PackError::ManifestNotFound.into();
        let config: HostError = ConfigError::NotADirectory(PathBuf::from("packs")).into();
        let property: HostError = PropertyError::UnknownProperty {
            entity_type: addonsync_types::EntityTypeId::player(),
            name: "demo:x".into(),
        }
        .into();

        assert_eq!(label(&pack), "pack");
        assert_eq!(label(&config), "config");
        assert_eq!(label(&property), "property");
        assert_eq!(label(&HostError::UnknownEntity(RuntimeId(3))), "entity");
        assert!(config.to_string().contains("packs"));
    }
}
