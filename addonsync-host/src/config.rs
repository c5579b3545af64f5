//! Addon configuration, read from `addons.toml` in the packs directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "addons.toml";

/// Which packages to load and in what order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonsConfig {
    /// Archive file names relative to the packs directory, in stack order.
    #[serde(default)]
    pub behavior_stack: Vec<String>,
}

/// Tweaks applied to outgoing session packets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Experiments switched on in the game start packet.
    #[serde(default = "default_experiments")]
    pub experiments: Vec<String>,
    /// Whether the pack info packet tells clients that scripts are present.
    #[serde(default)]
    pub advertise_scripts: bool,
}

fn default_experiments() -> Vec<String> {
    vec!["gametest".to_string()]
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            experiments: default_experiments(),
            advertise_scripts: false,
        }
    }
}

/// Parsed `addons.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonConfig {
    #[serde(default)]
    pub addons: AddonsConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

impl AddonConfig {
    /// Reads `addons.toml` from `dir`, creating the directory and a default
    /// file first when they are missing.
    pub fn load_or_init(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        if dir.exists() && !dir.is_dir() {
            return Err(ConfigError::NotADirectory(dir.to_path_buf()));
        }
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            let text = toml::to_string_pretty(&Self::default())?;
            std::fs::write(&path, text).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "wrote default addon config");
        }

        Self::load_from(&path)
    }

    /// Reads and parses an explicit config file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(path),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_sections_take_defaults() {
        let config = AddonConfig::parse("", Path::new(CONFIG_FILE)).unwrap();
        assert_eq!(config, AddonConfig::default());
        assert_eq!(config.protocol.experiments, vec!["gametest".to_string()]);
        assert!(!config.protocol.advertise_scripts);
    }

    #[test]
    fn parses_full_file() {
        let text = r#"
            [addons]
            behavior_stack = ["a.mcpack", "b.zip"]

            [protocol]
            experiments = ["gametest", "upcoming_creator_features"]
            advertise_scripts = true
        "#;
        let config = AddonConfig::parse(text, Path::new(CONFIG_FILE)).unwrap();
        assert_eq!(config.addons.behavior_stack, vec!["a.mcpack", "b.zip"]);
        assert_eq!(config.protocol.experiments.len(), 2);
        assert!(config.protocol.advertise_scripts);
    }

    #[test]
    fn non_string_stack_entry_is_rejected() {
        let err = AddonConfig::parse("[addons]\nbehavior_stack = [12]\n", Path::new(CONFIG_FILE))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn default_file_round_trips() {
        let text = toml::to_string_pretty(&AddonConfig::default()).unwrap();
        let parsed = AddonConfig::parse(&text, Path::new(CONFIG_FILE)).unwrap();
        assert_eq!(parsed, AddonConfig::default());
    }
}
