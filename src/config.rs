// Configuration file loading

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::inventory::ParseOptions;
use crate::output::{DrinvError, OutputFormat};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "drinv.yaml";

/// drinv configuration
///
/// ```yaml
/// inventory: ansible/inventory
/// single_group: true
/// output_format: json
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Inventory file used when a command is not given one
    pub inventory: Option<PathBuf>,
    /// Files hold exactly one group; a second header is an error
    pub single_group: bool,
    /// Default output format for reports
    pub output_format: OutputFormat,
}

impl Config {
    /// Load a configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, DrinvError> {
        let content = std::fs::read_to_string(path).map_err(|e| DrinvError::Config {
            message: format!("Failed to read config file: {}", e),
            path: Some(path.to_path_buf()),
        })?;

        let config = Self::from_yaml(&content).map_err(|e| match e {
            DrinvError::Config { message, .. } => DrinvError::Config {
                message,
                path: Some(path.to_path_buf()),
            },
            other => other,
        })?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse a configuration from YAML text. Empty text yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, DrinvError> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(content).map_err(|e| DrinvError::Config {
            message: format!("Invalid config YAML: {}", e),
            path: None,
        })
    }

    /// Load `explicit` if given (it must exist), otherwise `drinv.yaml` from
    /// the working directory if present, otherwise the defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, DrinvError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            return Self::from_file(default_path);
        }

        Ok(Config::default())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::new().single_group(self.single_group)
    }

    /// Pick the inventory path: the command-line value wins over the config
    pub fn resolve_inventory(&self, cli: Option<PathBuf>) -> Result<PathBuf, DrinvError> {
        cli.or_else(|| self.inventory.clone())
            .ok_or_else(|| DrinvError::Inventory {
                message: "No inventory file given".to_string(),
                suggestion: Some(format!(
                    "Pass --inventory or set 'inventory' in {}",
                    DEFAULT_CONFIG_FILE
                )),
            })
    }
}
