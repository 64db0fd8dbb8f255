//! Logger configuration documents.
//!
//! ```text
//! config file (JSON or TOML)
//!     → Config (log_level + driver specs)
//!     → DriverRegistry (type tag → constructor)
//!     → Dispatcher with every known driver registered
//! ```

mod registry;
mod settings;

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{errors::ConfigurationError, logging::Dispatcher, logging::Severity};

pub use registry::{DriverConstructor, DriverRegistry};
pub use settings::{DriverSettings, Settings, DEFAULT_TIMEOUT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub drivers: Vec<DriverSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub settings: Settings,
}

fn default_log_level() -> String {
    Severity::Debug.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            drivers: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(text).map_err(|err| ConfigurationError::Parse(err.to_string()))
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(text).map_err(|err| ConfigurationError::Parse(err.to_string()))
    }

    /// Reads a document from disk; `.toml` files are parsed as TOML and
    /// anything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml(&text),
            _ => Self::from_json(&text),
        }
    }

    pub fn level(&self) -> Result<Severity, ConfigurationError> {
        Ok(self.log_level.parse()?)
    }

    /// Builds a dispatcher using the built-in drivers.
    pub fn initialize(&self) -> Result<Dispatcher, ConfigurationError> {
        DriverRegistry::with_builtin().initialize(self)
    }
}

#[cfg(not(target_os = "windows"))]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(target_os = "windows")]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

/// `$TELEMETRY_CONFIG`, else `telemetry/config.json` under the XDG config
/// directory.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("TELEMETRY_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|home| home.join(".config")))?;

    Some(config_dir.join("telemetry").join("config.json"))
}
