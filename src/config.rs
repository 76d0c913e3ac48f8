//! Tool configuration.
//!
//! Settings load from a TOML file in the OS config directory via `confy`
//! (created with defaults on first run) and can be overridden per invocation
//! from the command line. The scan cache lives in the OS cache directory.

use std::path::PathBuf;

use directories::ProjectDirs;
use error_set::error_set;
use serde::{Deserialize, Serialize};
use tracing::debug;

error_set! {
    /// Errors before any command can run
    ConfigError := {
        #[display("unable to load configuration: {message}")]
        LoadFailed { message: String },
        #[display("no cache directory available on this platform")]
        CacheDirUnavailable,
    }
}

pub const APP_NAME: &str = "snaphist";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How many days of snapshots a scan considers; 0 disables the window
    #[serde(default)]
    pub days_to_scan: u32,

    /// Unchanged lines kept around each change before chunks split
    #[serde(default)]
    pub context_size: usize,

    /// Snapshot container names probed while walking up from the file
    #[serde(default)]
    pub snapshot_dirs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            days_to_scan: 7,
            context_size: 5,
            snapshot_dirs: vec![".zfs/snapshot".to_string(), ".snapshots".to_string()],
        }
    }
}

impl Config {
    /// Load from the OS config directory, creating a default file on first run
    pub fn load() -> Result<Self, ConfigError> {
        let config: Config = confy::load(APP_NAME, None).map_err(|e| ConfigError::LoadFailed {
            message: e.to_string(),
        })?;
        debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// Location of the serialized scan cache
    pub fn cache_file() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("", "", APP_NAME).ok_or(ConfigError::CacheDirUnavailable)?;
        Ok(dirs.cache_dir().join("last-scan.json"))
    }
}
