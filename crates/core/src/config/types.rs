use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub version: u32,
    pub profile: Option<String>,
    pub profiles: HashMap<String, Profile>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    /// Directory backing the root of the virtual filesystem.
    pub root: String,
    /// Directory of `*.lua` scripts run before any user code, by file name.
    pub init_dir: Option<String>,
    /// Directory of Lua modules reachable through `require`.
    pub lib_dir: Option<String>,
    /// Overrides `LUA_PATH` when set.
    pub search_path: Option<String>,
    #[serde(default)]
    pub ignore_env: bool,
    /// Extra backends keyed by the first path segment they answer to.
    #[serde(default)]
    pub mounts: BTreeMap<String, MountConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MountConfig {
    pub path: String,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMount {
    pub prefix: String,
    pub path: PathBuf,
    pub read_only: bool,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub active_profile: String,
    pub root: PathBuf,
    pub init_dir: Option<PathBuf>,
    pub lib_dir: Option<PathBuf>,
    pub search_path: Option<String>,
    pub ignore_env: bool,
    /// Sorted by prefix.
    pub mounts: Vec<ResolvedMount>,
    pub logging: LoggingConfig,
}
