//! Versioned, profile based TOML configuration.

pub mod loader;
pub mod types;

pub use loader::{ConfigError, ConfigLoader, default_config_path};
pub use types::{ConfigFile, LoggingConfig, MountConfig, Profile, ResolvedConfig, ResolvedMount};
