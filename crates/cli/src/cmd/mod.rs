pub mod doctor;
pub mod ls;
pub mod run;

use color_eyre::eyre::{Result, eyre};
use luabox_core::config::{ConfigLoader, ResolvedConfig};
use std::path::Path;

/// Load the config and start logging from it.
fn load(config: Option<&Path>, profile: Option<&str>) -> Result<ResolvedConfig> {
    let cfg = ConfigLoader::load(config, profile).map_err(|e| {
        eyre!("Configuration error: {e}\nRun 'luabox doctor' to diagnose.")
    })?;
    crate::logging::init(&cfg)?;
    Ok(cfg)
}
