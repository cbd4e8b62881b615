//! `luabox run`: execute one script in a local sandbox.

use color_eyre::eyre::{Result, WrapErr, eyre};
use luabox_core::localenv::local_environment;
use luabox_core::scripting::LuaSandbox;
use std::path::Path;
use tracing::debug;

pub fn run(
    config: Option<&Path>,
    profile: Option<&str>,
    script: &str,
    args: Vec<String>,
) -> Result<()> {
    let cfg = super::load(config, profile)?;

    let env = local_environment(&cfg, args.clone())
        .wrap_err("failed to prepare the sandbox environment")?;
    // mlua errors are not Send, so they are rendered rather than wrapped.
    let sandbox =
        LuaSandbox::new(env).map_err(|e| eyre!("failed to start the sandbox: {e}"))?;

    debug!(script, skipped_init = sandbox.preinit_failures().len(), "running");
    sandbox.do_file(script, &args).map_err(|e| eyre!("{script}: {e}"))?;
    Ok(())
}
