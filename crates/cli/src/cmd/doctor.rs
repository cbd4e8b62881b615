use luabox_core::config::loader::{ConfigLoader, default_config_path};
use luabox_core::doctor_stub;
use std::path::Path;

pub fn run(config: Option<&Path>, profile: Option<&str>) {
    match ConfigLoader::load(config, profile) {
        Ok(rc) => {
            if let Err(e) = crate::logging::init(&rc) {
                eprintln!("warning: logging disabled: {e}");
            }
            tracing::debug!(profile = %rc.active_profile, "config loaded");

            println!("OK   luabox doctor");
            println!("{}", doctor_stub());
            println!(
                "path: {}",
                config.map_or_else(
                    || default_config_path().display().to_string(),
                    |p| p.display().to_string()
                )
            );
            println!("profile: {}", rc.active_profile);
            println!("root: {}{}", rc.root.display(), missing_marker(&rc.root));
            if let Some(dir) = &rc.init_dir {
                println!("init_dir: {}{}", dir.display(), missing_marker(dir));
            }
            if let Some(dir) = &rc.lib_dir {
                println!("lib_dir: {}{}", dir.display(), missing_marker(dir));
            }
            match &rc.search_path {
                Some(p) => println!("search_path: {p}"),
                None if rc.ignore_env => println!("search_path: (default)"),
                None => println!("search_path: (from LUA_PATH)"),
            }
            for m in &rc.mounts {
                let mode = if m.read_only { "ro" } else { "rw" };
                println!(
                    "mount {}: {} ({mode}){}",
                    m.prefix,
                    m.path.display(),
                    missing_marker(&m.path)
                );
            }
        }
        Err(e) => {
            println!("FAIL luabox doctor");
            println!("{e}");
            if config.is_none() {
                println!("looked for: {}", default_config_path().display());
            }
            std::process::exit(1);
        }
    }
}

fn missing_marker(path: &Path) -> &'static str {
    if path.is_dir() { "" } else { "  [missing]" }
}
