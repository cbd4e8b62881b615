//! Build an [`Environment`] for running scripts on the local machine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, io};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::ResolvedConfig;
use crate::fs::{Filesystem, LocalFs, ReadOnlyFs, Vfs};
use crate::logging::TracingLog;
use crate::package::{LuaFile, PackageConfig};
use crate::scripting::Environment;

const LUA_EXT: &str = "lua";

#[derive(Debug, Error)]
pub enum LocalEnvError {
    #[error("sandbox root does not exist: {0}")]
    MissingRoot(String),

    #[error("failed to walk library directory {0}: {1}")]
    WalkError(String, #[source] walkdir::Error),

    #[error("failed to read {0}: {1}")]
    ReadError(String, #[source] io::Error),
}

/// Environment over the configured root and mounts, wired to the process
/// stdin, stdout and environment variables.
pub fn local_environment(
    cfg: &ResolvedConfig,
    args: Vec<String>,
) -> Result<Environment, LocalEnvError> {
    let vfs = build_vfs(cfg)?;

    let pre_init = match &cfg.init_dir {
        Some(dir) => pre_init_scripts(dir)?,
        None => Vec::new(),
    };
    let lua_libs = match &cfg.lib_dir {
        Some(dir) => lua_libraries(dir)?,
        None => BTreeMap::new(),
    };

    let package = PackageConfig {
        path: cfg.search_path.clone(),
        ignore_env: cfg.ignore_env,
        ..PackageConfig::default()
    };

    let mut env = Environment::new(Arc::new(vfs))
        .with_input(io::stdin())
        .with_output(io::stdout())
        .with_log(Arc::new(TracingLog::new()))
        .with_env(process_env())
        .with_args(args)
        .with_package(package);
    env.lua_libs = lua_libs;
    env.pre_init = pre_init;
    Ok(env)
}

/// The router for `cfg`: the root directory plus one backend per mount.
pub fn build_vfs(cfg: &ResolvedConfig) -> Result<Vfs, LocalEnvError> {
    if !cfg.root.is_dir() {
        return Err(LocalEnvError::MissingRoot(cfg.root.display().to_string()));
    }
    let mut vfs = Vfs::new(LocalFs::new(&cfg.root));
    for mount in &cfg.mounts {
        let local = LocalFs::new(&mount.path);
        let backend: Arc<dyn Filesystem> =
            if mount.read_only { Arc::new(ReadOnlyFs::new(local)) } else { Arc::new(local) };
        debug!(prefix = %mount.prefix, path = %mount.path.display(), read_only = mount.read_only, "mount");
        vfs.mount(mount.prefix.clone(), backend);
    }
    Ok(vfs)
}

/// `*.lua` files directly under `dir`, sorted by file name.
///
/// A missing directory yields nothing. Unreadable files are logged and
/// skipped.
pub fn pre_init_scripts(dir: &Path) -> Result<Vec<LuaFile>, LocalEnvError> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "no init directory");
        return Ok(Vec::new());
    }
    let entries =
        fs::read_dir(dir).map_err(|e| LocalEnvError::ReadError(dir.display().to_string(), e))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_lua_ext(p))
        .collect();
    paths.sort();

    let mut scripts = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        match fs::read_to_string(&path) {
            Ok(code) => scripts.push(LuaFile::new(name, code)),
            Err(e) => warn!(script = %path.display(), error = %e, "skipping unreadable init script"),
        }
    }
    Ok(scripts)
}

/// Every `*.lua` file below `dir`, keyed by module name: the relative path
/// without extension, with directory separators turned into `.`.
pub fn lua_libraries(dir: &Path) -> Result<BTreeMap<String, LuaFile>, LocalEnvError> {
    let mut libs = BTreeMap::new();
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "no library directory");
        return Ok(libs);
    }

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry =
            entry.map_err(|e| LocalEnvError::WalkError(dir.display().to_string(), e))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !has_lua_ext(path) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(dir) else { continue };
        let code = fs::read_to_string(path)
            .map_err(|e| LocalEnvError::ReadError(path.display().to_string(), e))?;

        let module = module_name(relative);
        let file_name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        libs.insert(module, LuaFile::new(file_name, code));
    }
    Ok(libs)
}

fn module_name(relative: &Path) -> String {
    relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join(".")
}

fn has_lua_ext(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == LUA_EXT)
}

fn process_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
        .collect()
}
