//! Module resolution: the `package` table, `require` and the searchers
//! behind it.
//!
//! Nothing here touches the host disk directly. Every file lookup goes
//! through the [`Filesystem`](crate::fs::Filesystem) bound to the sandbox
//! [`Environment`], usually a [`Vfs`](crate::fs::Vfs).
//!
//! # Lua surface
//!
//! - `require(name)` - resolve, evaluate once, cache in `package.loaded`
//! - `package.path` - `;`-separated templates used by the path searcher
//! - `package.searchpath(name, path, sep?, rep?)` - path lookup on its own
//! - `package.loaded`, `package.preload`, `package.config`, `package.loadlib`

pub mod load;
pub mod require;
pub mod search_path;
pub mod searchers;

use std::rc::Rc;
use std::sync::Arc;

use mlua::{Lua, Table, Value, Variadic};

use crate::scripting::Environment;

pub use load::{LoadError, Loaded};
pub use require::Resolver;
pub use search_path::{DEFAULT_PATH, PATH_VAR, PackageConfig};
pub use searchers::{SearchOutcome, Searcher};

/// Registry key of the loaded-module cache.
pub const LOADED_KEY: &str = "_LOADED";

/// Registry key of the preload table.
pub const PRELOAD_KEY: &str = "_PRELOAD";

/// Value of `package.config`: directory separator, template separator,
/// substitution mark, executable-dir mark, ignore mark.
pub const PACKAGE_CONFIG: &str = "/\n;\n?\n!\n-\n";

const LOADLIB_MESSAGE: &str = "dynamic libraries not enabled; check your Lua installation";

/// A loadable unit of Lua source, independent of where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuaFile {
    pub name: String,
    pub code: String,
}

impl LuaFile {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self { name: name.into(), code: code.into() }
    }
}

/// The loaded-module cache, created on first use.
pub fn loaded_table(lua: &Lua) -> mlua::Result<Table> {
    registry_table(lua, LOADED_KEY)
}

/// The preload table, created on first use.
pub fn preload_table(lua: &Lua) -> mlua::Result<Table> {
    registry_table(lua, PRELOAD_KEY)
}

fn registry_table(lua: &Lua, key: &str) -> mlua::Result<Table> {
    if let Some(table) = lua.named_registry_value::<Option<Table>>(key)? {
        return Ok(table);
    }
    let table = lua.create_table()?;
    lua.set_named_registry_value(key, table.clone())?;
    Ok(table)
}

/// Install the `package` table and the global `require`.
///
/// The searcher chain is built here, once, and owned by the `require`
/// closure. Returns the `package` table.
pub fn install(lua: &Lua, env: &Rc<Environment>) -> mlua::Result<Table> {
    let package = lua.create_table()?;
    let loaded = loaded_table(lua)?;

    package.set("path", env.package.search_path())?;
    package.set("config", PACKAGE_CONFIG)?;
    package.set("loaded", loaded.clone())?;
    package.set("preload", preload_table(lua)?)?;

    let fs = Arc::clone(&env.fs);
    package.set(
        "searchpath",
        lua.create_function(
            move |lua, (name, path, sep, rep): (String, String, Option<String>, Option<String>)| {
                let sep = sep.unwrap_or_else(|| ".".to_string());
                let rep = rep.unwrap_or_else(|| "/".to_string());
                let mut ret = Variadic::new();
                match search_path::search_path(fs.as_ref(), &name, &path, &sep, &rep) {
                    Ok(found) => ret.push(Value::String(lua.create_string(found)?)),
                    Err(msg) => {
                        ret.push(Value::Nil);
                        ret.push(Value::String(lua.create_string(msg)?));
                    }
                }
                Ok(ret)
            },
        )?,
    )?;

    package.set(
        "loadlib",
        lua.create_function(|_, (_path, _init): (String, String)| {
            Ok((Value::Nil, LOADLIB_MESSAGE, "absent"))
        })?,
    )?;

    let resolver = Resolver::new(searchers::default_searchers(env, &package));
    lua.globals().set(
        "require",
        lua.create_function(move |lua, name: String| resolver.require(lua, &name))?,
    )?;

    loaded.set("package", package.clone())?;
    lua.globals().set("package", package.clone())?;
    Ok(package)
}
