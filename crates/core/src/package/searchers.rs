//! The searcher chain consulted by `require`.

use std::collections::BTreeMap;
use std::io::Read;
use std::rc::Rc;
use std::sync::Arc;

use mlua::{Function, Lua, Table, Value};

use crate::fs::Filesystem;
use crate::scripting::Environment;

use super::load::{self, LoadError, Loaded};
use super::search_path::search_path;
use super::{LuaFile, preload_table};

/// Result of asking one searcher for a module.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Not handled here. Carries the diagnostic fragment for the final error.
    NotFound(String),
    /// A loader to call with `(name, label)`.
    Found { loader: Function, label: String },
}

/// One resolution strategy.
pub trait Searcher {
    fn name(&self) -> &str;

    /// Look `module` up. An `Err` aborts the whole `require`.
    fn search(&self, lua: &Lua, module: &str) -> mlua::Result<SearchOutcome>;
}

/// Builds the fixed chain: preload, library bundle, then `package.path`.
pub fn default_searchers(env: &Rc<Environment>, package: &Table) -> Vec<Box<dyn Searcher>> {
    vec![
        Box::new(PreloadSearcher),
        Box::new(LibrarySearcher { env: Rc::clone(env) }),
        Box::new(PathSearcher { fs: Arc::clone(&env.fs), package: package.clone() }),
    ]
}

/// Looks in `package.preload`.
#[derive(Debug, Default)]
pub struct PreloadSearcher;

impl Searcher for PreloadSearcher {
    fn name(&self) -> &str {
        "preload"
    }

    fn search(&self, lua: &Lua, module: &str) -> mlua::Result<SearchOutcome> {
        match preload_table(lua)?.get::<Value>(module)? {
            Value::Function(loader) => {
                Ok(SearchOutcome::Found { loader, label: ":preload:".to_string() })
            }
            Value::Nil => Ok(SearchOutcome::NotFound(format!(
                "\n\tno field package.preload['{module}']"
            ))),
            other => Err(mlua::Error::runtime(format!(
                "package.preload['{module}'] must be a function, got {}",
                other.type_name()
            ))),
        }
    }
}

/// Looks in the Lua library bundle of the environment.
pub struct LibrarySearcher {
    env: Rc<Environment>,
}

impl LibrarySearcher {
    fn libs(&self) -> &BTreeMap<String, LuaFile> {
        &self.env.lua_libs
    }
}

impl Searcher for LibrarySearcher {
    fn name(&self) -> &str {
        "library"
    }

    fn search(&self, lua: &Lua, module: &str) -> mlua::Result<SearchOutcome> {
        let Some(file) = self.libs().get(module) else {
            return Ok(SearchOutcome::NotFound(format!("\n\tno library '{module}'")));
        };
        let loaded = load::compile_lua_file(lua, file);
        found(module, &file.name, loaded)
    }
}

/// Walks `package.path` through the environment filesystem.
pub struct PathSearcher {
    fs: Arc<dyn Filesystem>,
    package: Table,
}

impl Searcher for PathSearcher {
    fn name(&self) -> &str {
        "path"
    }

    fn search(&self, lua: &Lua, module: &str) -> mlua::Result<SearchOutcome> {
        let path = match self.package.get::<Value>("path")? {
            Value::String(s) => s.to_str()?.to_string(),
            _ => return Err(mlua::Error::runtime("'package.path' must be a string")),
        };
        let file_name = match search_path(self.fs.as_ref(), module, &path, ".", "/") {
            Ok(f) => f,
            Err(msg) => return Ok(SearchOutcome::NotFound(msg)),
        };
        let loaded = read_file(self.fs.as_ref(), &file_name)
            .and_then(|source| load::compile(lua, &format!("@{file_name}"), &source, None));
        found(module, &file_name, loaded)
    }
}

fn read_file(fs: &dyn Filesystem, name: &str) -> Result<Vec<u8>, LoadError> {
    let mut reader = fs
        .get_reader(name)
        .map_err(|e| LoadError::Open { name: name.to_string(), source: e })?;
    let mut source = Vec::new();
    reader
        .read_to_end(&mut source)
        .map_err(|e| LoadError::Read { name: name.to_string(), source: e })?;
    Ok(source)
}

fn found(
    module: &str,
    file_name: &str,
    loaded: Result<Loaded, LoadError>,
) -> mlua::Result<SearchOutcome> {
    let reason = match loaded {
        Ok(Loaded::Chunk(loader)) => {
            return Ok(SearchOutcome::Found { loader, label: file_name.to_string() });
        }
        Ok(Loaded::CompileError(e)) => e.to_string(),
        Err(e) => e.to_string(),
    };
    Err(mlua::Error::runtime(format!(
        "error loading module '{module}' from file '{file_name}':\n\t{reason}"
    )))
}
