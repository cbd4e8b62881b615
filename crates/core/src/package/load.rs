//! Chunk loading for `require`, `loadfile` and `dofile`.

use std::io::Read;

use mlua::{ChunkMode, Function, Lua, Table};
use thiserror::Error;

use crate::fs::FsError;
use crate::scripting::Environment;

use super::LuaFile;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Failures that happen before the compiler ever sees the source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid file mode {0}")]
    InvalidMode(String),

    #[error("cannot open {name}")]
    Open {
        name: String,
        #[source]
        source: FsError,
    },

    #[error("cannot read {name}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Lua(#[from] mlua::Error),
}

/// Result of handing source to the compiler.
#[derive(Debug)]
pub enum Loaded {
    Chunk(Function),
    /// Syntax or memory error, kept as a value for the caller to inspect.
    CompileError(mlua::Error),
}

impl Loaded {
    /// Turn a compile error into a hard error, keeping successful chunks.
    pub fn into_function(self) -> mlua::Result<Function> {
        match self {
            Loaded::Chunk(f) => Ok(f),
            Loaded::CompileError(e) => Err(e),
        }
    }
}

/// Check a `loadfile` mode argument. Only text chunks are ever accepted.
pub fn check_mode(mode: Option<&str>) -> Result<(), LoadError> {
    match mode {
        None | Some("") | Some("t") | Some("bt") | Some("text") => Ok(()),
        Some(other) => Err(LoadError::InvalidMode(other.to_string())),
    }
}

/// Drop a UTF-8 byte-order mark and a leading `#` line.
///
/// The `#` line is replaced by a bare newline so line numbers in error
/// messages still match the file.
pub fn strip_preamble(source: &[u8]) -> Vec<u8> {
    let source = source.strip_prefix(BOM).unwrap_or(source);
    if source.first() != Some(&b'#') {
        return source.to_vec();
    }
    let rest = match source.iter().position(|&b| b == b'\n') {
        Some(i) => &source[i + 1..],
        None => &[],
    };
    let mut out = Vec::with_capacity(rest.len() + 1);
    out.push(b'\n');
    out.extend_from_slice(rest);
    out
}

/// Compile `source` as a text chunk named `chunk_name`.
pub fn compile(
    lua: &Lua,
    chunk_name: &str,
    source: &[u8],
    env: Option<Table>,
) -> Result<Loaded, LoadError> {
    let source = strip_preamble(source);
    let mut chunk = lua.load(source).set_name(chunk_name).set_mode(ChunkMode::Text);
    if let Some(env) = env {
        chunk = chunk.set_environment(env);
    }
    match chunk.into_function() {
        Ok(f) => Ok(Loaded::Chunk(f)),
        Err(e @ (mlua::Error::SyntaxError { .. } | mlua::Error::MemoryError(_))) => {
            Ok(Loaded::CompileError(e))
        }
        Err(e) => Err(LoadError::Lua(e)),
    }
}

/// Compile an in-memory [`LuaFile`].
pub fn compile_lua_file(lua: &Lua, file: &LuaFile) -> Result<Loaded, LoadError> {
    compile(lua, &format!("@{}", file.name), file.code.as_bytes(), None)
}

/// Load a file through the environment's filesystem.
///
/// `None` or an empty name reads the environment's input stream instead.
/// Every reader opened here is closed before returning; the input stream
/// belongs to the host and is left open.
pub fn load_file(
    lua: &Lua,
    env: &Environment,
    file_name: Option<&str>,
    mode: Option<&str>,
    chunk_env: Option<Table>,
) -> Result<Loaded, LoadError> {
    check_mode(mode)?;

    let mut source = Vec::new();
    let chunk_name = match file_name.filter(|f| !f.is_empty()) {
        None => {
            let mut input = env.input.borrow_mut();
            input
                .read_to_end(&mut source)
                .map_err(|e| LoadError::Read { name: "stdin".to_string(), source: e })?;
            "=stdin".to_string()
        }
        Some(name) => {
            let mut reader = env
                .fs
                .get_reader(name)
                .map_err(|e| LoadError::Open { name: name.to_string(), source: e })?;
            reader
                .read_to_end(&mut source)
                .map_err(|e| LoadError::Read { name: name.to_string(), source: e })?;
            format!("@{name}")
        }
    };

    compile(lua, &chunk_name, &source, chunk_env)
}
