//! Sandbox construction and the embedder-facing API.

use std::rc::Rc;

use mlua::{ChunkMode, Function, Lua, LuaOptions, MultiValue, StdLib, Value};
use tracing::debug;

use crate::logging::Fields;
use crate::marshal::{HostValue, pull_table};
use crate::package::{self, load, loaded_table};

use super::bindings::register_luabox_table;
use super::environment::Environment;
use super::globals::register_globals;
use super::types::{PreInitFailure, ScriptingError};

/// A Lua runtime bound to one [`Environment`].
///
/// Scripts get `table`, `string`, `utf8`, `math`, the base functions,
/// `require`/`package` and the `luabox` table. There is no `io`, `os` or
/// `debug`, and files are only reachable through the environment
/// filesystem.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use luabox_core::fs::MemoryFs;
/// use luabox_core::scripting::{Environment, LuaSandbox};
///
/// let fs = MemoryFs::new().with_file("greet.lua", "return 'hi ' .. ...").unwrap();
/// let sandbox = LuaSandbox::new(Environment::new(Arc::new(fs))).unwrap();
/// let out = sandbox.eval_string(r#"return require("greet")"#).unwrap();
/// assert_eq!(out, "hi greet");
/// ```
pub struct LuaSandbox {
    lua: Lua,
    env: Rc<Environment>,
    preinit_failures: Vec<PreInitFailure>,
}

impl LuaSandbox {
    /// Build the runtime and run the pre-init scripts.
    ///
    /// Order: base globals, sandboxed overrides, `package`/`require`,
    /// `luabox`, host libraries, then pre-init scripts in list order. A
    /// failing pre-init script is logged and recorded; the next one still
    /// runs.
    pub fn new(env: Environment) -> Result<Self, ScriptingError> {
        let libs = StdLib::TABLE | StdLib::STRING | StdLib::UTF8 | StdLib::MATH;
        let lua = Lua::new_with(libs, LuaOptions::default())?;
        let env = Rc::new(env);

        register_globals(&lua, &env)?;
        Self::apply_sandbox(&lua)?;
        package::install(&lua, &env)?;

        let loaded = loaded_table(&lua)?;
        loaded.set("luabox", register_luabox_table(&lua, &env)?)?;

        for lib in &env.host_libs {
            let table = (lib.open)(&lua, &env)?;
            lua.globals().set(lib.name.as_str(), table.clone())?;
            loaded.set(lib.name.as_str(), table)?;
            debug!(library = %lib.name, "host library installed");
        }

        let mut sandbox = Self { lua, env, preinit_failures: Vec::new() };
        sandbox.run_pre_init();
        Ok(sandbox)
    }

    fn run_pre_init(&mut self) {
        let env = Rc::clone(&self.env);
        for script in &env.pre_init {
            let result = load::compile_lua_file(&self.lua, script)
                .map_err(|e| e.to_string())
                .and_then(|loaded| loaded.into_function().map_err(|e| e.to_string()))
                .and_then(|f| f.call::<()>(()).map_err(|e| e.to_string()));

            if let Err(error) = result {
                let mut fields = Fields::new();
                fields.insert("script".to_string(), HostValue::from(script.name.as_str()));
                fields.insert("error".to_string(), HostValue::from(error.as_str()));
                env.log.error("loading preinit", &fields);
                self.preinit_failures.push(PreInitFailure { script: script.name.clone(), error });
            }
        }
    }

    /// Run a chunk for its side effects.
    pub fn exec(&self, chunk_name: &str, code: &str) -> Result<(), ScriptingError> {
        self.chunk(chunk_name, code)?.call::<()>(())?;
        Ok(())
    }

    /// Execute a Lua script and return the result as text.
    ///
    /// Returns `None` if the script returns nil or no value.
    pub fn eval(&self, script: &str) -> Result<Option<String>, ScriptingError> {
        let value: Value = self.chunk("=eval", script)?.call(())?;

        match value {
            Value::Nil => Ok(None),
            Value::String(s) => Ok(Some(s.to_str()?.to_string())),
            Value::Integer(i) => Ok(Some(i.to_string())),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Boolean(b) => Ok(Some(b.to_string())),
            other => Ok(Some(format!("{other:?}"))),
        }
    }

    /// Execute a Lua script that must return a non-nil value.
    pub fn eval_string(&self, script: &str) -> Result<String, ScriptingError> {
        self.eval(script)?.ok_or_else(|| {
            ScriptingError::Lua(mlua::Error::runtime("script returned nil"))
        })
    }

    /// Execute a Lua script and pull its result into a [`HostValue`].
    pub fn eval_value(&self, script: &str) -> Result<HostValue, ScriptingError> {
        let value: Value = self.chunk("=eval", script)?.call(())?;
        Ok(match value {
            Value::Nil => HostValue::Nil,
            Value::Boolean(b) => HostValue::Bool(b),
            Value::Integer(i) => HostValue::Int(i),
            Value::Number(n) => HostValue::Float(n),
            Value::String(s) => HostValue::String(s.to_str()?.to_string()),
            Value::Table(t) => pull_table(&t)?,
            other => HostValue::Opaque(other.type_name().to_string()),
        })
    }

    /// `require(name)` from the host side.
    pub fn require(&self, name: &str) -> Result<Value, ScriptingError> {
        let require: Function = self.lua.globals().get("require")?;
        Ok(require.call(name)?)
    }

    /// Load `path` through the environment filesystem and run it with `args`
    /// as `...`.
    ///
    /// Unlike `loadfile`, a syntax error is an error here.
    pub fn do_file(&self, path: &str, args: &[String]) -> Result<MultiValue, ScriptingError> {
        let f = load::load_file(&self.lua, &self.env, Some(path), None, None)?.into_function()?;
        let args: MultiValue = args
            .iter()
            .map(|a| self.lua.create_string(a).map(Value::String))
            .collect::<mlua::Result<_>>()?;
        let ret = f.call::<MultiValue>(args)?;
        self.env.sync_output().map_err(mlua::Error::external)?;
        Ok(ret)
    }

    /// Pre-init scripts that failed while building the sandbox.
    pub fn preinit_failures(&self) -> &[PreInitFailure] {
        &self.preinit_failures
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Get a reference to the underlying Lua state (for advanced usage).
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    fn chunk(&self, name: &str, code: &str) -> mlua::Result<Function> {
        self.lua.load(code).set_name(name).set_mode(ChunkMode::Text).into_function()
    }

    /// Remove globals that reach outside the sandbox.
    fn apply_sandbox(lua: &Lua) -> mlua::Result<()> {
        let globals = lua.globals();
        for name in ["io", "os", "debug"] {
            globals.set(name, Value::Nil)?;
        }
        Ok(())
    }
}
