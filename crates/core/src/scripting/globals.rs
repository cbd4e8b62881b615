//! Sandboxed replacements for the base functions that touch the outside
//! world: `print`, `loadfile`, `dofile` and `load`.

use std::io::Write;
use std::rc::Rc;

use mlua::{Function, Lua, MultiValue, Result as LuaResult, Table, Value, Variadic};

use crate::package::load::{self, Loaded};

use super::environment::Environment;

/// Install the overrides into the global table.
pub fn register_globals(lua: &Lua, env: &Rc<Environment>) -> LuaResult<()> {
    let globals = lua.globals();

    globals.set("print", create_print_fn(lua, env)?)?;
    globals.set("loadfile", create_loadfile_fn(lua, env)?)?;
    globals.set("dofile", create_dofile_fn(lua, env)?)?;
    restrict_load(lua)?;

    // Writes straight to the host stderr.
    globals.set("warn", Value::Nil)?;

    Ok(())
}

/// `print(...)`: `tostring` every argument and write them, tab separated,
/// to the environment output.
fn create_print_fn(lua: &Lua, env: &Rc<Environment>) -> LuaResult<Function> {
    let env = Rc::clone(env);
    lua.create_function(move |lua, args: Variadic<Value>| {
        let tostring: Function = lua.globals().get("tostring")?;
        let mut line = Vec::new();
        for (i, arg) in args.into_iter().enumerate() {
            let s = match tostring.call::<Value>(arg)? {
                Value::String(s) => s,
                _ => return Err(mlua::Error::runtime("'tostring' must return a string to 'print'")),
            };
            if i > 0 {
                line.push(b'\t');
            }
            line.extend_from_slice(&s.as_bytes());
        }
        line.push(b'\n');
        env.output.borrow_mut().write_all(&line).map_err(mlua::Error::external)?;
        Ok(())
    })
}

/// `loadfile(filename?, mode?, env?)`
///
/// ```lua
/// local f, err = loadfile("lib/util.lua")
/// local g = loadfile(nil, "t", { x = 1 })  -- reads the input stream
/// ```
///
/// A syntax error comes back as `nil, message`. A missing or unreadable
/// file raises.
fn create_loadfile_fn(lua: &Lua, env: &Rc<Environment>) -> LuaResult<Function> {
    let env = Rc::clone(env);
    lua.create_function(
        move |lua, (file, mode, scope): (Option<String>, Option<String>, Option<Table>)| {
            let loaded = load::load_file(lua, &env, file.as_deref(), mode.as_deref(), scope)
                .map_err(mlua::Error::external)?;
            match loaded {
                Loaded::Chunk(f) => Ok((Value::Function(f), None)),
                Loaded::CompileError(e) => Ok((Value::Nil, Some(compile_message(&e)))),
            }
        },
    )
}

/// `dofile(filename?)`: load and run, returning whatever the chunk returns.
/// Every error raises.
fn create_dofile_fn(lua: &Lua, env: &Rc<Environment>) -> LuaResult<Function> {
    let env = Rc::clone(env);
    lua.create_function(move |lua, file: Option<String>| {
        let f = load::load_file(lua, &env, file.as_deref(), None, None)
            .map_err(mlua::Error::external)?
            .into_function()?;
        f.call::<MultiValue>(())
    })
}

/// Force `load` to text mode whatever the caller asks for.
fn restrict_load(lua: &Lua) -> LuaResult<()> {
    lua.load(
        r#"
        local rawload = load
        load = function(chunk, chunkname, _mode, ...)
            return rawload(chunk, chunkname, "t", ...)
        end
        "#,
    )
    .set_name("=sandbox")
    .exec()
}

fn compile_message(err: &mlua::Error) -> String {
    match err {
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
