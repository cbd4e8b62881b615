//! The `luabox` syscall table.
//!
//! Thin host functions: each one pulls its arguments through the
//! [`marshal`](crate::marshal) layer, calls into the environment and pushes
//! the result back.

use std::rc::Rc;

use mlua::{Function, Lua, Result as LuaResult, Table, Value, Variadic};
use tracing::level_filters::LevelFilter;

use crate::logging::Fields;
use crate::marshal::{HostValue, pull_table, pull_value, pull_varargs, push};

use super::environment::Environment;

/// Build the `luabox` table.
///
/// Lua scripts can then use:
/// - `luabox.log(level, message, params?)` - structured logging, levels 1-5
/// - `luabox.logLevel()` - most verbose level currently enabled
/// - `luabox.yamlRepr(...)` / `luabox.yamlParse(s)`
/// - `luabox.jsonRepr(t)` / `luabox.jsonParse(s)`
/// - `luabox.getEnv()` / `luabox.getArgs()`
pub fn register_luabox_table(lua: &Lua, env: &Rc<Environment>) -> LuaResult<Table> {
    let luabox = lua.create_table()?;

    luabox.set("log", create_log_fn(lua, env)?)?;
    luabox.set("logLevel", create_log_level_fn(lua, env)?)?;
    luabox.set("yamlRepr", create_yaml_repr_fn(lua)?)?;
    luabox.set("yamlParse", create_yaml_parse_fn(lua)?)?;
    luabox.set("jsonRepr", create_json_repr_fn(lua)?)?;
    luabox.set("jsonParse", create_json_parse_fn(lua)?)?;
    luabox.set("getEnv", create_get_env_fn(lua, env)?)?;
    luabox.set("getArgs", create_get_args_fn(lua, env)?)?;

    lua.globals().set("luabox", luabox.clone())?;
    Ok(luabox)
}

/// Create the `luabox.log(level, message, params?)` function.
///
/// # Examples (in Lua)
///
/// ```lua
/// luabox.log(2, "fetched", { count = 3 })  -- info
/// luabox.log(4, "giving up")               -- error
/// ```
///
/// Levels: 1 debug, 2 info, 3 warn, 4 error, 5 fatal. The caller position
/// is added as the `lua_origin` field.
fn create_log_fn(lua: &Lua, env: &Rc<Environment>) -> LuaResult<Function> {
    let env = Rc::clone(env);
    lua.create_function(move |lua, (level, message, params): (i64, String, Option<Table>)| {
        let mut fields = match params.map(|t| pull_table(&t)) {
            Some(Ok(HostValue::Map(map))) => map,
            _ => Fields::new(),
        };
        if let Some(origin) = lua_origin(lua) {
            fields.insert("lua_origin".to_string(), HostValue::String(origin));
        }

        let log = &env.log;
        match level {
            1 => log.debug(&message, &fields),
            2 => log.info(&message, &fields),
            3 => log.warn(&message, &fields),
            4 => log.error(&message, &fields),
            5 => log.fatal(&message, &fields),
            other => return Err(mlua::Error::runtime(format!("invalid log level {other}"))),
        }
        Ok(())
    })
}

/// `source:line` of the Lua function calling into the host.
fn lua_origin(lua: &Lua) -> Option<String> {
    let frame = lua.inspect_stack(1)?;
    let line = frame.curr_line();
    if line <= 0 {
        return None;
    }
    let source = frame.source();
    Some(format!("{}:{}", source.short_src.as_deref().unwrap_or("?"), line))
}

/// Create the `luabox.logLevel()` function, returning 1-5 like `log`.
fn create_log_level_fn(lua: &Lua, env: &Rc<Environment>) -> LuaResult<Function> {
    let env = Rc::clone(env);
    lua.create_function(move |_, ()| Ok(level_number(env.log.level())))
}

fn level_number(level: LevelFilter) -> i64 {
    if level >= LevelFilter::DEBUG {
        1
    } else if level >= LevelFilter::INFO {
        2
    } else if level >= LevelFilter::WARN {
        3
    } else if level >= LevelFilter::ERROR {
        4
    } else {
        5
    }
}

/// Create the `luabox.yamlRepr(...)` function.
///
/// One argument gives one YAML document. Several give a stream, each
/// document introduced by `---`. No argument gives an empty string.
fn create_yaml_repr_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|_, args: Variadic<Value>| {
        let values = pull_varargs(args.iter())?;
        match values.as_slice() {
            [] => Ok(String::new()),
            [single] => serde_yaml::to_string(single).map_err(mlua::Error::external),
            many => {
                let mut out = String::new();
                for value in many {
                    out.push_str("---\n");
                    out.push_str(&serde_yaml::to_string(value).map_err(mlua::Error::external)?);
                }
                Ok(out)
            }
        }
    })
}

/// Create the `luabox.yamlParse(s)` function.
///
/// ```lua
/// local doc = luabox.yamlParse("a: 1\nb: [x, y]")
/// print(doc.b[2])  -- y
/// ```
fn create_yaml_parse_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|lua, s: String| {
        let parsed: serde_yaml::Value = serde_yaml::from_str(&s).map_err(mlua::Error::external)?;
        Ok(push(lua, &HostValue::from(parsed))?)
    })
}

fn create_json_repr_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|_, t: Value| {
        let value = pull_value(&t)?;
        serde_json::to_string(&value).map_err(mlua::Error::external)
    })
}

fn create_json_parse_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|lua, s: String| {
        let parsed: serde_json::Value = serde_json::from_str(&s).map_err(mlua::Error::external)?;
        Ok(push(lua, &HostValue::from(parsed))?)
    })
}

fn create_get_env_fn(lua: &Lua, env: &Rc<Environment>) -> LuaResult<Function> {
    let env = Rc::clone(env);
    lua.create_function(move |lua, ()| Ok(push(lua, &HostValue::from(env.env.clone()))?))
}

fn create_get_args_fn(lua: &Lua, env: &Rc<Environment>) -> LuaResult<Function> {
    let env = Rc::clone(env);
    lua.create_function(move |lua, ()| Ok(push(lua, &HostValue::from(env.args.clone()))?))
}
