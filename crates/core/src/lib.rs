#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

//! Core library for luabox: a Lua sandbox over a virtual filesystem.

pub mod config;
pub mod fs;
pub mod localenv;
pub mod logging;
pub mod marshal;
pub mod package;
pub mod scripting;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// One-line build summary printed by `luabox doctor`.
pub fn doctor_stub() -> String {
    format!("luabox-core v{} | Lua 5.4 on {}", version(), std::env::consts::OS)
}
