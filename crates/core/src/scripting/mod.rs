//! The Lua sandbox.
//!
//! # Overview
//!
//! An [`Environment`] describes what a sandbox may touch: a filesystem,
//! input and output streams, a logger, environment variables, arguments,
//! extension libraries and Lua sources. [`LuaSandbox::new`] builds a Lua
//! runtime around it.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use luabox_core::fs::MemoryFs;
//! use luabox_core::scripting::{CaptureBuffer, Environment, LuaSandbox};
//!
//! let out = CaptureBuffer::new();
//! let env = Environment::new(Arc::new(MemoryFs::new())).with_output(out.clone());
//! let sandbox = LuaSandbox::new(env).unwrap();
//! sandbox.exec("=demo", r#"print(luabox.jsonRepr({ 1, 2 }))"#).unwrap();
//! assert_eq!(out.contents(), "[1,2]\n");
//! ```
//!
//! # Security
//!
//! - no `io`, `os` or `debug` library
//! - `load` only accepts text chunks
//! - `require`, `loadfile` and `dofile` read through the environment
//!   filesystem only
//! - `print` writes to the environment output, never to the process stdout

pub mod bindings;
pub mod engine;
pub mod environment;
pub mod globals;
pub mod types;

pub use engine::LuaSandbox;
pub use environment::{CaptureBuffer, Environment};
pub use types::{HostLibrary, OpenLibrary, PreInitFailure, ScriptingError};
