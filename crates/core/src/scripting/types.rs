//! Scripting types and error definitions.

use std::fmt;
use std::rc::Rc;

use mlua::{Lua, Table};
use thiserror::Error;

use crate::fs::FsError;
use crate::marshal::MarshalError;
use crate::package::LoadError;

use super::environment::Environment;

/// Errors surfaced to the embedder by the sandbox.
#[derive(Debug, Error)]
pub enum ScriptingError {
    /// Error from the Lua runtime, including errors raised by scripts.
    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Marshal(#[from] MarshalError),
}

/// Entry point installing an extension library into the sandbox.
pub type OpenLibrary = Box<dyn Fn(&Lua, &Rc<Environment>) -> mlua::Result<Table>>;

/// A host-supplied library, exposed to scripts as a global table and
/// through `require(name)`.
pub struct HostLibrary {
    pub name: String,
    pub open: OpenLibrary,
}

impl HostLibrary {
    /// # Example
    ///
    /// ```rust
    /// use luabox_core::scripting::HostLibrary;
    ///
    /// let greet = HostLibrary::new("greet", |lua, _env| {
    ///     let t = lua.create_table()?;
    ///     t.set("hello", lua.create_function(|_, name: String| Ok(format!("hello {name}")))?)?;
    ///     Ok(t)
    /// });
    /// assert_eq!(greet.name, "greet");
    /// ```
    pub fn new<F>(name: impl Into<String>, open: F) -> Self
    where
        F: Fn(&Lua, &Rc<Environment>) -> mlua::Result<Table> + 'static,
    {
        Self { name: name.into(), open: Box::new(open) }
    }
}

impl fmt::Debug for HostLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostLibrary").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A pre-init script that failed to load or run. Startup carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreInitFailure {
    pub script: String,
    pub error: String,
}
