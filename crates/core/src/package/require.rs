//! `require`: cache lookup, searcher walk, single evaluation.

use mlua::{Lua, Value};
use tracing::debug;

use super::loaded_table;
use super::searchers::{SearchOutcome, Searcher};

/// Owns the searcher chain and implements `require` over it.
pub struct Resolver {
    searchers: Vec<Box<dyn Searcher>>,
}

impl Resolver {
    pub fn new(searchers: Vec<Box<dyn Searcher>>) -> Self {
        Self { searchers }
    }

    /// Names of the searchers, in the order they are consulted.
    pub fn searcher_names(&self) -> Vec<&str> {
        self.searchers.iter().map(|s| s.name()).collect()
    }

    /// Resolve and evaluate `name`, or return the cached value.
    ///
    /// Only successes are cached: a failing `require` may be retried. A
    /// module that returns nothing is cached as `true`.
    pub fn require(&self, lua: &Lua, name: &str) -> mlua::Result<Value> {
        let loaded = loaded_table(lua)?;
        let cached: Value = loaded.get(name)?;
        if is_truthy(&cached) {
            return Ok(cached);
        }

        let mut msg = String::new();
        for searcher in &self.searchers {
            match searcher.search(lua, name)? {
                SearchOutcome::NotFound(fragment) => msg.push_str(&fragment),
                SearchOutcome::Found { loader, label } => {
                    debug!(module = name, searcher = searcher.name(), %label, "loading module");
                    let value: Value = loader.call((name, label))?;
                    if !value.is_nil() {
                        loaded.set(name, value)?;
                    }
                    let mut value: Value = loaded.get(name)?;
                    if value.is_nil() {
                        value = Value::Boolean(true);
                        loaded.set(name, value.clone())?;
                    }
                    return Ok(value);
                }
            }
        }

        debug!(module = name, "module not found");
        Err(mlua::Error::runtime(format!("module '{name}' not found:{msg}")))
    }
}

fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Nil | Value::Boolean(false))
}
