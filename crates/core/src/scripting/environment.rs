//! Per-sandbox state shared by every host function.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crate::fs::Filesystem;
use crate::logging::{Log, TracingLog};
use crate::package::{LuaFile, PackageConfig};

use super::types::HostLibrary;

/// Everything a sandbox is bound to.
///
/// Built before the runtime starts and handed to
/// [`LuaSandbox::new`](super::LuaSandbox::new), which shares it with every
/// host function through an `Rc`. It is not mutated afterwards; the streams
/// sit behind `RefCell` only because reading and writing need `&mut`.
pub struct Environment {
    /// Filesystem seen by `require`, `loadfile` and `dofile`.
    pub fs: Arc<dyn Filesystem>,
    /// Read by `loadfile()`/`dofile()` without a file name.
    pub input: RefCell<Box<dyn Read>>,
    /// Target of `print`.
    pub output: RefCell<Box<dyn Write>>,
    pub log: Arc<dyn Log>,
    /// Returned by `luabox.getEnv()`.
    pub env: BTreeMap<String, String>,
    /// Returned by `luabox.getArgs()`.
    pub args: Vec<String>,
    pub host_libs: Vec<HostLibrary>,
    /// Lua sources reachable through `require`, keyed by module name.
    pub lua_libs: BTreeMap<String, LuaFile>,
    /// Run in order once the runtime is ready, before any user code.
    pub pre_init: Vec<LuaFile>,
    pub package: PackageConfig,
}

impl Environment {
    /// An environment over `fs` with no input, discarded output and the
    /// default `tracing` logger.
    pub fn new(fs: Arc<dyn Filesystem>) -> Self {
        Self {
            fs,
            input: RefCell::new(Box::new(io::empty())),
            output: RefCell::new(Box::new(io::sink())),
            log: Arc::new(TracingLog::new()),
            env: BTreeMap::new(),
            args: Vec::new(),
            host_libs: Vec::new(),
            lua_libs: BTreeMap::new(),
            pre_init: Vec::new(),
            package: PackageConfig::default(),
        }
    }

    pub fn with_input(mut self, input: impl Read + 'static) -> Self {
        self.input = RefCell::new(Box::new(input));
        self
    }

    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = RefCell::new(Box::new(output));
        self
    }

    pub fn with_log(mut self, log: Arc<dyn Log>) -> Self {
        self.log = log;
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_host_lib(mut self, lib: HostLibrary) -> Self {
        self.host_libs.push(lib);
        self
    }

    pub fn with_lua_lib(mut self, module: impl Into<String>, file: LuaFile) -> Self {
        self.lua_libs.insert(module.into(), file);
        self
    }

    pub fn with_pre_init(mut self, script: LuaFile) -> Self {
        self.pre_init.push(script);
        self
    }

    pub fn with_package(mut self, package: PackageConfig) -> Self {
        self.package = package;
        self
    }

    /// Flush the output stream.
    pub fn sync_output(&self) -> io::Result<()> {
        self.output.borrow_mut().flush()
    }
}

/// Cloneable in-memory sink, handy as [`Environment::output`] when the
/// embedder wants to look at what scripts printed.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    #[test]
    fn test_defaults() {
        let env = Environment::new(Arc::new(MemoryFs::new()));
        let mut buf = Vec::new();
        env.input.borrow_mut().read_to_end(&mut buf).unwrap();
        assert!(buf.is_empty());
        assert!(env.args.is_empty());
        assert!(env.sync_output().is_ok());
    }

    #[test]
    fn test_capture_buffer_is_shared() {
        let out = CaptureBuffer::new();
        let env = Environment::new(Arc::new(MemoryFs::new())).with_output(out.clone());
        env.output.borrow_mut().write_all(b"hi").unwrap();
        env.sync_output().unwrap();
        assert_eq!(out.contents(), "hi");
    }
}
