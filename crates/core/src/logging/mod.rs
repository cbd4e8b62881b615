//! Structured logger used by the sandbox and by the `luabox.log` syscall.
//!
//! The sandbox only depends on the [`Log`] trait. [`TracingLog`] is the
//! default implementation and forwards everything to `tracing`.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::level_filters::LevelFilter;

use crate::marshal::HostValue;

/// Structured fields attached to a log record.
pub type Fields = BTreeMap<String, HostValue>;

/// Leveled, structured logger.
pub trait Log: Send + Sync {
    /// Derive a logger that adds `fields` to every record.
    fn with_fields(&self, fields: Fields) -> Arc<dyn Log>;

    fn debug(&self, msg: &str, fields: &Fields);
    fn info(&self, msg: &str, fields: &Fields);
    fn warn(&self, msg: &str, fields: &Fields);
    fn error(&self, msg: &str, fields: &Fields);

    /// Most severe level. Never terminates the process.
    fn fatal(&self, msg: &str, fields: &Fields);

    /// Most verbose level currently enabled.
    fn level(&self) -> LevelFilter;
}

/// [`Log`] implementation emitting `tracing` events.
#[derive(Debug, Clone, Default)]
pub struct TracingLog {
    context: Fields,
}

impl TracingLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(&self, fields: &Fields) -> String {
        let mut merged = self.context.clone();
        merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        if merged.is_empty() {
            return String::new();
        }
        serde_json::to_string(&merged).unwrap_or_default()
    }
}

impl Log for TracingLog {
    fn with_fields(&self, fields: Fields) -> Arc<dyn Log> {
        let mut context = self.context.clone();
        context.extend(fields);
        Arc::new(TracingLog { context })
    }

    fn debug(&self, msg: &str, fields: &Fields) {
        tracing::debug!(fields = %self.render(fields), "{msg}");
    }

    fn info(&self, msg: &str, fields: &Fields) {
        tracing::info!(fields = %self.render(fields), "{msg}");
    }

    fn warn(&self, msg: &str, fields: &Fields) {
        tracing::warn!(fields = %self.render(fields), "{msg}");
    }

    fn error(&self, msg: &str, fields: &Fields) {
        tracing::error!(fields = %self.render(fields), "{msg}");
    }

    fn fatal(&self, msg: &str, fields: &Fields) {
        tracing::error!(fatal = true, fields = %self.render(fields), "{msg}");
    }

    fn level(&self) -> LevelFilter {
        LevelFilter::current()
    }
}
