//! Filesystem abstraction used by the sandbox.
//!
//! Scripts never touch the host disk directly. Every read performed by
//! `require`, `loadfile` or `dofile` goes through a [`Filesystem`], usually
//! the [`Vfs`] router which multiplexes several backends under path prefixes.
//!
//! # Backends
//!
//! - [`LocalFs`] - a directory on disk, jailed to its root
//! - [`MemoryFs`] - an in-process store, handy for embedded bundles and tests
//! - [`ReadOnlyFs`] - wraps any backend and refuses writes and deletes
//! - [`Vfs`] - routes paths to the backends above by their first segment

pub mod local;
pub mod memory;
pub mod readonly;
pub mod vfs;

use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use local::LocalFs;
pub use memory::MemoryFs;
pub use readonly::ReadOnlyFs;
pub use vfs::Vfs;

/// Readable stream handed out by a backend. Dropping it closes the file.
pub type FileReader = Box<dyn Read + Send>;

/// Writable stream handed out by a backend. Dropping it closes the file.
pub type FileWriter = Box<dyn Write + Send>;

/// Errors raised by filesystem backends.
#[derive(Debug, Error)]
pub enum FsError {
    /// The backend does not accept writes or deletes.
    #[error("readonly filesystem")]
    ReadOnly,

    /// The path escapes the backend root or cannot be represented.
    #[error("invalid file path: {0}")]
    InvalidPath(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Whether this error is the fixed read-only kind.
    pub fn is_read_only(&self) -> bool {
        matches!(self, FsError::ReadOnly)
    }
}

/// Directory entry metadata returned by [`Filesystem::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    /// Locator of this entry, relative to the backend that produced it.
    pub self_url: String,
    pub is_dir: bool,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
    /// Stable fingerprint of (`last_modified`, `size`).
    pub etag: String,
}

/// Capability contract implemented by every storage backend.
///
/// Backends must be safe to share between runtime instances; the sandbox
/// adds no locking of its own on top of them.
pub trait Filesystem: Send + Sync {
    /// Open `path` for reading.
    fn get_reader(&self, path: &str) -> Result<FileReader, FsError>;

    /// Open `path` for writing. Never truncates and never creates parent
    /// directories.
    fn get_writer(&self, path: &str) -> Result<FileWriter, FsError>;

    /// List the direct children of the directory at `path`.
    fn list(&self, path: &str) -> Result<Vec<FileInfo>, FsError>;

    /// Remove the entry at `path`.
    fn delete(&self, path: &str) -> Result<(), FsError>;
}

/// Compute the ETag of an entry from its modification time and size.
pub fn entry_etag(last_modified: DateTime<Utc>, size: u64) -> String {
    let mut hasher = DefaultHasher::new();
    last_modified.timestamp().hash(&mut hasher);
    last_modified.timestamp_subsec_nanos().hash(&mut hasher);
    size.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Compute the ETag of a name-only entry such as a mount point.
pub fn name_etag(name: &str) -> String {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Lexically normalise `path` by folding `.` and `..` components.
///
/// Unlike `canonicalize`, this works for paths that do not exist yet and
/// never follows symlinks. A `..` above the start of a relative path is kept,
/// so callers can still detect the escape.
pub(crate) fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    _ => false,
                };
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_etag_stable() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(entry_etag(ts, 42), entry_etag(ts, 42));
        assert_eq!(entry_etag(ts, 42).len(), 16);
    }

    #[test]
    fn test_entry_etag_changes_with_size_and_time() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 1).unwrap();
        assert_ne!(entry_etag(ts, 42), entry_etag(ts, 43));
        assert_ne!(entry_etag(ts, 42), entry_etag(later, 42));
    }

    #[test]
    fn test_name_etag_deterministic() {
        assert_eq!(name_etag("data"), name_etag("data"));
        assert_ne!(name_etag("data"), name_etag("libs"));
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(clean_path(Path::new("/a/../../etc")), PathBuf::from("/etc"));
        assert_eq!(clean_path(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(clean_path(Path::new("./x.lua")), PathBuf::from("x.lua"));
    }
}
