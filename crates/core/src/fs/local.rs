//! Disk-backed filesystem jailed to a root directory.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::{FileInfo, FileReader, FileWriter, Filesystem, FsError, clean_path, entry_etag};

/// A [`Filesystem`] over a directory of the host disk.
///
/// Every path is joined to `root` and normalised before use; anything that
/// ends up outside `root` is rejected with [`FsError::InvalidPath`].
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    /// Create a backend rooted at `root`.
    ///
    /// The root is normalised lexically; it does not need to exist yet.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = if root.is_absolute() {
            clean_path(root)
        } else {
            let cwd = std::env::current_dir().unwrap_or_default();
            clean_path(&cwd.join(root))
        };
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FsError> {
        let relative = path.trim_start_matches('/');
        let full = clean_path(&self.root.join(relative));
        if !full.starts_with(&self.root) {
            return Err(FsError::InvalidPath(path.to_string()));
        }
        Ok(full)
    }
}

fn io_error(path: &str, source: std::io::Error) -> FsError {
    if source.kind() == std::io::ErrorKind::NotFound {
        FsError::NotFound(path.to_string())
    } else {
        FsError::Io { path: path.to_string(), source }
    }
}

impl Filesystem for LocalFs {
    fn get_reader(&self, path: &str) -> Result<FileReader, FsError> {
        let full = self.resolve(path)?;
        let file = File::open(&full).map_err(|e| io_error(path, e))?;
        Ok(Box::new(file))
    }

    fn get_writer(&self, path: &str) -> Result<FileWriter, FsError> {
        let full = self.resolve(path)?;
        // No create, no truncate: the target has to exist already.
        let file =
            OpenOptions::new().write(true).open(&full).map_err(|e| io_error(path, e))?;
        Ok(Box::new(file))
    }

    fn list(&self, path: &str) -> Result<Vec<FileInfo>, FsError> {
        let full = self.resolve(path)?;
        let base = full
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| FsError::InvalidPath(path.to_string()))?;

        let mut entries = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| io_error(path, e))? {
            let entry = entry.map_err(|e| io_error(path, e))?;
            let meta = entry.metadata().map_err(|e| io_error(path, e))?;
            let last_modified: DateTime<Utc> =
                meta.modified().map(DateTime::from).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            let name = entry.file_name().to_string_lossy().to_string();
            let size = meta.len();

            entries.push(FileInfo {
                self_url: base.join(&name).to_string_lossy().to_string(),
                name,
                is_dir: meta.is_dir(),
                last_modified,
                size,
                etag: entry_etag(last_modified, size),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn delete(&self, path: &str) -> Result<(), FsError> {
        let full = self.resolve(path)?;
        if full == self.root {
            return Err(FsError::InvalidPath(path.to_string()));
        }
        fs::remove_file(&full).map_err(|e| io_error(path, e))
    }
}
