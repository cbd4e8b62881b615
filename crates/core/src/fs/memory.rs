//! In-memory filesystem.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Write};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use super::{FileInfo, FileReader, FileWriter, Filesystem, FsError, entry_etag};

#[derive(Debug, Clone)]
struct MemoryFile {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

type Store = Arc<RwLock<BTreeMap<String, MemoryFile>>>;

/// A [`Filesystem`] holding its files in process memory.
///
/// Paths are normalised to `a/b/c` form (no leading slash, no empty or `.`
/// segments). Directories exist implicitly as prefixes of file paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: Store,
}

fn normalize(path: &str) -> Result<String, FsError> {
    let mut parts = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => return Err(FsError::InvalidPath(path.to_string())),
            p => parts.push(p),
        }
    }
    Ok(parts.join("/"))
}

fn poisoned(path: &str) -> FsError {
    FsError::Io {
        path: path.to_string(),
        source: std::io::Error::other("memory filesystem lock poisoned"),
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file. Intended for seeding the store.
    pub fn insert(&self, path: &str, data: impl Into<Vec<u8>>) -> Result<(), FsError> {
        let key = normalize(path)?;
        if key.is_empty() {
            return Err(FsError::InvalidPath(path.to_string()));
        }
        let mut files = self.files.write().map_err(|_| poisoned(path))?;
        files.insert(key, MemoryFile { data: data.into(), modified: Utc::now() });
        Ok(())
    }

    /// Builder-style variant of [`MemoryFs::insert`].
    pub fn with_file(self, path: &str, data: impl Into<Vec<u8>>) -> Result<Self, FsError> {
        self.insert(path, data)?;
        Ok(self)
    }

    /// Current content of a file, if present.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        let key = normalize(path).ok()?;
        self.files.read().ok()?.get(&key).map(|f| f.data.clone())
    }
}

/// Writer that commits into the store when dropped.
///
/// Writes land positionally over the existing bytes, like a file opened
/// read-write without truncation.
struct MemoryWriter {
    key: String,
    buffer: Cursor<Vec<u8>>,
    files: Store,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut files = self
            .files
            .write()
            .map_err(|_| std::io::Error::other("memory filesystem lock poisoned"))?;
        files.insert(
            self.key.clone(),
            MemoryFile { data: self.buffer.get_ref().clone(), modified: Utc::now() },
        );
        Ok(())
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl Filesystem for MemoryFs {
    fn get_reader(&self, path: &str) -> Result<FileReader, FsError> {
        let key = normalize(path)?;
        let files = self.files.read().map_err(|_| poisoned(path))?;
        let file = files.get(&key).ok_or_else(|| FsError::NotFound(path.to_string()))?;
        Ok(Box::new(Cursor::new(file.data.clone())))
    }

    fn get_writer(&self, path: &str) -> Result<FileWriter, FsError> {
        let key = normalize(path)?;
        if key.is_empty() {
            return Err(FsError::InvalidPath(path.to_string()));
        }
        let files = self.files.read().map_err(|_| poisoned(path))?;
        let existing = files
            .get(&key)
            .map(|f| f.data.clone())
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        Ok(Box::new(MemoryWriter {
            key,
            buffer: Cursor::new(existing),
            files: Arc::clone(&self.files),
        }))
    }

    fn list(&self, path: &str) -> Result<Vec<FileInfo>, FsError> {
        let dir = normalize(path)?;
        let prefix = if dir.is_empty() { String::new() } else { format!("{dir}/") };
        let files = self.files.read().map_err(|_| poisoned(path))?;

        let mut entries = Vec::new();
        let mut subdirs = BTreeSet::new();
        for (key, file) in files.iter() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((subdir, _)) => {
                    subdirs.insert(subdir.to_string());
                }
                None => {
                    let size = file.data.len() as u64;
                    entries.push(FileInfo {
                        name: rest.to_string(),
                        self_url: key.clone(),
                        is_dir: false,
                        last_modified: file.modified,
                        size,
                        etag: entry_etag(file.modified, size),
                    });
                }
            }
        }

        if entries.is_empty() && subdirs.is_empty() && !dir.is_empty() {
            return Err(FsError::NotFound(path.to_string()));
        }

        for subdir in subdirs {
            let modified = DateTime::<Utc>::UNIX_EPOCH;
            entries.push(FileInfo {
                self_url: format!("{prefix}{subdir}"),
                name: subdir,
                is_dir: true,
                last_modified: modified,
                size: 0,
                etag: entry_etag(modified, 0),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn delete(&self, path: &str) -> Result<(), FsError> {
        let key = normalize(path)?;
        let mut files = self.files.write().map_err(|_| poisoned(path))?;
        files.remove(&key).map(|_| ()).ok_or_else(|| FsError::NotFound(path.to_string()))
    }
}
