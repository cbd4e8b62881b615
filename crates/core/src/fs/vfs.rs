//! Virtual filesystem router.
//!
//! A [`Vfs`] presents one tree built from a default backend plus any number
//! of backends mounted under a prefix. Only the first path segment is ever
//! considered a prefix: `data/x/y` goes to the `data` mount as `x/y`, while
//! `data` alone (a single segment) and `a/data/x` both go to the default
//! backend untouched.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::trace;

use super::{FileInfo, FileReader, FileWriter, Filesystem, FsError, name_etag};

/// Prefix-multiplexing [`Filesystem`].
#[derive(Clone)]
pub struct Vfs {
    base: Arc<dyn Filesystem>,
    mounts: BTreeMap<String, Arc<dyn Filesystem>>,
}

impl std::fmt::Debug for Vfs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vfs").field("mounts", &self.mounts.keys().collect::<Vec<_>>()).finish()
    }
}

impl Vfs {
    /// Create a router over `base` with no mounts.
    pub fn new(base: impl Filesystem + 'static) -> Self {
        Self::from_arc(Arc::new(base))
    }

    pub fn from_arc(base: Arc<dyn Filesystem>) -> Self {
        Self { base, mounts: BTreeMap::new() }
    }

    /// Register `fs` under `prefix`. A later mount with the same prefix
    /// replaces the earlier one.
    pub fn mount(&mut self, prefix: impl Into<String>, fs: Arc<dyn Filesystem>) -> &mut Self {
        self.mounts.insert(prefix.into(), fs);
        self
    }

    /// Builder-style variant of [`Vfs::mount`].
    pub fn with_mount(mut self, prefix: impl Into<String>, fs: impl Filesystem + 'static) -> Self {
        self.mount(prefix, Arc::new(fs));
        self
    }

    /// Registered prefixes, sorted.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.mounts.keys().map(String::as_str)
    }

    /// Pick the backend for `path` and rewrite the path for it.
    pub fn route<'a>(&'a self, path: &'a str) -> (&'a str, &'a dyn Filesystem) {
        if let Some((prefix, rest)) = path.split_once('/') {
            if let Some(fs) = self.mounts.get(prefix) {
                trace!(path, prefix, "vfs route to mount");
                return (rest, fs.as_ref());
            }
        }
        (path, self.base.as_ref())
    }
}

fn is_root(path: &str) -> bool {
    path.is_empty() || path == "/"
}

impl Filesystem for Vfs {
    fn get_reader(&self, path: &str) -> Result<FileReader, FsError> {
        let (rewritten, fs) = self.route(path);
        fs.get_reader(rewritten)
    }

    fn get_writer(&self, path: &str) -> Result<FileWriter, FsError> {
        let (rewritten, fs) = self.route(path);
        fs.get_writer(rewritten)
    }

    fn list(&self, path: &str) -> Result<Vec<FileInfo>, FsError> {
        if !is_root(path) {
            let (rewritten, fs) = self.route(path);
            return fs.list(rewritten);
        }

        // A failing default backend fails the whole listing.
        let mut entries = self.base.list("/")?;
        entries.retain(|e| !self.mounts.contains_key(&e.name));

        for prefix in self.mounts.keys() {
            entries.push(FileInfo {
                name: prefix.clone(),
                self_url: format!("{prefix}/"),
                is_dir: true,
                last_modified: DateTime::<Utc>::UNIX_EPOCH,
                size: 0,
                etag: name_etag(prefix),
            });
        }
        Ok(entries)
    }

    fn delete(&self, path: &str) -> Result<(), FsError> {
        let (rewritten, fs) = self.route(path);
        fs.delete(rewritten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MemoryFs, ReadOnlyFs};
    use rstest::rstest;
    use std::io::Read;

    fn read(fs: &dyn Filesystem, path: &str) -> Result<String, FsError> {
        let mut s = String::new();
        fs.get_reader(path)?.read_to_string(&mut s).unwrap();
        Ok(s)
    }

    fn fixture() -> Vfs {
        let base = MemoryFs::new()
            .with_file("main.lua", "base main")
            .unwrap()
            .with_file("data/x.txt", "base data")
            .unwrap()
            .with_file("lib/a.lua", "base lib")
            .unwrap();
        let data = MemoryFs::new().with_file("x.txt", "mounted data").unwrap();
        let assets = MemoryFs::new().with_file("logo.txt", "logo").unwrap();
        Vfs::new(base).with_mount("data", data).with_mount("assets", ReadOnlyFs::new(assets))
    }

    #[rstest]
    #[case("data/x.txt", "mounted data")]
    #[case("assets/logo.txt", "logo")]
    #[case("main.lua", "base main")]
    #[case("lib/a.lua", "base lib")]
    fn test_route_reads(#[case] path: &str, #[case] expected: &str) {
        let vfs = fixture();
        assert_eq!(read(&vfs, path).unwrap(), expected);
    }

    #[test]
    fn test_single_segment_goes_to_default() {
        let vfs = fixture();
        let (rewritten, _) = vfs.route("data");
        assert_eq!(rewritten, "data");
        assert!(read(&vfs, "data").is_err());
    }

    #[test]
    fn test_prefix_match_is_not_recursive() {
        let base = MemoryFs::new().with_file("a/data/x.txt", "deep").unwrap();
        let vfs = Vfs::new(base).with_mount("data", MemoryFs::new());
        assert_eq!(read(&vfs, "a/data/x.txt").unwrap(), "deep");
    }

    #[test]
    fn test_writes_and_deletes_follow_routing() {
        let vfs = fixture();
        assert!(vfs.get_writer("assets/new.txt").err().unwrap().is_read_only());
        assert!(vfs.delete("assets/logo.txt").unwrap_err().is_read_only());
        vfs.delete("data/x.txt").unwrap();
        assert!(matches!(read(&vfs, "data/x.txt"), Err(FsError::NotFound(_))));
        assert_eq!(read(&vfs, "main.lua").unwrap(), "base main");
    }

    #[test]
    fn test_list_root_merges_mounts_without_duplicates() {
        let vfs = fixture();
        let entries = vfs.list("/").unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["lib", "main.lua", "assets", "data"]);

        let data = entries.iter().find(|e| e.name == "data").unwrap();
        assert!(data.is_dir);
        assert_eq!(data.size, 0);
        assert_eq!(data.etag, name_etag("data"));
        assert_eq!(data.last_modified, DateTime::<Utc>::UNIX_EPOCH);

        assert_eq!(vfs.list("").unwrap(), entries);
    }

    #[test]
    fn test_list_inside_mount() {
        let vfs = fixture();
        let entries = vfs.list("assets/").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "logo.txt");
    }

    struct Broken;

    impl Filesystem for Broken {
        fn get_reader(&self, path: &str) -> Result<FileReader, FsError> {
            Err(FsError::NotFound(path.to_string()))
        }
        fn get_writer(&self, _path: &str) -> Result<FileWriter, FsError> {
            Err(FsError::ReadOnly)
        }
        fn list(&self, path: &str) -> Result<Vec<FileInfo>, FsError> {
            Err(FsError::InvalidPath(path.to_string()))
        }
        fn delete(&self, _path: &str) -> Result<(), FsError> {
            Err(FsError::ReadOnly)
        }
    }

    #[test]
    fn test_list_root_fails_when_default_fails() {
        let vfs = Vfs::new(Broken).with_mount("data", MemoryFs::new());
        assert!(matches!(vfs.list("/"), Err(FsError::InvalidPath(_))));
    }
}
