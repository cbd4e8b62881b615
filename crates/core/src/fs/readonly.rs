//! Read-only wrapper around another backend.

use super::{FileInfo, FileReader, FileWriter, Filesystem, FsError};

/// Forwards reads and listings to `inner`, refuses everything else with
/// [`FsError::ReadOnly`] without consulting `inner`.
#[derive(Debug, Clone)]
pub struct ReadOnlyFs<F> {
    inner: F,
}

impl<F: Filesystem> ReadOnlyFs<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F: Filesystem> Filesystem for ReadOnlyFs<F> {
    fn get_reader(&self, path: &str) -> Result<FileReader, FsError> {
        self.inner.get_reader(path)
    }

    fn get_writer(&self, _path: &str) -> Result<FileWriter, FsError> {
        Err(FsError::ReadOnly)
    }

    fn list(&self, path: &str) -> Result<Vec<FileInfo>, FsError> {
        self.inner.list(path)
    }

    fn delete(&self, _path: &str) -> Result<(), FsError> {
        Err(FsError::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    #[test]
    fn test_writer_refused_without_touching_inner() {
        let inner = MemoryFs::new().with_file("a.txt", "abc").unwrap();
        let ro = ReadOnlyFs::new(inner.clone());

        let err = ro.get_writer("a.txt").err().unwrap();
        assert!(err.is_read_only());
        assert_eq!(err.to_string(), "readonly filesystem");

        let err = ro.get_writer("b.txt").err().unwrap();
        assert!(err.is_read_only());
        assert!(inner.contents("b.txt").is_none());
    }

    #[test]
    fn test_delete_refused() {
        let inner = MemoryFs::new().with_file("a.txt", "abc").unwrap();
        let ro = ReadOnlyFs::new(inner.clone());
        assert!(ro.delete("a.txt").unwrap_err().is_read_only());
        assert_eq!(inner.contents("a.txt").unwrap(), b"abc");
    }

    #[test]
    fn test_reads_pass_through() {
        let ro = ReadOnlyFs::new(MemoryFs::new().with_file("a.txt", "abc").unwrap());
        assert!(ro.get_reader("a.txt").is_ok());
        assert_eq!(ro.list("").unwrap().len(), 1);
    }
}
