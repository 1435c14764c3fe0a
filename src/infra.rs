//! Infrastructure traits for abstracting I/O operations.
//!
//! The audit core never touches the filesystem; only the directory bundle
//! loader and the config loader do, and they go through [`FileSystem`] so
//! tests can substitute an in-memory implementation.

use std::fs::{Metadata, ReadDir};
use std::io;
use std::path::Path;

/// Trait for abstracting filesystem operations.
///
/// This trait allows for dependency injection of filesystem operations,
/// making code more testable and allowing for alternative implementations
/// (e.g., in-memory filesystems for testing).
pub trait FileSystem {
    /// Read the contents of a directory.
    fn read_dir(&self, path: &Path) -> io::Result<ReadDir>;

    /// Get metadata for a file or directory.
    fn metadata(&self, path: &Path) -> io::Result<Metadata>;

    /// Read the entire contents of a file as raw bytes.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Read the entire contents of a file into a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write a slice of bytes to a file.
    fn write(&self, path: &Path, contents: impl AsRef<[u8]>) -> io::Result<()>;
}

/// Real filesystem implementation that delegates to std::fs.
#[derive(Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_dir(&self, path: &Path) -> io::Result<ReadDir> {
        std::fs::read_dir(path)
    }

    fn metadata(&self, path: &Path) -> io::Result<Metadata> {
        std::fs::metadata(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_real_filesystem_write_then_read_returns_same_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("banner.html");
        let fs = RealFileSystem;

        fs.write(&path, "<html></html>").unwrap();

        assert_eq!(fs.read(&path).unwrap(), b"<html></html>");
        assert_eq!(fs.read_to_string(&path).unwrap(), "<html></html>");
        assert!(fs.metadata(&path).unwrap().is_file());
    }

    #[test]
    fn test_real_filesystem_read_dir_lists_entries() {
        let temp_dir = TempDir::new().unwrap();
        let fs = RealFileSystem;
        fs.write(&temp_dir.path().join("a.css"), "").unwrap();
        fs.write(&temp_dir.path().join("b.js"), "").unwrap();

        let count = fs.read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_real_filesystem_missing_file_returns_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let err = RealFileSystem
            .read(&temp_dir.path().join("missing.png"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
