//! Directory-backed bundle loading
//!
//! Reads an unpacked creative directory into a [`Bundle`]. Archive decoding
//! lives outside this crate; this loader is what the CLI uses for creatives
//! that are already extracted on disk.

use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use super::Bundle;
use crate::analyzer::load_phase::gzip_len;
use crate::error::AuditError;
use crate::infra::{FileSystem, RealFileSystem};

/// Entries never shipped with a creative (OS metadata folders)
const IGNORED_DIRS: &[&str] = &["__MACOSX"];

/// Loads a creative directory through a [`FileSystem`]
///
/// # Examples
///
/// ```no_run
/// use h5_audit::bundle::BundleLoader;
///
/// let bundle = BundleLoader::new("creatives/300x250").load()?;
/// println!("{} files", bundle.len());
/// # Ok::<(), h5_audit::error::AuditError>(())
/// ```
pub struct BundleLoader<FS: FileSystem = RealFileSystem> {
    root: PathBuf,
    fs: FS,
}

impl BundleLoader<RealFileSystem> {
    /// Create a loader for the given creative directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_fs(root, RealFileSystem)
    }
}

impl<FS: FileSystem> BundleLoader<FS> {
    /// Create a loader with a custom filesystem implementation
    pub fn with_fs(root: impl Into<PathBuf>, fs: FS) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }

    /// Read every file under the root into a bundle
    ///
    /// The archive length is estimated as the sum of per-file gzip sizes,
    /// which tracks what a deflate-packed ZIP of the same files would weigh.
    pub fn load(&self) -> Result<Bundle, AuditError> {
        let metadata = self.fs.metadata(&self.root).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                AuditError::BundleNotFound {
                    path: self.root.clone(),
                }
            } else {
                AuditError::Io {
                    context: format!("reading {}", self.root.display()),
                    source: e,
                }
            }
        })?;

        if !metadata.is_dir() {
            return Err(AuditError::UnsupportedInput {
                path: self.root.clone(),
            });
        }

        let mut entries = Vec::new();
        self.collect(&self.root, &mut entries)?;

        let archive_bytes = entries
            .iter()
            .map(|(_, content)| gzip_len(content).unwrap_or(content.len() as u64))
            .sum();

        let name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle".to_string());

        debug!(
            "loaded bundle '{}' with {} files from {}",
            name,
            entries.len(),
            self.root.display()
        );

        Ok(Bundle::from_files(name, entries).with_archive_bytes(archive_bytes))
    }

    /// Recursively collect `(relative path, bytes)` pairs
    fn collect(&self, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) -> Result<(), AuditError> {
        let io_err = |path: &Path, source: io::Error| AuditError::Io {
            context: format!("reading {}", path.display()),
            source,
        };

        for entry in self.fs.read_dir(dir).map_err(|e| io_err(dir, e))? {
            let entry = entry.map_err(|e| io_err(dir, e))?;
            let path = entry.path();

            // Skip hidden entries and OS metadata folders
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') || IGNORED_DIRS.contains(&name) {
                    continue;
                }
            }

            let metadata = self.fs.metadata(&path).map_err(|e| io_err(&path, e))?;
            if metadata.is_dir() {
                self.collect(&path, out)?;
            } else {
                let content = self.fs.read(&path).map_err(|e| io_err(&path, e))?;
                out.push((self.relative(&path), content));
            }
        }

        Ok(())
    }

    fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}
