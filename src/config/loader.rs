//! Configuration file loading and saving

use super::file::{ConfigFile, CONFIG_FILE_NAME};
use crate::error::AuditError;
use crate::infra::{FileSystem, RealFileSystem};
use anyhow::{Context, Result};
use std::path::Path;

/// Handles loading and saving configuration files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from .h5-audit.toml in the given directory
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use h5_audit::config::ConfigLoader;
    /// use std::path::Path;
    ///
    /// let config = ConfigLoader::load(Path::new("."))?;
    /// println!("Active profiles: {:?}", config.profiles);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(project_root: &Path) -> Result<ConfigFile> {
        Self::load_with_fs(project_root, &RealFileSystem)
    }

    /// Load config with a custom filesystem implementation
    pub fn load_with_fs<FS: FileSystem>(project_root: &Path, fs: &FS) -> Result<ConfigFile> {
        let config_path = project_root.join(CONFIG_FILE_NAME);

        // Read file atomically - no TOCTOU race window
        let contents = match fs.read_to_string(&config_path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ConfigFile::default());
            }
            Err(e) => {
                return Err(e).context("Failed to read .h5-audit.toml");
            }
        };

        Self::parse(&contents)
    }

    /// Load an explicitly named config file; a missing file is an error
    pub fn load_file(path: &Path) -> Result<ConfigFile> {
        Self::load_file_with_fs(path, &RealFileSystem)
    }

    /// Load an explicitly named config file with a custom filesystem
    pub fn load_file_with_fs<FS: FileSystem>(path: &Path, fs: &FS) -> Result<ConfigFile> {
        let contents = fs
            .read_to_string(path)
            .map_err(|source| AuditError::ConfigNotFound {
                path: path.to_path_buf(),
                source,
            })?;

        Self::parse(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<ConfigFile> {
        let config: ConfigFile =
            toml_edit::de::from_str(contents).context("Failed to parse .h5-audit.toml")?;

        config
            .budget
            .validate()
            .context("Invalid size budget configuration")?;

        Ok(config)
    }

    /// Save config to .h5-audit.toml in the given directory
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use h5_audit::config::{ConfigFile, ConfigLoader};
    /// use std::path::Path;
    ///
    /// ConfigLoader::save(&ConfigFile::default(), Path::new("."))?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn save(config: &ConfigFile, project_root: &Path) -> Result<()> {
        Self::save_with_fs(config, project_root, &RealFileSystem)
    }

    /// Save config with a custom filesystem implementation
    pub fn save_with_fs<FS: FileSystem>(
        config: &ConfigFile,
        project_root: &Path,
        fs: &FS,
    ) -> Result<()> {
        let config_path = project_root.join(CONFIG_FILE_NAME);

        let contents =
            toml_edit::ser::to_string_pretty(config).context("Failed to serialize config")?;

        fs.write(&config_path, contents)
            .context("Failed to write .h5-audit.toml")?;

        Ok(())
    }

    /// Check if config file exists in project
    pub fn exists(project_root: &Path) -> bool {
        project_root.join(CONFIG_FILE_NAME).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    // Mock FileSystem for testing
    struct MockFileSystem {
        file_content: Option<String>,
        should_fail_read: bool,
        should_fail_write: bool,
        written_content: Arc<Mutex<Option<String>>>,
    }

    impl MockFileSystem {
        fn new() -> Self {
            Self {
                file_content: None,
                should_fail_read: false,
                should_fail_write: false,
                written_content: Arc::new(Mutex::new(None)),
            }
        }

        fn with_content(content: &str) -> Self {
            Self {
                file_content: Some(content.to_string()),
                ..Self::new()
            }
        }

        fn with_read_error() -> Self {
            Self {
                should_fail_read: true,
                ..Self::new()
            }
        }

        fn with_write_error() -> Self {
            Self {
                should_fail_write: true,
                ..Self::new()
            }
        }

        fn get_written_content(&self) -> Option<String> {
            self.written_content.lock().clone()
        }
    }

    impl FileSystem for MockFileSystem {
        fn read_to_string(&self, _path: &Path) -> io::Result<String> {
            if self.should_fail_read {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "permission denied",
                ));
            }
            self.file_content
                .clone()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not found"))
        }

        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.read_to_string(path).map(String::into_bytes)
        }

        fn write(&self, _path: &Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
            if self.should_fail_write {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "permission denied",
                ));
            }
            let contents_str = String::from_utf8_lossy(contents.as_ref()).to_string();
            *self.written_content.lock() = Some(contents_str);
            Ok(())
        }

        fn metadata(&self, _path: &Path) -> io::Result<std::fs::Metadata> {
            unimplemented!()
        }

        fn read_dir(&self, _path: &Path) -> io::Result<std::fs::ReadDir> {
            unimplemented!()
        }
    }

    #[test]
    fn test_loader_loads_from_valid_toml() {
        let temp = tempfile::tempdir().unwrap();
        let config_path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &config_path,
            r#"
profiles = ["vendor"]

[budget.zipped]
max-size-kb = 150
"#,
        )
        .unwrap();

        let config = ConfigLoader::load(temp.path()).unwrap();
        assert_eq!(config.profiles, vec![Profile::Vendor]);
        assert_eq!(config.budget.zipped.max_size_kb, Some(150));
    }

    #[test]
    fn test_loader_with_missing_file_uses_defaults() {
        let fs = MockFileSystem::new();
        let config = ConfigLoader::load_with_fs(Path::new("/test"), &fs).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_loader_with_invalid_toml_returns_error() {
        let fs = MockFileSystem::with_content("invalid { toml syntax");
        let result = ConfigLoader::load_with_fs(Path::new("/test"), &fs);
        assert!(result.is_err(), "Expected error for invalid TOML");
    }

    #[test]
    fn test_loader_with_unknown_profile_returns_error() {
        let fs = MockFileSystem::with_content(r#"profiles = ["dv360"]"#);
        assert!(ConfigLoader::load_with_fs(Path::new("/test"), &fs).is_err());
    }

    #[test]
    fn test_loader_with_inverted_budget_returns_error() {
        let fs = MockFileSystem::with_content(
            r#"
[budget.initial]
warn-threshold-kb = 200
max-size-kb = 100
"#,
        );
        let err = ConfigLoader::load_with_fs(Path::new("/test"), &fs).unwrap_err();
        assert!(format!("{:#}", err).contains("budget.initial"));
    }

    #[test]
    fn test_loader_with_permission_error_returns_error() {
        let fs = MockFileSystem::with_read_error();
        let result = ConfigLoader::load_with_fs(Path::new("/test"), &fs);

        // PermissionDenied is propagated, not swallowed into defaults
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to read"));
    }

    #[test]
    fn test_load_file_missing_returns_config_not_found() {
        let fs = MockFileSystem::new();
        let err = ConfigLoader::load_file_with_fs(Path::new("/test/custom.toml"), &fs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AuditError>(),
            Some(AuditError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_save_writes_valid_toml() {
        let fs = MockFileSystem::new();
        ConfigLoader::save_with_fs(&ConfigFile::default(), Path::new("/test"), &fs).unwrap();

        let content = fs.get_written_content().unwrap();
        assert!(content.contains("profiles"));
        assert!(content.contains("max-size-kb"));
    }

    #[test]
    fn test_save_with_write_error_returns_error() {
        let fs = MockFileSystem::with_write_error();
        let result = ConfigLoader::save_with_fs(&ConfigFile::default(), Path::new("/test"), &fs);

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to write"));
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = ConfigFile::default();
        config.profiles = vec![Profile::Iab];
        config.checks.disabled = vec!["file-count".to_string()];

        ConfigLoader::save(&config, temp.path()).unwrap();
        let loaded = ConfigLoader::load(temp.path()).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_exists_reflects_file_presence() {
        let temp = tempfile::tempdir().unwrap();
        assert!(!ConfigLoader::exists(temp.path()));

        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "").unwrap();
        assert!(ConfigLoader::exists(temp.path()));
    }

    #[test]
    fn test_loader_handles_empty_file() {
        let fs = MockFileSystem::with_content("");
        let config = ConfigLoader::load_with_fs(Path::new("/test"), &fs).unwrap();
        assert_eq!(config, ConfigFile::default());
    }
}
