//! Configuration for h5-audit
//!
//! This module provides:
//! - Specification profiles (vendor, iab)
//! - .h5-audit.toml config file support
//! - Run settings passed to checks

pub mod file;
pub mod loader;
pub mod profile;
pub mod settings;

pub use file::{BudgetConfig, CheckToggles, ConfigFile, SizeBudget, CONFIG_FILE_NAME};
pub use loader::ConfigLoader;
pub use profile::Profile;
pub use settings::Settings;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_module_exports_are_accessible() {
        let _: Option<ConfigFile> = None;
        let _: Option<Settings> = None;
        let _: Option<SizeBudget> = None;
    }

    #[test]
    fn test_config_file_name_constant_is_correct() {
        assert_eq!(CONFIG_FILE_NAME, ".h5-audit.toml");
    }
}
