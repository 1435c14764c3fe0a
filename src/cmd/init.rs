//! Init command implementation
//!
//! Handles `h5-audit init`, which writes a default `.h5-audit.toml` into
//! the current directory.

use std::env;
use std::path::Path;

use anyhow::Result;
use console::style;

use crate::config::{self, ConfigFile, ConfigLoader};
use crate::fmt::{emoji, CHECKMARK, INFO, SPARKLES, WARNING};

/// Write the default configuration unless one already exists
///
/// # Examples
///
/// ```no_run
/// use h5_audit::cmd::init::cmd_init;
///
/// cmd_init()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn cmd_init() -> Result<()> {
    init_in(&env::current_dir()?)
}

/// Write the default configuration into `dir`
pub fn init_in(dir: &Path) -> Result<()> {
    println!("{} {} Initializing h5-audit", emoji(SPARKLES), style("h5-audit init").bold());
    println!();

    if ConfigLoader::exists(dir) {
        println!(
            "{} Config file already exists: {}",
            emoji(WARNING),
            style(config::CONFIG_FILE_NAME).cyan()
        );
        println!("   Delete it first or edit manually to update.");
        return Ok(());
    }

    let defaults = ConfigFile::default();
    ConfigLoader::save(&defaults, dir)?;

    println!(
        "{} Created {}",
        emoji(CHECKMARK),
        style(config::CONFIG_FILE_NAME).cyan().bold()
    );
    println!();
    println!("{} Defaults:", emoji(INFO));
    let b = &defaults.budget;
    for (name, budget) in [("initial", &b.initial), ("subload", &b.subload), ("zipped", &b.zipped)] {
        if let Some(max) = budget.max_size_kb {
            println!("   {} {} max {} KB", style("•").dim(), name, style(max).green());
        }
    }
    if let Some(max) = b.max_files {
        println!("   {} max files {}", style("•").dim(), style(max).green());
    }
    if let Some(max) = b.max_initial_requests {
        println!("   {} max initial requests {}", style("•").dim(), style(max).green());
    }
    println!();
    println!(
        "   Run {} to audit a creative",
        style("h5-audit audit <DIR>").cyan()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_default_config() {
        let dir = TempDir::new().unwrap();
        init_in(dir.path()).unwrap();

        assert!(ConfigLoader::exists(dir.path()));
        let loaded = ConfigLoader::load(dir.path()).unwrap();
        assert_eq!(loaded, ConfigFile::default());
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(config::CONFIG_FILE_NAME);
        std::fs::write(&path, "profiles = [\"iab\"]\n").unwrap();

        init_in(dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "profiles = [\"iab\"]\n"
        );
    }
}
