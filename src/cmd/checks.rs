//! Checks command implementation
//!
//! Handles `h5-audit checks`, which lists the registered checks.

use anyhow::Result;
use console::style;

use crate::checks::{CheckMeta, CheckRegistry, Priority};
use crate::config::Settings;
use crate::fmt::{emoji, INFO};

/// Print the built-in check catalog
///
/// With `json`, prints the metadata array instead. Checks outside the active
/// profiles (per `settings`) are dimmed.
pub fn cmd_checks(settings: &Settings, json: bool) -> Result<()> {
    let registry = CheckRegistry::with_default_checks();
    let metas = registry.metas();

    if json {
        println!("{}", serde_json::to_string_pretty(&metas)?);
        return Ok(());
    }

    println!("{} {} registered checks", emoji(INFO), metas.len());
    println!();
    for meta in &metas {
        println!("{}", format_meta(meta, settings.is_active(meta.profiles)));
    }
    Ok(())
}

fn format_meta(meta: &CheckMeta, active: bool) -> String {
    let profiles: Vec<&str> = meta.profiles.iter().map(|p| p.as_str()).collect();
    let priority = match meta.priority {
        Priority::Required => style(meta.priority.as_str()).red(),
        Priority::Recommended => style(meta.priority.as_str()).yellow(),
        Priority::Advisory => style(meta.priority.as_str()).dim(),
    };
    let id = if active {
        style(meta.id).cyan().bold()
    } else {
        style(meta.id).dim()
    };
    format!(
        "   {:<20} {:<12} {:<12} {}",
        id,
        priority,
        profiles.join(","),
        meta.title
    )
}
