//! Run settings handed to every check

use std::collections::BTreeSet;

use super::file::{BudgetConfig, ConfigFile};
use super::Profile;

/// Profile selection and thresholds for one audit run
///
/// The pipeline only reads the profile selection and the disabled list;
/// threshold values are interpreted by the checks that own them.
///
/// # Examples
///
/// ```
/// use h5_audit::config::{Profile, Settings};
///
/// let settings = Settings::default().with_profiles([Profile::Iab]);
/// assert!(settings.is_active(&[Profile::Vendor, Profile::Iab]));
/// assert!(!settings.is_active(&[Profile::Vendor]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Active profiles
    pub profiles: BTreeSet<Profile>,
    /// Thresholds
    pub budget: BudgetConfig,
    /// Check ids that never run
    pub disabled_checks: BTreeSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&ConfigFile::default())
    }
}

impl Settings {
    /// Build settings from a parsed config file
    pub fn from_config(config: &ConfigFile) -> Self {
        let profiles: BTreeSet<Profile> = if config.profiles.is_empty() {
            Profile::ALL.into_iter().collect()
        } else {
            config.profiles.iter().copied().collect()
        };

        Self {
            profiles,
            budget: config.budget.clone(),
            disabled_checks: config.checks.disabled.iter().cloned().collect(),
        }
    }

    /// Replace the profile selection; an empty selection keeps the current one
    pub fn with_profiles(mut self, profiles: impl IntoIterator<Item = Profile>) -> Self {
        let selected: BTreeSet<Profile> = profiles.into_iter().collect();
        if !selected.is_empty() {
            self.profiles = selected;
        }
        self
    }

    /// Whether any of the given profiles is active
    pub fn is_active(&self, profiles: &[Profile]) -> bool {
        profiles.iter().any(|p| self.profiles.contains(p))
    }

    /// Whether a check id was disabled
    pub fn is_disabled(&self, id: &str) -> bool {
        self.disabled_checks.contains(id)
    }
}
