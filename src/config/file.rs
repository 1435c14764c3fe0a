//! Configuration file data structures

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::Profile;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = ".h5-audit.toml";

/// h5-audit configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Active profiles (all when empty)
    #[serde(default = "default_profiles")]
    pub profiles: Vec<Profile>,

    /// Weight and count thresholds read by individual checks
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Check enablement
    #[serde(default)]
    pub checks: CheckToggles,
}

fn default_profiles() -> Vec<Profile> {
    Profile::ALL.to_vec()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            profiles: default_profiles(),
            budget: BudgetConfig::default(),
            checks: CheckToggles::default(),
        }
    }
}

/// Three-tier size budget
///
/// - Target: ideal size goal (informational)
/// - Warning: threshold for warnings
/// - Max: hard limit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeBudget {
    /// Maximum size in KB (hard limit)
    #[serde(rename = "max-size-kb", skip_serializing_if = "Option::is_none")]
    pub max_size_kb: Option<u64>,

    /// Warning threshold in KB
    #[serde(rename = "warn-threshold-kb", skip_serializing_if = "Option::is_none")]
    pub warn_threshold_kb: Option<u64>,

    /// Target size in KB (ideal target)
    #[serde(rename = "target-size-kb", skip_serializing_if = "Option::is_none")]
    pub target_size_kb: Option<u64>,
}

impl SizeBudget {
    /// Budget with only a hard limit
    pub fn max(max_size_kb: u64) -> Self {
        Self {
            max_size_kb: Some(max_size_kb),
            ..Self::default()
        }
    }

    /// Validate that budget thresholds are properly ordered
    ///
    /// Ensures: target <= warn <= max
    pub fn validate(&self) -> Result<()> {
        if let (Some(target), Some(warn)) = (self.target_size_kb, self.warn_threshold_kb) {
            if target > warn {
                anyhow::bail!(
                    "Target size ({} KB) cannot exceed warning threshold ({} KB)",
                    target,
                    warn
                );
            }
        }

        if let (Some(warn), Some(max)) = (self.warn_threshold_kb, self.max_size_kb) {
            if warn > max {
                anyhow::bail!(
                    "Warning threshold ({} KB) cannot exceed max size ({} KB)",
                    warn,
                    max
                );
            }
        }

        if let (Some(target), Some(max)) = (self.target_size_kb, self.max_size_kb) {
            if target > max {
                anyhow::bail!(
                    "Target size ({} KB) cannot exceed max size ({} KB)",
                    target,
                    max
                );
            }
        }

        Ok(())
    }
}

/// Thresholds consumed by the weight and count checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Compressed initial-load weight
    pub initial: SizeBudget,

    /// Compressed polite/subload weight
    pub subload: SizeBudget,

    /// Archive weight
    pub zipped: SizeBudget,

    /// Maximum number of files in the package
    #[serde(rename = "max-files", skip_serializing_if = "Option::is_none")]
    pub max_files: Option<usize>,

    /// Maximum number of initial-load requests
    #[serde(rename = "max-initial-requests", skip_serializing_if = "Option::is_none")]
    pub max_initial_requests: Option<usize>,

    /// Maximum time to first render reported by the runtime preview
    #[serde(rename = "max-render-ms", skip_serializing_if = "Option::is_none")]
    pub max_render_ms: Option<u64>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            initial: SizeBudget::max(150),
            subload: SizeBudget::max(1024),
            zipped: SizeBudget::max(200),
            max_files: Some(100),
            max_initial_requests: Some(15),
            max_render_ms: Some(1000),
        }
    }
}

impl BudgetConfig {
    /// Validate every size budget, then initial max <= zipped max
    pub fn validate(&self) -> Result<()> {
        for (name, budget) in [
            ("initial", &self.initial),
            ("subload", &self.subload),
            ("zipped", &self.zipped),
        ] {
            budget
                .validate()
                .map_err(|e| anyhow::anyhow!("budget.{}: {}", name, e))?;
        }

        // Initial-load assets ship inside the archive
        if let (Some(initial), Some(zipped)) = (self.initial.max_size_kb, self.zipped.max_size_kb) {
            if initial > zipped {
                anyhow::bail!(
                    "budget.initial max size ({} KB) cannot exceed budget.zipped max size ({} KB)",
                    initial,
                    zipped
                );
            }
        }
        Ok(())
    }
}

/// Check enablement section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckToggles {
    /// Check ids that never run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<String>,
}
