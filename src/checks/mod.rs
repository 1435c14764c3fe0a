//! Pluggable audit checks
//!
//! A check is a value implementing [`Check`]: static metadata plus an
//! `execute` function over the shared, read-only [`CheckContext`]. Checks
//! never see each other's findings and never mutate the context, so the
//! [`CheckRegistry`] is free to run them in any order and in parallel.
//!
//! # Examples
//!
//! ```
//! use h5_audit::checks::{Check, CheckContext, CheckError, CheckMeta, Priority};
//! use h5_audit::config::Profile;
//! use h5_audit::findings::{Finding, Severity};
//!
//! struct HasReadme;
//!
//! static META: CheckMeta = CheckMeta {
//!     id: "has-readme",
//!     title: "Bundle ships a README",
//!     description: "Trafficking notes travel with the creative.",
//!     profiles: &[Profile::Vendor],
//!     priority: Priority::Advisory,
//!     tags: &["packaging"],
//! };
//!
//! impl Check for HasReadme {
//!     fn meta(&self) -> &CheckMeta {
//!         &META
//!     }
//!
//!     fn execute(&self, ctx: &CheckContext<'_>) -> Result<Finding, CheckError> {
//!         let found = ctx.files.iter().any(|f| f.eq_ignore_ascii_case("readme.txt"));
//!         let severity = if found { Severity::Pass } else { Severity::Warn };
//!         Ok(META.finding(severity))
//!     }
//! }
//! ```

pub mod assets;
pub mod budget;
pub mod dimensions;
pub mod packaging;
pub mod registry;
pub mod runtime;
pub mod weight;

pub use budget::{BudgetChecker, BudgetResult, BudgetStatus};
pub use registry::CheckRegistry;
pub use runtime::RuntimeMetrics;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::analyzer::{AdSize, LoadPhaseMetrics, Reference, SizeSourceInfo};
use crate::bundle::Bundle;
use crate::config::{Profile, Settings};
use crate::findings::{Finding, Severity};

/// How much a check matters for the bundle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Counts toward the bundle status
    Required,
    /// Reported, never affects status
    Recommended,
    /// Informational
    Advisory,
}

impl Priority {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Required => "required",
            Priority::Recommended => "recommended",
            Priority::Advisory => "advisory",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckMeta {
    /// Stable unique id
    pub id: &'static str,
    /// Human title
    pub title: &'static str,
    /// What the check enforces
    pub description: &'static str,
    /// Profiles the check applies to
    pub profiles: &'static [Profile],
    /// Status weight
    pub priority: Priority,
    /// Free-form tags
    pub tags: &'static [&'static str],
}

impl CheckMeta {
    /// Empty finding carrying this check's id, title, profiles and description
    pub fn finding(&self, severity: Severity) -> Finding {
        Finding::new(self.id, self.title, severity)
            .with_profiles(self.profiles)
            .with_description(self.description)
    }
}

/// Why a check could not produce a verdict
#[derive(Error, Debug)]
pub enum CheckError {
    /// A file the check needed could not be read
    #[error("{path}: {reason}")]
    Unreadable {
        /// Bundle path
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Anything else
    #[error("{0}")]
    Failed(String),
}

/// Results of earlier pipeline stages, readable by every check
#[derive(Debug, Clone, Default)]
pub struct PartialResult {
    /// Detected creative size
    pub ad_size: Option<AdSize>,
    /// How the size was detected
    pub ad_size_source: Option<SizeSourceInfo>,
    /// Load-phase partition and totals
    pub metrics: LoadPhaseMetrics,
}

/// Everything a check may read
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    /// The bundle under audit
    pub bundle: &'a Bundle,
    /// Canonical bundle paths, sorted
    pub files: &'a [String],
    /// Primary document path
    pub primary: &'a str,
    /// Primary document text
    pub primary_text: &'a str,
    /// Resolved references
    pub references: &'a [Reference],
    /// Profiles and thresholds
    pub settings: &'a Settings,
    /// Earlier stage results
    pub partial: &'a PartialResult,
}

/// One audit rule
pub trait Check: Send + Sync {
    /// Static metadata
    fn meta(&self) -> &CheckMeta;

    /// Evaluate against a bundle
    ///
    /// Errors (and panics) are turned into a FAIL finding by the runner.
    fn execute(&self, ctx: &CheckContext<'_>) -> Result<Finding, CheckError>;
}

/// The built-in check catalog
pub fn default_checks() -> Vec<Arc<dyn Check>> {
    vec![
        Arc::new(packaging::PrimaryHtml),
        Arc::new(dimensions::AdSizeCheck),
        Arc::new(assets::MissingAssets),
        Arc::new(assets::OrphanAssets),
        Arc::new(assets::InsecureRequests),
        Arc::new(weight::WeightCheck::initial()),
        Arc::new(weight::WeightCheck::subload()),
        Arc::new(weight::WeightCheck::zipped()),
        Arc::new(packaging::FileCount),
        Arc::new(weight::RequestCount),
        Arc::new(packaging::InvalidFilenames),
        Arc::new(runtime::TimeToRender),
    ]
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_checks_have_unique_ids() {
        let checks = default_checks();
        let ids: HashSet<&str> = checks.iter().map(|c| c.meta().id).collect();
        assert_eq!(ids.len(), checks.len());
    }

    #[test]
    fn test_default_checks_declare_profiles() {
        for check in default_checks() {
            assert!(!check.meta().profiles.is_empty(), "{}", check.meta().id);
        }
    }

    #[test]
    fn test_meta_finding_carries_metadata() {
        let meta = CheckMeta {
            id: "x",
            title: "X",
            description: "does x",
            profiles: &[Profile::Iab],
            priority: Priority::Advisory,
            tags: &[],
        };
        let finding = meta.finding(Severity::Warn);
        assert_eq!(finding.id, "x");
        assert_eq!(finding.profiles, vec![Profile::Iab]);
        assert_eq!(finding.description.as_deref(), Some("does x"));
    }

    #[test]
    fn test_priority_orders_required_first() {
        assert!(Priority::Required < Priority::Recommended);
        assert!(Priority::Recommended < Priority::Advisory);
    }
}
