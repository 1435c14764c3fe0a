//! Check registry and parallel runner

use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;

use super::{default_checks, Check, CheckContext, CheckMeta, Priority};
use crate::config::Settings;
use crate::findings::{Finding, FindingOffender, Severity};

/// Registry for audit checks
///
/// Checks are kept sorted by priority (required first); registration order
/// is preserved within a priority.
///
/// # Examples
///
/// ```
/// use h5_audit::checks::CheckRegistry;
/// use h5_audit::config::Settings;
///
/// let registry = CheckRegistry::with_default_checks();
/// assert!(registry.count() > 0);
/// assert!(registry.required_ids(&Settings::default()).contains("missing-assets"));
/// ```
#[derive(Default)]
pub struct CheckRegistry {
    checks: RwLock<Vec<Arc<dyn Check>>>,
}

impl CheckRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in catalog
    pub fn with_default_checks() -> Self {
        let registry = Self::new();
        for check in default_checks() {
            registry.register(check);
        }
        registry
    }

    /// Register a check; returns false if the id is already taken
    pub fn register(&self, check: Arc<dyn Check>) -> bool {
        let mut checks = self.checks.write();
        let id = check.meta().id;
        if checks.iter().any(|c| c.meta().id == id) {
            log::warn!("check '{}' already registered, ignoring duplicate", id);
            return false;
        }
        checks.push(check);
        // Stable sort keeps registration order within a priority
        checks.sort_by_key(|c| c.meta().priority);
        true
    }

    /// Get check count
    pub fn count(&self) -> usize {
        self.checks.read().len()
    }

    /// Metadata of every registered check
    pub fn metas(&self) -> Vec<CheckMeta> {
        self.checks.read().iter().map(|c| *c.meta()).collect()
    }

    /// Checks whose profiles intersect the selection and that are not disabled
    pub fn applicable(&self, settings: &Settings) -> Vec<Arc<dyn Check>> {
        self.checks
            .read()
            .iter()
            .filter(|c| settings.is_active(c.meta().profiles) && !settings.is_disabled(c.meta().id))
            .cloned()
            .collect()
    }

    /// Ids whose findings decide the bundle status
    pub fn required_ids(&self, settings: &Settings) -> BTreeSet<String> {
        self.applicable(settings)
            .iter()
            .filter(|c| c.meta().priority == Priority::Required)
            .map(|c| c.meta().id.to_string())
            .collect()
    }

    /// Run every applicable check, one finding per check
    ///
    /// Checks run in parallel; findings come back in registry order. A check
    /// that returns an error or panics yields a FAIL finding carrying the
    /// message as its only offender.
    pub fn run(&self, ctx: &CheckContext<'_>) -> Vec<Finding> {
        let checks = self.applicable(ctx.settings);
        log::debug!("running {} checks", checks.len());
        checks.par_iter().map(|check| run_one(check.as_ref(), ctx)).collect()
    }
}

fn run_one(check: &dyn Check, ctx: &CheckContext<'_>) -> Finding {
    let meta = check.meta();
    match catch_unwind(AssertUnwindSafe(|| check.execute(ctx))) {
        Ok(Ok(mut finding)) => {
            if finding.id != meta.id {
                log::warn!("check '{}' returned finding id '{}'", meta.id, finding.id);
                finding.id = meta.id.to_string();
            }
            finding
        }
        Ok(Err(e)) => {
            log::warn!("check '{}' failed: {}", meta.id, e);
            failure(meta, e.to_string())
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "check panicked".to_string());
            log::warn!("check '{}' panicked: {}", meta.id, message);
            failure(meta, message)
        }
    }
}

fn failure(meta: &CheckMeta, message: String) -> Finding {
    meta.finding(Severity::Fail)
        .with_message("Check could not complete")
        .with_offenders([FindingOffender::new(meta.id).with_detail(message)])
}
