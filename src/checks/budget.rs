//! Three-tier size budget evaluation
//!
//! - Target: ideal size goal (informational)
//! - Warning: threshold for warnings (WARN)
//! - Max: hard limit (FAIL)

use crate::config::SizeBudget;
use crate::findings::Severity;
use crate::fmt::format_bytes;

/// Status of size budget check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    /// Under target size
    UnderTarget,
    /// Between target and warning threshold
    AboveTarget,
    /// Between warning and max
    Warning,
    /// Over max size
    OverBudget,
}

impl BudgetStatus {
    /// Finding severity for this status
    pub fn severity(&self) -> Severity {
        match self {
            BudgetStatus::UnderTarget | BudgetStatus::AboveTarget => Severity::Pass,
            BudgetStatus::Warning => Severity::Warn,
            BudgetStatus::OverBudget => Severity::Fail,
        }
    }
}

/// Result of budget check with detailed information
#[derive(Debug, Clone)]
pub struct BudgetResult {
    /// Budget status
    pub status: BudgetStatus,
    /// Measured size in bytes
    pub size_bytes: u64,
    /// Measured size in KB
    pub size_kb: f64,
    /// Target size if set
    pub target_kb: Option<u64>,
    /// Warning threshold if set
    pub warn_threshold_kb: Option<u64>,
    /// Maximum allowed size if set
    pub max_size_kb: Option<u64>,
    /// Human-readable message
    pub message: String,
}

impl BudgetResult {
    /// One-line summary of the configured thresholds
    pub fn thresholds(&self) -> String {
        let parts: Vec<String> = [
            ("target", self.target_kb),
            ("warn", self.warn_threshold_kb),
            ("max", self.max_size_kb),
        ]
        .iter()
        .filter_map(|(name, kb)| kb.map(|kb| format!("{} {} KB", name, kb)))
        .collect();

        if parts.is_empty() {
            "no limits configured".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Size budget checker
pub struct BudgetChecker<'a> {
    budget: &'a SizeBudget,
}

impl<'a> BudgetChecker<'a> {
    /// Create a new budget checker
    pub fn new(budget: &'a SizeBudget) -> Self {
        Self { budget }
    }

    /// Determine budget status based on size and thresholds
    ///
    /// Priority order: max > warn > target
    fn determine_status(&self, size_kb: f64) -> BudgetStatus {
        if let Some(max) = self.budget.max_size_kb {
            if size_kb > max as f64 {
                return BudgetStatus::OverBudget;
            }
        }

        if let Some(warn) = self.budget.warn_threshold_kb {
            if size_kb > warn as f64 {
                return BudgetStatus::Warning;
            }
        }

        if let Some(target) = self.budget.target_size_kb {
            if size_kb <= target as f64 {
                return BudgetStatus::UnderTarget;
            } else {
                return BudgetStatus::AboveTarget;
            }
        }

        // Within limits with no target: any configured limit means "above target"
        if self.budget.max_size_kb.is_some() || self.budget.warn_threshold_kb.is_some() {
            BudgetStatus::AboveTarget
        } else {
            BudgetStatus::UnderTarget
        }
    }

    /// Check a byte count against the budget
    ///
    /// # Examples
    ///
    /// ```
    /// use h5_audit::checks::{BudgetChecker, BudgetStatus};
    /// use h5_audit::config::SizeBudget;
    ///
    /// let budget = SizeBudget {
    ///     target_size_kb: Some(100),
    ///     warn_threshold_kb: Some(120),
    ///     max_size_kb: Some(150),
    /// };
    /// let result = BudgetChecker::new(&budget).check(130 * 1024);
    /// assert_eq!(result.status, BudgetStatus::Warning);
    /// ```
    pub fn check(&self, size_bytes: u64) -> BudgetResult {
        let size_kb = size_bytes as f64 / 1024.0;
        let status = self.determine_status(size_kb);
        let size = format_bytes(size_bytes);

        let message = match status {
            BudgetStatus::UnderTarget => match self.budget.target_size_kb {
                Some(target) => format!("{} is under target by {:.2} KB", size, target as f64 - size_kb),
                None => format!("{} (size OK)", size),
            },
            BudgetStatus::AboveTarget => match self.budget.target_size_kb {
                Some(target) => format!(
                    "{} is above target by {:.2} KB (still within limits)",
                    size,
                    size_kb - target as f64
                ),
                None => format!("{} (size OK)", size),
            },
            BudgetStatus::Warning => match self.budget.warn_threshold_kb {
                Some(warn) => format!(
                    "{} is {:.2} KB over the warning threshold",
                    size,
                    size_kb - warn as f64
                ),
                None => format!("{} exceeds the warning threshold", size),
            },
            BudgetStatus::OverBudget => match self.budget.max_size_kb {
                Some(max) => format!("{} is {:.2} KB over budget", size, size_kb - max as f64),
                None => format!("{} exceeds the budget", size),
            },
        };

        BudgetResult {
            status,
            size_bytes,
            size_kb,
            target_kb: self.budget.target_size_kb,
            warn_threshold_kb: self.budget.warn_threshold_kb,
            max_size_kb: self.budget.max_size_kb,
            message,
        }
    }
}
