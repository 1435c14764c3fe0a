//! Per-bundle audit result and its summary
//!
//! A [`BundleResult`] is a plain serializable record. After the static pass
//! the only way to change it is [`BundleResult::patch_finding`], which
//! replaces one finding by id and recomputes the summary.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::analyzer::{AdSize, LoadPhaseMetrics, PrimaryAsset, Reference, SizeSourceInfo};
use crate::checks::runtime::{time_to_render_finding, RuntimeMetrics};
use crate::config::Settings;
use crate::findings::{Finding, Severity, Verdict};

/// Aggregate counts and headline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleResultSummary {
    /// Number of findings
    pub total: usize,
    /// PASS findings
    pub pass: usize,
    /// WARN findings
    pub warn: usize,
    /// FAIL findings
    pub fail: usize,
    /// PENDING findings
    pub pending: usize,
    /// Bundle files nothing references
    pub orphans: usize,
    /// Local references with no file behind them
    pub missing: usize,
    /// Worst verdict among required findings
    pub status: Verdict,
}

impl BundleResultSummary {
    /// Count findings and fold the status over the required ids
    ///
    /// Pending findings are counted but never reach the status.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use h5_audit::findings::{Finding, Severity, Verdict};
    /// use h5_audit::result::BundleResultSummary;
    ///
    /// let findings = vec![
    ///     Finding::new("ad-size", "Ad size", Severity::Pass),
    ///     Finding::new("file-count", "File count", Severity::Fail),
    /// ];
    /// let required: BTreeSet<String> = ["ad-size".to_string()].into();
    ///
    /// let summary = BundleResultSummary::compute(&findings, &required, 0, 0);
    /// assert_eq!(summary.fail, 1);
    /// assert_eq!(summary.status, Verdict::Pass);
    /// ```
    pub fn compute(
        findings: &[Finding],
        required: &BTreeSet<String>,
        orphans: usize,
        missing: usize,
    ) -> Self {
        let mut summary = Self {
            total: findings.len(),
            pass: 0,
            warn: 0,
            fail: 0,
            pending: 0,
            orphans,
            missing,
            status: Verdict::Pass,
        };

        for finding in findings {
            match finding.severity {
                Severity::Pass => summary.pass += 1,
                Severity::Warn => summary.warn += 1,
                Severity::Fail => summary.fail += 1,
                Severity::Pending => summary.pending += 1,
            }
        }

        summary.status = findings
            .iter()
            .filter(|f| required.contains(&f.id))
            .filter_map(|f| f.severity.verdict())
            .fold(Verdict::Pass, Verdict::worst);

        summary
    }
}

/// Everything known about one audited bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleResult {
    /// Opaque bundle id
    pub bundle_id: String,
    /// Bundle name
    pub bundle_name: String,
    /// Entry document
    pub primary: PrimaryAsset,
    /// Detected creative size
    pub ad_size: Option<AdSize>,
    /// How the size was detected
    pub ad_size_source: Option<SizeSourceInfo>,
    /// One finding per executed check
    pub findings: Vec<Finding>,
    /// Every resolved reference
    pub references: Vec<Reference>,
    /// Counts and status
    pub summary: BundleResultSummary,
    /// Check ids folded into `summary.status`
    pub required_checks: BTreeSet<String>,
    /// Load-phase partition and weights
    #[serde(flatten)]
    pub metrics: LoadPhaseMetrics,
}

impl BundleResult {
    /// Finding with the given check id
    pub fn finding(&self, id: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.id == id)
    }

    /// Replace the finding with the same id and recompute the summary
    ///
    /// Returns `false` (and changes nothing) when no finding has that id.
    pub fn patch_finding(&mut self, finding: Finding) -> bool {
        let Some(slot) = self.findings.iter_mut().find(|f| f.id == finding.id) else {
            log::debug!("{}: no finding '{}' to patch", self.bundle_name, finding.id);
            return false;
        };
        *slot = finding;
        self.recompute_summary();
        true
    }

    /// Merge runtime measurements into their pending findings
    ///
    /// Returns whether any finding changed.
    pub fn apply_runtime(&mut self, metrics: &RuntimeMetrics, settings: &Settings) -> bool {
        match time_to_render_finding(metrics, settings) {
            Some(finding) => self.patch_finding(finding),
            None => false,
        }
    }

    /// Rebuild `summary` from the current findings
    pub fn recompute_summary(&mut self) {
        self.summary = BundleResultSummary::compute(
            &self.findings,
            &self.required_checks,
            self.summary.orphans,
            self.summary.missing,
        );
    }

    /// Findings with the given severity
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(findings: Vec<Finding>, required: &[&str]) -> BundleResult {
        let required_checks: BTreeSet<String> = required.iter().map(|s| s.to_string()).collect();
        let summary = BundleResultSummary::compute(&findings, &required_checks, 1, 2);
        BundleResult {
            bundle_id: "id".to_string(),
            bundle_name: "ad".to_string(),
            primary: PrimaryAsset::new("index.html"),
            ad_size: None,
            ad_size_source: None,
            findings,
            references: Vec::new(),
            summary,
            required_checks,
            metrics: LoadPhaseMetrics::default(),
        }
    }

    #[test]
    fn test_summary_status_ignores_non_required_findings() {
        let r = result(
            vec![
                Finding::new("a", "A", Severity::Pass),
                Finding::new("b", "B", Severity::Fail),
            ],
            &["a"],
        );
        assert_eq!(r.summary.status, Verdict::Pass);
        assert_eq!(r.summary.pass, 1);
        assert_eq!(r.summary.fail, 1);
        assert_eq!(r.summary.total, 2);
    }

    #[test]
    fn test_summary_status_never_folds_pending() {
        let r = result(vec![Finding::new("t", "T", Severity::Pending)], &["t"]);
        assert_eq!(r.summary.status, Verdict::Pass);
        assert_eq!(r.summary.pending, 1);
    }

    #[test]
    fn test_patch_finding_replaces_and_recomputes() {
        let mut r = result(vec![Finding::new("a", "A", Severity::Pass)], &["a"]);
        assert!(r.patch_finding(Finding::new("a", "A", Severity::Fail)));
        assert_eq!(r.summary.status, Verdict::Fail);
        assert_eq!(r.summary.fail, 1);
        assert_eq!(r.summary.orphans, 1);
        assert_eq!(r.summary.missing, 2);
        assert_eq!(r.findings.len(), 1);
    }

    #[test]
    fn test_patch_finding_unknown_id_is_noop() {
        let mut r = result(vec![Finding::new("a", "A", Severity::Pass)], &["a"]);
        let before = r.clone();
        assert!(!r.patch_finding(Finding::new("zzz", "Z", Severity::Fail)));
        assert_eq!(r, before);
    }

    #[test]
    fn test_apply_runtime_completes_pending_time_to_render() {
        let mut r = result(
            vec![Finding::new("time-to-render", "Time to render", Severity::Pending)],
            &[],
        );
        let metrics = RuntimeMetrics {
            time_to_render_ms: Some(5000),
        };
        assert!(r.apply_runtime(&metrics, &Settings::default()));
        assert_eq!(r.finding("time-to-render").unwrap().severity, Severity::Fail);
        assert_eq!(r.summary.pending, 0);
        // Advisory check, status unaffected
        assert_eq!(r.summary.status, Verdict::Pass);
    }

    #[test]
    fn test_bundle_result_serializes_flat_camel_case_metrics() {
        let r = result(Vec::new(), &[]);
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("initialBytes").is_some());
        assert!(json.get("zippedBytes").is_some());
        assert!(json.get("requiredChecks").is_some());
        assert_eq!(json["summary"]["status"], "PASS");
    }
}
