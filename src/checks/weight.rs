//! Weight budget and request count checks

use std::collections::BTreeSet;

use super::budget::BudgetChecker;
use super::{Check, CheckContext, CheckError, CheckMeta, Priority};
use crate::analyzer::{CompressedSizes, LoadPhaseMetrics};
use crate::config::{BudgetConfig, Profile, SizeBudget};
use crate::findings::{Finding, FindingOffender, OffenderCategory, Severity};
use crate::fmt::format_bytes;

/// Compressed weight of one load phase (or the archive) against a budget
pub struct WeightCheck {
    meta: CheckMeta,
    budget: fn(&BudgetConfig) -> &SizeBudget,
    measure: fn(&LoadPhaseMetrics) -> u64,
    files: fn(&LoadPhaseMetrics) -> Option<&BTreeSet<String>>,
}

impl WeightCheck {
    /// Initial-load weight against `budget.initial`
    pub fn initial() -> Self {
        Self {
            meta: CheckMeta {
                id: "initial-weight",
                title: "Initial load weight",
                description: "Compressed weight of everything needed before first render.",
                profiles: &[Profile::Iab],
                priority: Priority::Required,
                tags: &["weight"],
            },
            budget: |b| &b.initial,
            measure: |m| m.initial_bytes,
            files: |m| Some(&m.initial_files),
        }
    }

    /// Subload weight against `budget.subload`
    pub fn subload() -> Self {
        Self {
            meta: CheckMeta {
                id: "subload-weight",
                title: "Subload weight",
                description: "Compressed weight of assets loaded after the initial load.",
                profiles: &[Profile::Iab],
                priority: Priority::Recommended,
                tags: &["weight"],
            },
            budget: |b| &b.subload,
            measure: |m| m.subload_bytes,
            files: |m| Some(&m.subload_files),
        }
    }

    /// Archive size against `budget.zipped`
    pub fn zipped() -> Self {
        Self {
            meta: CheckMeta {
                id: "zipped-size",
                title: "Archive size",
                description: "Size of the uploaded package.",
                profiles: &[Profile::Vendor],
                priority: Priority::Required,
                tags: &["weight", "packaging"],
            },
            budget: |b| &b.zipped,
            measure: |m| m.zipped_bytes,
            files: |_| None,
        }
    }
}

impl Check for WeightCheck {
    fn meta(&self) -> &CheckMeta {
        &self.meta
    }

    fn execute(&self, ctx: &CheckContext<'_>) -> Result<Finding, CheckError> {
        let metrics = &ctx.partial.metrics;
        let result = BudgetChecker::new((self.budget)(&ctx.settings.budget)).check((self.measure)(metrics));
        let severity = result.status.severity();

        let mut finding = self
            .meta
            .finding(severity)
            .with_message(result.message.clone())
            .with_message(format!("Budget: {}", result.thresholds()));

        // Heaviest files first when over budget, by the same gzip size the budget counts
        if severity != Severity::Pass {
            if let Some(files) = (self.files)(metrics) {
                let sizes = CompressedSizes::new();
                let mut sized: Vec<(&str, u64, u64)> = files
                    .iter()
                    .map(|p| {
                        let raw = ctx.bundle.get(p).map_or(0, |c| c.len() as u64);
                        (p.as_str(), sizes.size_of(ctx.bundle, p), raw)
                    })
                    .collect();
                sized.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
                finding = finding.with_offenders(sized.into_iter().map(|(path, gzip, raw)| {
                    FindingOffender::new(path)
                        .with_detail(format!(
                            "{} gzip ({} uncompressed)",
                            format_bytes(gzip),
                            format_bytes(raw)
                        ))
                        .with_category(OffenderCategory::Assets)
                }));
            }
        }

        Ok(finding)
    }
}

/// Initial-load request count stays under the ceiling
pub struct RequestCount;

static REQUEST_COUNT: CheckMeta = CheckMeta {
    id: "request-count",
    title: "Initial requests",
    description: "Number of files and external requests made during the initial load.",
    profiles: &[Profile::Iab],
    priority: Priority::Recommended,
    tags: &["weight", "network"],
};

impl Check for RequestCount {
    fn meta(&self) -> &CheckMeta {
        &REQUEST_COUNT
    }

    fn execute(&self, ctx: &CheckContext<'_>) -> Result<Finding, CheckError> {
        let metrics = &ctx.partial.metrics;
        let count = metrics.initial_requests;
        let summary = format!(
            "{} initial, {} subload, {} total requests",
            count, metrics.subload_requests, metrics.total_requests
        );

        match ctx.settings.budget.max_initial_requests {
            Some(max) if count > max => Ok(REQUEST_COUNT
                .finding(Severity::Warn)
                .with_message(summary)
                .with_message(format!("Initial requests exceed the limit of {}", max))
                .with_offenders(metrics.initial_hosts.iter().map(|h| {
                    FindingOffender::new(h.as_str())
                        .with_detail("external host in initial load")
                        .with_category(OffenderCategory::Environment)
                }))),
            _ => Ok(REQUEST_COUNT.finding(Severity::Pass).with_message(summary)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::Bundle;
    use crate::checks::test_support::Fixture;

    fn noise(len: usize) -> Vec<u8> {
        let mut x: u32 = 0x9E37_79B9;
        (0..len)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                (x >> 24) as u8
            })
            .collect()
    }

    fn fixture(initial_kb: u64, zipped_kb: u64) -> Fixture {
        let bundle = Bundle::from_files(
            "ad",
            vec![
                ("index.html".to_string(), b"<html></html>".to_vec()),
                ("big.js".to_string(), vec![0; 4096]),
                ("small.js".to_string(), vec![0; 10]),
                ("noise.js".to_string(), noise(2000)),
            ],
        );
        let mut f = Fixture::from_bundle(bundle);
        let m = &mut f.partial.metrics;
        m.initial_files = ["index.html", "big.js", "small.js", "noise.js"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        m.initial_bytes = initial_kb * 1024;
        m.zipped_bytes = zipped_kb * 1024;
        f
    }

    #[test]
    fn test_initial_weight_under_budget_passes() {
        let f = fixture(100, 0);
        let finding = WeightCheck::initial().execute(&f.ctx()).unwrap();
        assert_eq!(finding.severity, Severity::Pass);
        assert!(finding.offenders.is_empty());
    }

    #[test]
    fn test_initial_weight_over_max_fails_with_heaviest_compressed_first() {
        let f = fixture(151, 0);
        let finding = WeightCheck::initial().execute(&f.ctx()).unwrap();
        assert_eq!(finding.severity, Severity::Fail);
        assert_eq!(finding.offenders.len(), 4);
        // Ranked by compressed size: 4 KB of zeros gzips below 2 KB of noise
        assert_eq!(finding.offenders[0].path, "noise.js");
        let detail = finding.offenders[0].detail.as_deref().unwrap();
        assert!(detail.contains("gzip"));
        assert!(detail.contains("uncompressed"));
    }

    #[test]
    fn test_initial_weight_warning_tier_warns() {
        let mut f = fixture(130, 0);
        f.settings.budget.initial = SizeBudget {
            target_size_kb: Some(100),
            warn_threshold_kb: Some(120),
            max_size_kb: Some(150),
        };
        let finding = WeightCheck::initial().execute(&f.ctx()).unwrap();
        assert_eq!(finding.severity, Severity::Warn);
    }

    #[test]
    fn test_zipped_size_has_no_file_offenders() {
        let f = fixture(0, 500);
        let finding = WeightCheck::zipped().execute(&f.ctx()).unwrap();
        assert_eq!(finding.severity, Severity::Fail);
        assert!(finding.offenders.is_empty());
        assert_eq!(finding.id, "zipped-size");
    }

    #[test]
    fn test_request_count_over_limit_warns() {
        let mut f = fixture(0, 0);
        f.partial.metrics.initial_requests = 16;
        f.partial.metrics.initial_hosts.insert("cdn.example.com".to_string());
        let finding = RequestCount.execute(&f.ctx()).unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert_eq!(finding.offenders[0].path, "cdn.example.com");

        f.settings.budget.max_initial_requests = None;
        assert_eq!(RequestCount.execute(&f.ctx()).unwrap().severity, Severity::Pass);
    }
}
