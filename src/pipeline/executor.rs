//! Audit pipeline executor
//!
//! Runs the stages in order for one bundle:
//! 1. Discover the primary document
//! 2. Parse it and detect the creative size
//! 3. Collect and resolve references across HTML, CSS and scripts
//! 4. Classify load phases and total compressed weight
//! 5. Run every applicable check against the shared context
//! 6. Aggregate findings into a [`BundleResult`]
//!
//! Each stage only reads what earlier stages produced. Nothing is shared
//! between bundles, so [`Auditor::audit_all`] runs them in parallel.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use super::error::PipelineError;
use super::telemetry::{AuditEvent, MetricsCollector, NoOpCollector};
use crate::analyzer::{
    classify, collect_all, detect_size, discover_primary, missing_references, orphan_files,
    CompressedSizes, HtmlDocument, PrimaryAsset,
};
use crate::bundle::Bundle;
use crate::checks::{CheckContext, CheckRegistry, PartialResult};
use crate::config::Settings;
use crate::result::{BundleResult, BundleResultSummary};

/// Runs the audit pipeline with one registry and one set of settings
///
/// # Examples
///
/// ```
/// use h5_audit::bundle::Bundle;
/// use h5_audit::config::Settings;
/// use h5_audit::findings::Verdict;
/// use h5_audit::pipeline::Auditor;
///
/// let html = r#"<meta name="ad.size" content="width=300,height=250"><p>Hi</p>"#;
/// let bundle = Bundle::from_files("300x250", vec![
///     ("index.html".to_string(), html.as_bytes().to_vec()),
/// ]);
///
/// let result = Auditor::new(Settings::default()).audit(&bundle).unwrap();
/// assert_eq!(result.primary.path, "index.html");
/// assert_eq!(result.ad_size.unwrap().to_string(), "300x250");
/// assert_eq!(result.summary.status, Verdict::Pass);
/// ```
pub struct Auditor {
    registry: Arc<CheckRegistry>,
    settings: Settings,
    collector: Arc<dyn MetricsCollector>,
}

impl Auditor {
    /// Auditor over the built-in check catalog
    pub fn new(settings: Settings) -> Self {
        Self::with_registry(Arc::new(CheckRegistry::with_default_checks()), settings)
    }

    /// Auditor over a custom registry
    pub fn with_registry(registry: Arc<CheckRegistry>, settings: Settings) -> Self {
        Self {
            registry,
            settings,
            collector: Arc::new(NoOpCollector),
        }
    }

    /// Report telemetry to the given collector
    pub fn with_collector(mut self, collector: Arc<dyn MetricsCollector>) -> Self {
        self.collector = collector;
        self
    }

    /// The check registry
    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Profiles and thresholds in use
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Audit one bundle
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyBundle`] for a bundle with no files and
    /// [`PipelineError::NoPrimaryDocument`] when discovery finds no entry
    /// document. Every other problem is reported as a finding.
    pub fn audit(&self, bundle: &Bundle) -> Result<BundleResult, PipelineError> {
        let name = bundle.name();
        self.collector.record_event(AuditEvent::Started, name);

        let result = self.run_stages(bundle);
        let event = if result.is_ok() {
            AuditEvent::Completed
        } else {
            AuditEvent::Failed
        };
        self.collector.record_event(event, name);
        result
    }

    /// Audit many bundles in parallel, results in input order
    pub fn audit_all(&self, bundles: &[Bundle]) -> Vec<Result<BundleResult, PipelineError>> {
        bundles.par_iter().map(|b| self.audit(b)).collect()
    }

    fn run_stages(&self, bundle: &Bundle) -> Result<BundleResult, PipelineError> {
        let name = bundle.name();
        if bundle.is_empty() {
            return Err(PipelineError::EmptyBundle {
                bundle: name.to_string(),
            });
        }

        let started = Instant::now();
        let primary = discover_primary(bundle).ok_or_else(|| PipelineError::NoPrimaryDocument {
            bundle: name.to_string(),
        })?;
        log::debug!("{}: primary document {}", name, primary);
        self.collector.record_stage(name, "discovery", started.elapsed());

        let started = Instant::now();
        let primary_text = bundle.text(&primary).unwrap_or_default();
        let doc = HtmlDocument::parse(&primary_text);
        let detected = detect_size(bundle, &primary, &doc);
        match &detected {
            Some(d) => log::debug!("{}: size {} via {}", name, d.size, d.source.method),
            None => log::debug!("{}: no size detected", name),
        }
        self.collector.record_stage(name, "parse", started.elapsed());

        let started = Instant::now();
        let references = collect_all(bundle, &primary, &doc);
        log::debug!("{}: {} references", name, references.len());
        self.collector.record_stage(name, "resolve", started.elapsed());

        let started = Instant::now();
        let sizes = CompressedSizes::new();
        let metrics = classify(bundle, &primary, &references, &sizes);
        log::debug!(
            "{}: {} initial / {} subload files, {} compressed entries cached",
            name,
            metrics.initial_files.len(),
            metrics.subload_files.len(),
            sizes.len()
        );
        self.collector.record_stage(name, "classify", started.elapsed());
        self.collector.record_size(name, "initial", metrics.initial_bytes);
        self.collector.record_size(name, "subload", metrics.subload_bytes);
        self.collector.record_size(name, "zipped", metrics.zipped_bytes);

        let partial = PartialResult {
            ad_size: detected.as_ref().map(|d| d.size),
            ad_size_source: detected.as_ref().map(|d| d.source.clone()),
            metrics,
        };
        let files: Vec<String> = bundle.paths().map(str::to_string).collect();

        let started = Instant::now();
        let ctx = CheckContext {
            bundle,
            files: &files,
            primary: &primary,
            primary_text: &primary_text,
            references: &references,
            settings: &self.settings,
            partial: &partial,
        };
        let findings = self.registry.run(&ctx);
        self.collector.record_stage(name, "checks", started.elapsed());

        let required_checks = self.registry.required_ids(&self.settings);
        let orphans = orphan_files(bundle, &primary, &references).len();
        let missing = missing_references(&references).count();
        let summary = BundleResultSummary::compute(&findings, &required_checks, orphans, missing);
        log::debug!(
            "{}: {} findings, status {}",
            name,
            summary.total,
            summary.status
        );

        let PartialResult {
            ad_size,
            ad_size_source,
            metrics,
        } = partial;

        Ok(BundleResult {
            bundle_id: bundle.id().to_string(),
            bundle_name: name.to_string(),
            primary: PrimaryAsset {
                path: primary.clone(),
                ad_size,
                size_source: ad_size_source.clone(),
            },
            ad_size,
            ad_size_source,
            findings,
            references,
            summary,
            required_checks,
            metrics,
        })
    }
}
