//! Reference integrity checks

use super::{Check, CheckContext, CheckError, CheckMeta, Priority};
use crate::analyzer::{missing_references, orphan_files, ReferenceType};
use crate::config::Profile;
use crate::findings::{Finding, FindingOffender, OffenderCategory, Severity};

/// Every local reference points at a file in the bundle
pub struct MissingAssets;

static MISSING_ASSETS: CheckMeta = CheckMeta {
    id: "missing-assets",
    title: "Referenced assets exist",
    description: "Every file the creative references is packaged in the bundle.",
    profiles: &[Profile::Vendor, Profile::Iab],
    priority: Priority::Required,
    tags: &["assets", "references"],
};

impl Check for MissingAssets {
    fn meta(&self) -> &CheckMeta {
        &MISSING_ASSETS
    }

    fn execute(&self, ctx: &CheckContext<'_>) -> Result<Finding, CheckError> {
        let offenders: Vec<FindingOffender> = missing_references(ctx.references)
            .map(|r| {
                FindingOffender::new(r.normalized.as_deref().unwrap_or(&r.url))
                    .with_detail(format!("{} reference from {}", r.ref_type.as_str(), r.from))
                    .with_line(r.line)
                    .with_category(OffenderCategory::Assets)
            })
            .collect();

        if offenders.is_empty() {
            return Ok(MISSING_ASSETS
                .finding(Severity::Pass)
                .with_message("All referenced files are present"));
        }

        Ok(MISSING_ASSETS
            .finding(Severity::Fail)
            .with_message(format!("{} referenced files are missing", offenders.len()))
            .with_offenders(offenders))
    }
}

/// Files nothing references
pub struct OrphanAssets;

static ORPHAN_ASSETS: CheckMeta = CheckMeta {
    id: "orphan-assets",
    title: "Unreferenced files",
    description: "Files that nothing references still count toward the archive weight.",
    profiles: &[Profile::Vendor],
    priority: Priority::Recommended,
    tags: &["assets", "weight"],
};

impl Check for OrphanAssets {
    fn meta(&self) -> &CheckMeta {
        &ORPHAN_ASSETS
    }

    fn execute(&self, ctx: &CheckContext<'_>) -> Result<Finding, CheckError> {
        let orphans = orphan_files(ctx.bundle, ctx.primary, ctx.references);
        if orphans.is_empty() {
            return Ok(ORPHAN_ASSETS
                .finding(Severity::Pass)
                .with_message("Every file is referenced"));
        }

        Ok(ORPHAN_ASSETS
            .finding(Severity::Warn)
            .with_message(format!("{} files are never referenced", orphans.len()))
            .with_offenders(orphans.into_iter().map(|p| {
                FindingOffender::new(p).with_category(OffenderCategory::Packaging)
            })))
    }
}

/// No plain-HTTP requests
pub struct InsecureRequests;

static INSECURE_REQUESTS: CheckMeta = CheckMeta {
    id: "insecure-requests",
    title: "Secure requests only",
    description: "Creatives are served over HTTPS; any http: request is blocked as mixed content.",
    profiles: &[Profile::Vendor, Profile::Iab],
    priority: Priority::Required,
    tags: &["network", "security"],
};

impl Check for InsecureRequests {
    fn meta(&self) -> &CheckMeta {
        &INSECURE_REQUESTS
    }

    fn execute(&self, ctx: &CheckContext<'_>) -> Result<Finding, CheckError> {
        let offenders: Vec<FindingOffender> = ctx
            .references
            .iter()
            .filter(|r| r.external && !r.secure && r.ref_type != ReferenceType::Anchor)
            .map(|r| {
                FindingOffender::new(r.from.as_str())
                    .with_detail(r.url.as_str())
                    .with_line(r.line)
                    .with_category(OffenderCategory::Environment)
            })
            .collect();

        if offenders.is_empty() {
            return Ok(INSECURE_REQUESTS
                .finding(Severity::Pass)
                .with_message("No insecure requests"));
        }

        Ok(INSECURE_REQUESTS
            .finding(Severity::Fail)
            .with_message(format!("{} requests use plain http", offenders.len()))
            .with_offenders(offenders))
    }
}
