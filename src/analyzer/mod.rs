//! Static analysis of creative bundles
//!
//! Provides the pure stages the audit pipeline runs in order:
//! - Primary document discovery
//! - Creative size detection (meta tags, vendor metadata, CSS)
//! - Reference extraction and path resolution
//! - Load-phase classification with compressed weight totals

pub mod css;
pub mod dimensions;
pub mod discovery;
pub mod html;
pub mod load_phase;
pub mod references;
pub mod resolver;

// Public exports for common analyzer types
pub use dimensions::{detect_size, AdSize, DetectedSize, SizeMethod, SizeSourceInfo};
pub use discovery::{discover_primary, discover_primary_or, PrimaryAsset};
pub use html::HtmlDocument;
pub use load_phase::{classify, gzip_len, CompressedSizes, LoadPhase, LoadPhaseMetrics};
pub use references::{collect_all, Reference, ReferenceType};
pub use resolver::{classify_url, resolve, resolve_decoded, UrlKind};

use std::collections::HashSet;

use crate::bundle::Bundle;

/// Bundle files nothing references, excluding the primary document
pub fn orphan_files<'a>(bundle: &'a Bundle, primary: &str, references: &[Reference]) -> Vec<&'a str> {
    let referenced: HashSet<&str> = references
        .iter()
        .filter(|r| r.in_zip)
        .filter_map(|r| r.normalized.as_deref())
        .collect();

    bundle
        .paths()
        .filter(|p| *p != primary && !referenced.contains(p))
        .collect()
}

/// Local, non-anchor references whose target is not in the bundle
pub fn missing_references(references: &[Reference]) -> impl Iterator<Item = &Reference> {
    references
        .iter()
        .filter(|r| r.ref_type != ReferenceType::Anchor && r.is_local() && !r.in_zip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Bundle, Vec<Reference>) {
        let bundle = Bundle::from_files(
            "ad",
            ["index.html", "a.png", "unused.png", "click.html"]
                .iter()
                .map(|p| (p.to_string(), Vec::new())),
        );
        let refs = vec![
            Reference::new("index.html", ReferenceType::Image, "a.png").resolved(&bundle),
            Reference::new("index.html", ReferenceType::Image, "gone.png").resolved(&bundle),
            Reference::new("index.html", ReferenceType::Anchor, "click.html").resolved(&bundle),
            Reference::new("index.html", ReferenceType::Anchor, "nowhere.html").resolved(&bundle),
            Reference::new("index.html", ReferenceType::Image, "https://x.com/b.png").resolved(&bundle),
        ];
        (bundle, refs)
    }

    #[test]
    fn test_orphan_files_excludes_primary_and_referenced() {
        let (bundle, refs) = fixture();
        // Anchors still mark their target as used
        assert_eq!(orphan_files(&bundle, "index.html", &refs), vec!["unused.png"]);
    }

    #[test]
    fn test_missing_references_skips_anchors_and_external() {
        let (_, refs) = fixture();
        let missing: Vec<&str> = missing_references(&refs).map(|r| r.url.as_str()).collect();
        assert_eq!(missing, vec!["gone.png"]);
    }
}
