//! Load-phase classification and weight accounting
//!
//! Every in-bundle asset lands in either the initial load (what must arrive
//! before first render) or the subload (polite) phase:
//!
//! | referenced from      | css / script / font | image / media / other |
//! |----------------------|---------------------|-----------------------|
//! | primary document     | initial             | subload               |
//! | stylesheet           | initial             | subload               |
//! | script               | subload             | subload               |
//! | anything else        | subload             | subload               |
//!
//! The primary document is always initial. An asset reached both ways counts
//! once, as initial. Anchors are click-throughs and are never counted.
//!
//! Byte totals use gzip-compressed sizes, memoized per path.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::references::{extension, Reference, ReferenceType};
use crate::bundle::Bundle;

/// Which weight budget an asset counts against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPhase {
    /// Needed before first render
    Initial,
    /// Loaded politely after the initial load
    Subload,
}

/// Gzip length of a buffer at the default level
///
/// # Examples
///
/// ```
/// use h5_audit::analyzer::load_phase::gzip_len;
///
/// let text = "body { margin: 0 }\n".repeat(200);
/// let compressed = gzip_len(text.as_bytes()).unwrap();
/// assert!(compressed < text.len() as u64);
/// ```
pub fn gzip_len(content: &[u8]) -> Option<u64> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).ok()?;
    encoder.finish().ok().map(|out| out.len() as u64)
}

/// Per-pipeline memo of compressed file sizes
#[derive(Debug, Default)]
pub struct CompressedSizes {
    cache: Mutex<HashMap<String, u64>>,
}

impl CompressedSizes {
    /// Empty memo
    pub fn new() -> Self {
        Self::default()
    }

    /// Compressed size of a bundle file; raw length if compression fails
    pub fn size_of(&self, bundle: &Bundle, path: &str) -> u64 {
        if let Some(size) = self.cache.lock().get(path) {
            return *size;
        }
        let Some(content) = bundle.get(path) else {
            return 0;
        };
        let size = gzip_len(content).unwrap_or_else(|| {
            log::warn!("{}: gzip failed, counting raw length", path);
            content.len() as u64
        });
        self.cache.lock().insert(path.to_string(), size);
        size
    }

    /// Number of memoized paths
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Whether nothing has been memoized yet
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

/// Load-phase partition plus byte and request totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPhaseMetrics {
    /// In-bundle files in the initial load (primary included)
    pub initial_files: BTreeSet<String>,
    /// In-bundle files loaded politely
    pub subload_files: BTreeSet<String>,
    /// External hosts contacted during the initial load
    pub initial_hosts: BTreeSet<String>,
    /// Every external host contacted
    pub all_hosts: BTreeSet<String>,
    /// Compressed bytes of `initial_files`
    pub initial_bytes: u64,
    /// Compressed bytes of `subload_files`
    pub subload_bytes: u64,
    /// Compressed bytes of every bundle file
    pub total_bytes: u64,
    /// Whole-archive length
    pub zipped_bytes: u64,
    /// Raw bytes of `initial_files`
    pub initial_bytes_uncompressed: u64,
    /// Raw bytes of `subload_files`
    pub subload_bytes_uncompressed: u64,
    /// Raw bytes of every bundle file
    pub total_bytes_uncompressed: u64,
    /// Initial in-bundle files plus initial external requests
    pub initial_requests: usize,
    /// Subload in-bundle files plus subload external requests
    pub subload_requests: usize,
    /// `initial_requests + subload_requests`
    pub total_requests: usize,
}

/// Phase of a reference under the rule table, `None` for anchors
///
/// # Examples
///
/// ```
/// use h5_audit::analyzer::load_phase::{phase_of, LoadPhase};
/// use h5_audit::analyzer::references::{Reference, ReferenceType};
///
/// let css = Reference::new("index.html", ReferenceType::Css, "a.css");
/// assert_eq!(phase_of(&css, "index.html"), Some(LoadPhase::Initial));
///
/// let from_js = Reference::new("js/app.js", ReferenceType::Css, "a.css");
/// assert_eq!(phase_of(&from_js, "index.html"), Some(LoadPhase::Subload));
/// ```
pub fn phase_of(reference: &Reference, primary: &str) -> Option<LoadPhase> {
    if reference.ref_type == ReferenceType::Anchor {
        return None;
    }

    let origin_ext = extension(&reference.from);
    let from_primary = reference.from == primary;
    let from_stylesheet = origin_ext.as_deref() == Some("css");
    let from_script = matches!(origin_ext.as_deref(), Some("js" | "mjs"));

    let render_blocking = matches!(
        reference.ref_type,
        ReferenceType::Css | ReferenceType::Script | ReferenceType::Font
    );

    let phase = if from_script {
        LoadPhase::Subload
    } else if (from_primary || from_stylesheet) && render_blocking {
        LoadPhase::Initial
    } else {
        LoadPhase::Subload
    };
    Some(phase)
}

/// Partition references and total their weight
///
/// External references add to host sets and request counts only.
pub fn classify(
    bundle: &Bundle,
    primary: &str,
    references: &[Reference],
    sizes: &CompressedSizes,
) -> LoadPhaseMetrics {
    let mut metrics = LoadPhaseMetrics::default();
    metrics.initial_files.insert(primary.to_string());

    let mut initial_external = BTreeSet::new();
    let mut subload_external = BTreeSet::new();

    for reference in references {
        let Some(phase) = phase_of(reference, primary) else {
            continue;
        };

        if reference.external {
            let host = host_of(&reference.url);
            metrics.all_hosts.insert(host.clone());
            match phase {
                LoadPhase::Initial => {
                    metrics.initial_hosts.insert(host);
                    initial_external.insert(reference.url.clone());
                }
                LoadPhase::Subload => {
                    subload_external.insert(reference.url.clone());
                }
            }
            continue;
        }

        if !reference.in_zip {
            continue;
        }
        let Some(path) = reference.normalized.clone() else {
            continue;
        };
        match phase {
            LoadPhase::Initial => {
                metrics.initial_files.insert(path);
            }
            LoadPhase::Subload => {
                metrics.subload_files.insert(path);
            }
        }
    }

    // Initial wins when an asset is reached both ways
    let initial = metrics.initial_files.clone();
    metrics.subload_files.retain(|p| !initial.contains(p));
    subload_external.retain(|u| !initial_external.contains(u));

    for path in &metrics.initial_files {
        metrics.initial_bytes += sizes.size_of(bundle, path);
        metrics.initial_bytes_uncompressed += raw_len(bundle, path);
    }
    for path in &metrics.subload_files {
        metrics.subload_bytes += sizes.size_of(bundle, path);
        metrics.subload_bytes_uncompressed += raw_len(bundle, path);
    }
    for (path, content) in bundle.files() {
        metrics.total_bytes += sizes.size_of(bundle, path);
        metrics.total_bytes_uncompressed += content.len() as u64;
    }
    metrics.zipped_bytes = bundle.archive_bytes();

    metrics.initial_requests = metrics.initial_files.len() + initial_external.len();
    metrics.subload_requests = metrics.subload_files.len() + subload_external.len();
    metrics.total_requests = metrics.initial_requests + metrics.subload_requests;

    metrics
}

fn raw_len(bundle: &Bundle, path: &str) -> u64 {
    bundle.get(path).map_or(0, |c| c.len() as u64)
}

/// Lowercase host of an external URL (`//host/..` or `scheme://host/..`)
pub fn host_of(url: &str) -> String {
    let rest = url
        .trim()
        .split_once("//")
        .map_or(url.trim(), |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    // Drop credentials and port
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = host.split(':').next().unwrap_or(host);
    host.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(from: &str, ty: ReferenceType, url: &str, bundle: &Bundle) -> Reference {
        Reference::new(from, ty, url).resolved(bundle)
    }

    fn bundle() -> Bundle {
        Bundle::from_files(
            "ad",
            vec![
                ("index.html".to_string(), b"<html></html>".to_vec()),
                ("style.css".to_string(), vec![b'a'; 300]),
                ("app.js".to_string(), vec![b'b'; 500]),
                ("img/bg.png".to_string(), vec![7; 1000]),
                ("img/late.png".to_string(), vec![9; 100]),
                ("font.woff".to_string(), vec![1; 50]),
            ],
        )
    }

    #[test]
    fn test_phase_of_follows_rule_table() {
        let p = "index.html";
        let cases = [
            ("index.html", ReferenceType::Css, Some(LoadPhase::Initial)),
            ("index.html", ReferenceType::Script, Some(LoadPhase::Initial)),
            ("index.html", ReferenceType::Font, Some(LoadPhase::Initial)),
            ("index.html", ReferenceType::Image, Some(LoadPhase::Subload)),
            ("index.html", ReferenceType::Media, Some(LoadPhase::Subload)),
            ("index.html", ReferenceType::Network, Some(LoadPhase::Subload)),
            ("index.html", ReferenceType::Anchor, None),
            ("css/a.css", ReferenceType::Font, Some(LoadPhase::Initial)),
            ("css/a.css", ReferenceType::Image, Some(LoadPhase::Subload)),
            ("js/a.js", ReferenceType::Script, Some(LoadPhase::Subload)),
            ("js/a.js", ReferenceType::Font, Some(LoadPhase::Subload)),
            ("other.html", ReferenceType::Css, Some(LoadPhase::Subload)),
        ];
        for (from, ty, expected) in cases {
            let r = Reference::new(from, ty, "x");
            assert_eq!(phase_of(&r, p), expected, "{} {:?}", from, ty);
        }
    }

    #[test]
    fn test_classify_partitions_and_counts() {
        let b = bundle();
        let refs = vec![
            reference("index.html", ReferenceType::Css, "style.css", &b),
            reference("index.html", ReferenceType::Script, "app.js", &b),
            reference("style.css", ReferenceType::Font, "img/bg.png", &b),
            reference("app.js", ReferenceType::Image, "img/late.png", &b),
            reference("index.html", ReferenceType::Anchor, "font.woff", &b),
        ];
        let sizes = CompressedSizes::new();
        let m = classify(&b, "index.html", &refs, &sizes);

        let initial: Vec<&str> = m.initial_files.iter().map(String::as_str).collect();
        assert_eq!(initial, vec!["app.js", "img/bg.png", "index.html", "style.css"]);
        let subload: Vec<&str> = m.subload_files.iter().map(String::as_str).collect();
        assert_eq!(subload, vec!["img/late.png"]);

        assert_eq!(m.initial_requests, 4);
        assert_eq!(m.subload_requests, 1);
        assert_eq!(m.total_requests, 5);
        assert_eq!(m.initial_bytes_uncompressed, 13 + 300 + 500 + 1000);
        assert_eq!(m.subload_bytes_uncompressed, 100);
        assert_eq!(m.total_bytes_uncompressed, 13 + 300 + 500 + 1000 + 100 + 50);
        assert_eq!(m.zipped_bytes, b.archive_bytes());
        assert!(m.initial_bytes < m.initial_bytes_uncompressed);
    }

    #[test]
    fn test_classify_initial_wins_over_subload() {
        let b = bundle();
        let refs = vec![
            reference("app.js", ReferenceType::Css, "style.css", &b),
            reference("index.html", ReferenceType::Css, "style.css", &b),
        ];
        let m = classify(&b, "index.html", &refs, &CompressedSizes::new());
        assert!(m.initial_files.contains("style.css"));
        assert!(m.subload_files.is_empty());
    }

    #[test]
    fn test_classify_external_counts_requests_not_bytes() {
        let b = bundle();
        let refs = vec![
            reference("index.html", ReferenceType::Script, "https://CDN.example.com:443/lib.js", &b),
            reference("index.html", ReferenceType::Image, "http://img.example.com/a.png", &b),
        ];
        let m = classify(&b, "index.html", &refs, &CompressedSizes::new());
        assert_eq!(m.initial_hosts.len(), 1);
        assert!(m.initial_hosts.contains("cdn.example.com"));
        assert_eq!(m.all_hosts.len(), 2);
        assert_eq!(m.initial_requests, 2);
        assert_eq!(m.subload_requests, 1);
        assert_eq!(m.initial_bytes_uncompressed, 13);
    }

    #[test]
    fn test_classify_missing_assets_are_not_counted() {
        let b = bundle();
        let refs = vec![reference("index.html", ReferenceType::Css, "nope.css", &b)];
        let m = classify(&b, "index.html", &refs, &CompressedSizes::new());
        assert_eq!(m.initial_files.len(), 1);
    }

    #[test]
    fn test_compressed_sizes_memoizes_per_path() {
        let b = bundle();
        let sizes = CompressedSizes::new();
        let first = sizes.size_of(&b, "img/bg.png");
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes.size_of(&b, "img/bg.png"), first);
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes.size_of(&b, "missing"), 0);
    }

    #[test]
    fn test_host_of_strips_credentials_port_and_path() {
        assert_eq!(host_of("https://user:pw@Ads.Example.com:8080/x?y"), "ads.example.com");
        assert_eq!(host_of("//cdn.example.com/lib.js"), "cdn.example.com");
    }
}
