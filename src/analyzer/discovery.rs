//! Primary document discovery
//!
//! Rules, first match wins:
//!
//! 1. `index.html` / `index.htm` at any depth
//! 2. An HTML file whose stem equals the bundle name
//! 3. The only HTML file in the bundle
//!
//! Within a rule the shallowest path wins, then the shortest, then the
//! lexicographically smallest.

use serde::{Deserialize, Serialize};

use super::dimensions::{AdSize, SizeSourceInfo};
use crate::bundle::Bundle;

/// The entry document and what was detected about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryAsset {
    /// Canonical path of the entry document
    pub path: String,
    /// Detected creative size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_size: Option<AdSize>,
    /// How the size was detected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_source: Option<SizeSourceInfo>,
}

impl PrimaryAsset {
    /// Primary with no size detected yet
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ad_size: None,
            size_source: None,
        }
    }
}

/// Whether a path has an HTML extension
pub fn is_html(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm")
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn stem(path: &str) -> &str {
    let name = file_name(path);
    name.rsplit_once('.').map_or(name, |(s, _)| s)
}

/// Shallowest, then shortest, then lexicographically smallest
pub fn shallowest<'a>(paths: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    paths
        .into_iter()
        .min_by_key(|p| (p.matches('/').count(), p.len(), *p))
}

/// Find the entry document of a bundle
///
/// # Examples
///
/// ```
/// use h5_audit::analyzer::discovery::discover_primary;
/// use h5_audit::bundle::Bundle;
///
/// let bundle = Bundle::from_files("ad", vec![
///     ("deep/index.html".to_string(), vec![]),
///     ("index.html".to_string(), vec![]),
/// ]);
/// assert_eq!(discover_primary(&bundle).as_deref(), Some("index.html"));
/// ```
pub fn discover_primary(bundle: &Bundle) -> Option<String> {
    let index = shallowest(
        bundle
            .paths()
            .filter(|p| matches!(file_name(p), "index.html" | "index.htm")),
    );
    if let Some(path) = index {
        return Some(path.to_string());
    }

    let name = bundle.name().trim();
    let name = strip_archive_extension(name);
    if !name.is_empty() {
        let named = shallowest(
            bundle
                .paths()
                .filter(|p| is_html(p) && stem(p).eq_ignore_ascii_case(name)),
        );
        if let Some(path) = named {
            return Some(path.to_string());
        }
    }

    let mut html = bundle.paths().filter(|p| is_html(p));
    match (html.next(), html.next()) {
        (Some(only), None) => Some(only.to_string()),
        _ => None,
    }
}

/// [`discover_primary`], falling back to caller-supplied candidates
///
/// Candidates are matched case-insensitively against the bundle and the
/// same shallowest/shortest tie-break picks among those present.
pub fn discover_primary_or(bundle: &Bundle, candidates: &[&str]) -> Option<String> {
    discover_primary(bundle).or_else(|| {
        shallowest(candidates.iter().filter_map(|c| bundle.canonical(c))).map(str::to_string)
    })
}

fn strip_archive_extension(name: &str) -> &str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".zip") {
        &name[..name.len() - 4]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(name: &str, paths: &[&str]) -> Bundle {
        Bundle::from_files(name, paths.iter().map(|p| (p.to_string(), Vec::new())))
    }

    #[test]
    fn test_discover_root_index_beats_deeper_index() {
        let b = bundle("ad", &["a/b/index.html", "z/index.html", "index.htm"]);
        assert_eq!(discover_primary(&b).as_deref(), Some("index.htm"));
    }

    #[test]
    fn test_discover_same_depth_prefers_shorter_then_lexical() {
        let b = bundle("ad", &["bb/index.html", "a/index.html", "c/index.htm"]);
        assert_eq!(discover_primary(&b).as_deref(), Some("c/index.htm"));

        let b = bundle("ad", &["bb/index.html", "aa/index.html"]);
        assert_eq!(discover_primary(&b).as_deref(), Some("aa/index.html"));
    }

    #[test]
    fn test_discover_index_name_is_case_sensitive() {
        let b = bundle("ad", &["INDEX.HTML", "other.html"]);
        assert_eq!(discover_primary(&b), None);
    }

    #[test]
    fn test_discover_bundle_name_match() {
        let b = bundle("Leaderboard_728x90.zip", &["leaderboard_728x90.html", "backup.html"]);
        assert_eq!(
            discover_primary(&b).as_deref(),
            Some("leaderboard_728x90.html")
        );
    }

    #[test]
    fn test_discover_sole_html_file() {
        let b = bundle("ad", &["creative/main.htm", "img/a.png"]);
        assert_eq!(discover_primary(&b).as_deref(), Some("creative/main.htm"));
    }

    #[test]
    fn test_discover_ambiguous_html_returns_none() {
        let b = bundle("ad", &["a.html", "b.html"]);
        assert_eq!(discover_primary(&b), None);
    }

    #[test]
    fn test_discover_no_html_returns_none() {
        let b = bundle("ad", &["img/a.png"]);
        assert_eq!(discover_primary(&b), None);
    }

    #[test]
    fn test_discover_primary_or_uses_candidates() {
        let b = bundle("ad", &["a.html", "nested/B.html"]);
        assert_eq!(
            discover_primary_or(&b, &["nested/b.html", "missing.html", "a.html"]).as_deref(),
            Some("a.html")
        );
        assert_eq!(discover_primary_or(&b, &["missing.html"]), None);
    }
}
