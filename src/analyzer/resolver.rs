//! URL classification and bundle-relative path resolution

use std::borrow::Cow;

/// How a raw reference URL relates to the bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// Relative or root-relative; may live in the bundle
    Local,
    /// Off-bundle URL; `secure` is true for encrypted schemes
    External {
        /// Whether the scheme is `https:`/`wss:` (or protocol-relative)
        secure: bool,
    },
    /// Inline data (`data:`) or script (`javascript:`, `about:`, `blob:`)
    Inline,
    /// Empty or fragment-only
    Empty,
}

impl UrlKind {
    /// Whether this is an off-bundle URL
    pub fn is_external(&self) -> bool {
        matches!(self, UrlKind::External { .. })
    }
}

/// Schemes that never point at a file
const INLINE_SCHEMES: &[&str] = &["data", "javascript", "about", "blob", "mailto", "tel"];

/// Classify a raw URL by its scheme
///
/// # Examples
///
/// ```
/// use h5_audit::analyzer::resolver::{classify_url, UrlKind};
///
/// assert_eq!(classify_url("img/a.png"), UrlKind::Local);
/// assert_eq!(classify_url("http://cdn.example.com/x.js"), UrlKind::External { secure: false });
/// assert_eq!(classify_url("HTTPS://cdn.example.com/x.js"), UrlKind::External { secure: true });
/// assert_eq!(classify_url("data:image/png;base64,AAAA"), UrlKind::Inline);
/// assert_eq!(classify_url("#top"), UrlKind::Empty);
/// ```
pub fn classify_url(url: &str) -> UrlKind {
    let url = url.trim();
    if url.is_empty() || url.starts_with('#') {
        return UrlKind::Empty;
    }
    if url.starts_with("//") {
        return UrlKind::External { secure: true };
    }

    match scheme(url) {
        Some(s) if INLINE_SCHEMES.contains(&s.as_str()) => UrlKind::Inline,
        Some(s) => UrlKind::External {
            secure: s == "https" || s == "wss",
        },
        None => UrlKind::Local,
    }
}

/// Lowercased scheme if the URL starts with `scheme:`
fn scheme(url: &str) -> Option<String> {
    let colon = url.find(':')?;
    let candidate = &url[..colon];
    // A slash or dot before the colon means a path like `a/b:c`, not a scheme
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic()
        || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }
    // Windows drive letters (`C:`) are paths
    if candidate.len() == 1 {
        return None;
    }
    Some(candidate.to_ascii_lowercase())
}

/// Resolve a reference against its origin file
///
/// Returns the bundle-relative path, or `None` for external, inline or
/// empty URLs and for paths that normalize to the bundle root itself.
/// Leading `/` means bundle-root-relative. `..` never climbs above the root.
/// Percent escapes are kept as written, so a resolved path resolves to
/// itself; [`resolve_decoded`] decodes them once for raw source URLs.
///
/// # Examples
///
/// ```
/// use h5_audit::analyzer::resolver::resolve;
///
/// assert_eq!(resolve("sub/page.html", "/assets/a.png").as_deref(), Some("assets/a.png"));
/// assert_eq!(resolve("sub/page.html", "../img/b.png?v=2#x").as_deref(), Some("img/b.png"));
/// assert_eq!(resolve("index.html", "../../../etc/passwd").as_deref(), Some("etc/passwd"));
/// assert_eq!(resolve("index.html", "img/a%20b.png").as_deref(), Some("img/a%20b.png"));
/// assert_eq!(resolve("index.html", "https://cdn.example.com/a.js"), None);
/// ```
pub fn resolve(origin: &str, url: &str) -> Option<String> {
    local_path(url).and_then(|path| join_normalized(origin, &path))
}

/// [`resolve`] for a URL as written in source, percent escapes decoded once
///
/// # Examples
///
/// ```
/// use h5_audit::analyzer::resolver::resolve_decoded;
///
/// assert_eq!(resolve_decoded("index.html", "img/my%20logo.png").as_deref(), Some("img/my logo.png"));
/// assert_eq!(resolve_decoded("index.html", "img/a%2520b.png").as_deref(), Some("img/a%20b.png"));
/// ```
pub fn resolve_decoded(origin: &str, url: &str) -> Option<String> {
    let path = local_path(url)?;
    let decoded = urlencoding::decode(&path).unwrap_or(Cow::Borrowed(path.as_str()));
    join_normalized(origin, &decoded)
}

/// Local URL without query or fragment, `/`-separated
fn local_path(url: &str) -> Option<String> {
    if classify_url(url) != UrlKind::Local {
        return None;
    }
    Some(strip_query_and_fragment(url.trim()).replace('\\', "/"))
}

fn join_normalized(origin: &str, path: &str) -> Option<String> {
    let joined = match path.strip_prefix('/') {
        Some(rooted) => rooted.to_string(),
        None => match origin_dir(origin) {
            "" => path.to_string(),
            dir => format!("{}/{}", dir, path),
        },
    };

    let normalized = normalize_segments(&joined);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Drop `?query` and `#fragment`
pub fn strip_query_and_fragment(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Directory part of a bundle path (`""` for root files)
pub fn origin_dir(origin: &str) -> &str {
    origin.rfind('/').map_or("", |i| &origin[..i])
}

/// Collapse `.`/`..`/empty segments; `..` at the root is dropped
fn normalize_segments(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            s => stack.push(s),
        }
    }
    stack.join("/")
}
