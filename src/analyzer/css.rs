//! Stylesheet heuristics
//!
//! Regex-based extraction of declared pixel sizes and `url(...)`/`@import`
//! targets. Each heuristic is a standalone function so it can be tested in
//! isolation; none of them fail on malformed CSS, they just find less.

use regex::Regex;
use std::sync::OnceLock;

/// Smallest width or height accepted as a creative dimension
pub const MIN_DIMENSION: u32 = 10;

/// Longest snippet kept for audit trails
const SNIPPET_LEN: usize = 120;

static WIDTH_RE: OnceLock<Regex> = OnceLock::new();
static HEIGHT_RE: OnceLock<Regex> = OnceLock::new();
static MEDIA_RE: OnceLock<Regex> = OnceLock::new();
static BLOCK_RE: OnceLock<Regex> = OnceLock::new();
static URL_RE: OnceLock<Regex> = OnceLock::new();
static IMPORT_RE: OnceLock<Regex> = OnceLock::new();

fn width_re() -> &'static Regex {
    WIDTH_RE.get_or_init(|| {
        // Leading class keeps max-width / border-width out
        Regex::new(r"(?i)(?:^|[;{\s])width\s*:\s*(\d+)(?:\.\d+)?\s*px").expect("width regex is valid")
    })
}

fn height_re() -> &'static Regex {
    HEIGHT_RE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[;{\s])height\s*:\s*(\d+)(?:\.\d+)?\s*px")
            .expect("height regex is valid")
    })
}

fn media_re() -> &'static Regex {
    MEDIA_RE.get_or_init(|| Regex::new(r"(?i)@media[^{]*\{").expect("media regex is valid"))
}

fn block_re() -> &'static Regex {
    BLOCK_RE.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("block regex is valid"))
}

fn url_re() -> &'static Regex {
    URL_RE.get_or_init(|| {
        Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)"'\s]*))\s*\)"#)
            .expect("url regex is valid")
    })
}

fn import_re() -> &'static Regex {
    IMPORT_RE.get_or_init(|| {
        Regex::new(r#"(?i)@import\s+(?:url\(\s*)?(?:"([^"]+)"|'([^']+)'|([^"'\s;)]+))\s*\)?"#)
            .expect("import regex is valid")
    })
}

/// A width/height pair in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CssSize {
    /// Width in px
    pub width: u32,
    /// Height in px
    pub height: u32,
}

impl CssSize {
    /// Width × height
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether both sides clear [`MIN_DIMENSION`]
    pub fn is_plausible(&self) -> bool {
        self.width >= MIN_DIMENSION && self.height >= MIN_DIMENSION
    }
}

/// Where inside a stylesheet a size was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CssSizeOrigin {
    /// Rule nested in an `@media` block
    Media,
    /// Ordinary rule block
    Rule,
    /// First width/height anywhere in the text
    Raw,
}

/// A size found in CSS text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssCandidate {
    /// The size
    pub size: CssSize,
    /// Where it came from
    pub origin: CssSizeOrigin,
    /// Declaration text it was read from
    pub snippet: String,
}

/// Width and height declared together in one declaration list
///
/// # Examples
///
/// ```
/// use h5_audit::analyzer::css::{declared_size, CssSize};
///
/// assert_eq!(
///     declared_size("position:relative; width: 728px; height:90px"),
///     Some(CssSize { width: 728, height: 90 })
/// );
/// assert_eq!(declared_size("max-width:300px; line-height:20px"), None);
/// ```
pub fn declared_size(declarations: &str) -> Option<CssSize> {
    let width = first_px(width_re(), declarations)?;
    let height = first_px(height_re(), declarations)?;
    Some(CssSize { width, height })
}

fn first_px(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Sizes from every innermost rule block, tagged media or rule
pub fn block_sizes(css: &str) -> Vec<CssCandidate> {
    let css = strip_comments(css);
    let media = media_ranges(&css);

    block_re()
        .captures_iter(&css)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let body = cap.get(1)?.as_str();
            let size = declared_size(body)?;
            let origin = if media.iter().any(|(s, e)| whole.start() >= *s && whole.end() <= *e) {
                CssSizeOrigin::Media
            } else {
                CssSizeOrigin::Rule
            };
            Some(CssCandidate {
                size,
                origin,
                snippet: snippet(whole.as_str()),
            })
        })
        .collect()
}

/// Sizes declared inside `@media` blocks
pub fn media_query_sizes(css: &str) -> Vec<CssCandidate> {
    block_sizes(css)
        .into_iter()
        .filter(|c| c.origin == CssSizeOrigin::Media)
        .collect()
}

/// Sizes declared in ordinary rule blocks
pub fn rule_sizes(css: &str) -> Vec<CssSize> {
    block_sizes(css)
        .into_iter()
        .filter(|c| c.origin == CssSizeOrigin::Rule)
        .map(|c| c.size)
        .collect()
}

/// Last-resort pairing of the first width and first height in the text
pub fn raw_size(css: &str) -> Option<CssCandidate> {
    let css = strip_comments(css);
    let size = declared_size(&css)?;
    Some(CssCandidate {
        size,
        origin: CssSizeOrigin::Raw,
        snippet: format!("width:{}px; height:{}px", size.width, size.height),
    })
}

/// Every plausible size in a stylesheet
///
/// Block-level candidates are preferred; the raw pairing is only used when
/// no block declares both dimensions. Candidates under [`MIN_DIMENSION`] are
/// dropped.
pub fn size_candidates(css: &str) -> Vec<CssCandidate> {
    let mut candidates = block_sizes(css);
    if candidates.is_empty() {
        candidates.extend(raw_size(css));
    }
    candidates.retain(|c| c.size.is_plausible());
    candidates
}

/// Pick the item with the largest area; the earliest wins ties
///
/// # Examples
///
/// ```
/// use h5_audit::analyzer::css::{largest_area, CssSize};
///
/// let sizes = vec![
///     CssSize { width: 300, height: 250 },
///     CssSize { width: 320, height: 50 },
///     CssSize { width: 250, height: 300 },
/// ];
/// let best = largest_area(sizes, |s| s.area()).unwrap();
/// assert_eq!(best, CssSize { width: 300, height: 250 });
/// ```
pub fn largest_area<T>(items: impl IntoIterator<Item = T>, area: impl Fn(&T) -> u64) -> Option<T> {
    items.into_iter().fold(None, |best, item| match best {
        Some(current) if area(&current) >= area(&item) => Some(current),
        _ => Some(item),
    })
}

/// Kind of stylesheet reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CssUrlKind {
    /// `url(...)` value
    Url,
    /// `@import` target
    Import,
}

/// A reference found in CSS text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssUrl {
    /// Unresolved target
    pub url: String,
    /// Byte offset of the match in the original text
    pub offset: usize,
    /// How it was referenced
    pub kind: CssUrlKind,
}

/// Every `url(...)` and `@import` target in source order
///
/// Empty targets and fragment-only targets (`url(#clip)`) are skipped.
pub fn css_urls(css: &str) -> Vec<CssUrl> {
    let css = strip_comments(css);
    let mut out = Vec::new();
    let mut import_spans = Vec::new();

    for cap in import_re().captures_iter(&css) {
        let (Some(whole), Some(target)) = (
            cap.get(0),
            cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3)),
        ) else {
            continue;
        };
        import_spans.push((whole.start(), whole.end()));
        push_url(&mut out, target.as_str(), whole.start(), CssUrlKind::Import);
    }

    for cap in url_re().captures_iter(&css) {
        let Some(whole) = cap.get(0) else { continue };
        if import_spans
            .iter()
            .any(|(s, e)| whole.start() >= *s && whole.start() < *e)
        {
            continue;
        }
        let target = cap
            .get(1)
            .or_else(|| cap.get(2))
            .or_else(|| cap.get(3))
            .map_or("", |m| m.as_str());
        push_url(&mut out, target, whole.start(), CssUrlKind::Url);
    }

    out.sort_by_key(|u| u.offset);
    out
}

fn push_url(out: &mut Vec<CssUrl>, target: &str, offset: usize, kind: CssUrlKind) {
    let url = target.trim();
    if url.is_empty() || url.starts_with('#') {
        return;
    }
    out.push(CssUrl {
        url: url.to_string(),
        offset,
        kind,
    });
}

/// Blank `/* ... */` comments, keeping byte offsets and newlines
pub fn strip_comments(css: &str) -> String {
    let mut bytes = css.as_bytes().to_vec();
    let mut search = 0;
    while let Some(start) = css[search..].find("/*").map(|i| search + i) {
        let end = css[start + 2..]
            .find("*/")
            .map(|i| start + 2 + i + 2)
            .unwrap_or(css.len());
        for b in &mut bytes[start..end] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
        search = end;
    }
    String::from_utf8(bytes).unwrap_or_else(|_| css.to_string())
}

/// Byte ranges covered by `@media { ... }` blocks
fn media_ranges(css: &str) -> Vec<(usize, usize)> {
    let bytes = css.as_bytes();
    media_re()
        .find_iter(css)
        .map(|m| {
            let mut depth = 1usize;
            let mut end = css.len();
            for (i, b) in bytes.iter().enumerate().skip(m.end()) {
                match b {
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            end = i + 1;
                            break;
                        }
                    }
                    _ => {}
                }
            }
            (m.start(), end)
        })
        .collect()
}

fn snippet(text: &str) -> String {
    let compact: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() > SNIPPET_LEN {
        let cut: String = compact.chars().take(SNIPPET_LEN).collect();
        format!("{}…", cut)
    } else {
        compact
    }
}
