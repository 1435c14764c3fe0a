//! Asset reference extraction
//!
//! References are collected from the primary document's tags, from CSS text
//! (inline `style` attributes, `<style>` blocks, linked stylesheets) and,
//! best-effort, from script text (asset manifests and network calls). Every
//! in-bundle stylesheet or script reached this way is scanned in turn, so the
//! final list is the transitive closure from the primary document.

use std::collections::{HashSet, VecDeque};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::css::{css_urls, CssUrlKind};
use super::html::{HtmlDocument, LineIndex, Tag};
use super::resolver::{classify_url, resolve_decoded, UrlKind};
use crate::bundle::Bundle;

static MANIFEST_RE: OnceLock<Regex> = OnceLock::new();
static FETCH_RE: OnceLock<Regex> = OnceLock::new();
static XHR_RE: OnceLock<Regex> = OnceLock::new();

fn manifest_re() -> &'static Regex {
    MANIFEST_RE.get_or_init(|| {
        Regex::new(
            r#"\{[^{}]*?\bsrc\s*:\s*(?:"([^"]+)"|'([^']+)'|([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*))"#,
        )
        .expect("manifest regex is valid")
    })
}

fn fetch_re() -> &'static Regex {
    FETCH_RE.get_or_init(|| {
        Regex::new(r#"\bfetch\(\s*["'`]([^"'`]+)["'`]"#).expect("fetch regex is valid")
    })
}

fn xhr_re() -> &'static Regex {
    XHR_RE.get_or_init(|| {
        Regex::new(r#"(?i)\.open\(\s*["'](?:get|post|put|head)["']\s*,\s*["']([^"']+)["']"#)
            .expect("xhr regex is valid")
    })
}

/// What a reference loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType {
    /// Raster or vector image
    Image,
    /// Stylesheet
    Css,
    /// Script file
    Script,
    /// Web font (also every CSS `url()` target)
    Font,
    /// Video, audio or text track
    Media,
    /// `fetch`/XHR call
    Network,
    /// Click-through link; never loaded
    Anchor,
}

impl ReferenceType {
    /// Guess a type from a file extension; unknown extensions count as images
    ///
    /// # Examples
    ///
    /// ```
    /// use h5_audit::analyzer::references::ReferenceType;
    ///
    /// assert_eq!(ReferenceType::from_extension("js/main.JS"), ReferenceType::Script);
    /// assert_eq!(ReferenceType::from_extension("fonts/a.woff2"), ReferenceType::Font);
    /// assert_eq!(ReferenceType::from_extension("img/a"), ReferenceType::Image);
    /// ```
    pub fn from_extension(path: &str) -> Self {
        let ext = extension(path).unwrap_or_default();
        match ext.as_str() {
            "css" => ReferenceType::Css,
            "js" | "mjs" => ReferenceType::Script,
            "woff" | "woff2" | "ttf" | "otf" | "eot" => ReferenceType::Font,
            "mp4" | "webm" | "ogg" | "ogv" | "mp3" | "wav" | "m4a" | "vtt" => ReferenceType::Media,
            "json" | "xml" | "txt" => ReferenceType::Network,
            _ => ReferenceType::Image,
        }
    }

    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Image => "image",
            ReferenceType::Css => "css",
            ReferenceType::Script => "script",
            ReferenceType::Font => "font",
            ReferenceType::Media => "media",
            ReferenceType::Network => "network",
            ReferenceType::Anchor => "anchor",
        }
    }
}

/// Lowercase extension of a path without query or fragment
pub fn extension(path: &str) -> Option<String> {
    let path = super::resolver::strip_query_and_fragment(path);
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// One dependency edge from a bundle file onto an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Origin file
    pub from: String,
    /// What is loaded
    #[serde(rename = "type")]
    pub ref_type: ReferenceType,
    /// Raw URL as written
    pub url: String,
    /// Canonical bundle path once resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<String>,
    /// Whether `normalized` exists in the bundle
    pub in_zip: bool,
    /// Off-bundle URL
    pub external: bool,
    /// Encrypted scheme (only meaningful when external)
    pub secure: bool,
    /// 1-based line in the origin file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 1-based column in the origin file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Reference {
    /// Unresolved reference with scheme flags filled in
    pub fn new(from: impl Into<String>, ref_type: ReferenceType, url: impl Into<String>) -> Self {
        let url = url.into();
        let (external, secure) = match classify_url(&url) {
            UrlKind::External { secure } => (true, secure),
            _ => (false, false),
        };
        Self {
            from: from.into(),
            ref_type,
            url,
            normalized: None,
            in_zip: false,
            external,
            secure,
            line: None,
            column: None,
        }
    }

    /// Attach a source position
    pub fn at(mut self, line: usize, column: Option<usize>) -> Self {
        self.line = Some(line);
        self.column = column;
        self
    }

    /// Resolve against the bundle, tolerating case differences
    ///
    /// `normalized` holds the canonical casing when the file exists, or the
    /// resolved (missing) path otherwise.
    pub fn resolved(self, bundle: &Bundle) -> Self {
        let base = self.from.clone();
        self.resolved_against(bundle, &base)
    }

    /// Like [`Reference::resolved`], relative to `base` instead of `from`
    ///
    /// Script text runs in the document that loaded it, so URLs found in an
    /// external script resolve against the primary document.
    pub fn resolved_against(mut self, bundle: &Bundle, base: &str) -> Self {
        if self.external {
            return self;
        }
        if let Some(path) = resolve_decoded(base, &self.url) {
            match bundle.canonical(&path) {
                Some(canonical) => {
                    self.normalized = Some(canonical.to_string());
                    self.in_zip = true;
                }
                None => {
                    self.normalized = Some(path);
                    self.in_zip = false;
                }
            }
        }
        self
    }

    /// Whether the reference names something that should be in the bundle
    pub fn is_local(&self) -> bool {
        !self.external && self.normalized.is_some()
    }
}

/// References made by an HTML document's tags and inline CSS/scripts
pub fn collect_html(from: &str, doc: &HtmlDocument) -> Vec<Reference> {
    let mut out = Vec::new();

    for tag in &doc.tags {
        collect_tag(from, tag, &mut out);

        if let Some(style) = tag.attr("style") {
            for css in css_urls(style) {
                out.push(
                    Reference::new(from, css_url_type(css.kind), css.url)
                        .at(tag.line, Some(tag.column)),
                );
            }
        }
    }

    for block in &doc.styles {
        out.extend(
            collect_css(from, &block.text)
                .into_iter()
                .map(|r| shift_line(r, block.line)),
        );
    }

    for block in doc.scripts.iter().filter(|b| !is_data_block(b.mime.as_deref())) {
        out.extend(
            collect_script(from, &block.text)
                .into_iter()
                .map(|r| shift_line(r, block.line)),
        );
    }

    dedupe(out)
}

/// Script blocks holding JSON or templates rather than code
pub(crate) fn is_data_block(mime: Option<&str>) -> bool {
    mime.is_some_and(|m| m.contains("json") || m.contains("template") || m.contains("html"))
}

fn collect_tag(from: &str, tag: &Tag, out: &mut Vec<Reference>) {
    let mut push = |ty: ReferenceType, url: &str| {
        if !url.trim().is_empty() {
            out.push(Reference::new(from, ty, url.trim()).at(tag.line, Some(tag.column)));
        }
    };

    match tag.name.as_str() {
        "img" => {
            if let Some(src) = tag.attr("src") {
                push(ReferenceType::Image, src);
            }
            for url in srcset_urls(tag.attr("srcset")) {
                push(ReferenceType::Image, url);
            }
        }
        "link" => {
            let Some(href) = tag.attr("href") else { return };
            let ty = if tag.attr_has_token("rel", "stylesheet") {
                ReferenceType::Css
            } else if tag.attr("as").is_some_and(|a| a.eq_ignore_ascii_case("font")) {
                ReferenceType::Font
            } else if tag.attr("as").is_some_and(|a| a.eq_ignore_ascii_case("script")) {
                ReferenceType::Script
            } else if tag.attr("as").is_some_and(|a| a.eq_ignore_ascii_case("style")) {
                ReferenceType::Css
            } else {
                ReferenceType::Image
            };
            push(ty, href);
        }
        "script" => {
            if let Some(src) = tag.attr("src") {
                push(ReferenceType::Script, src);
            }
        }
        "video" | "audio" | "source" | "track" | "embed" => {
            if let Some(src) = tag.attr("src") {
                push(ReferenceType::Media, src);
            }
            if let Some(poster) = tag.attr("poster") {
                push(ReferenceType::Image, poster);
            }
            for url in srcset_urls(tag.attr("srcset")) {
                push(ReferenceType::Image, url);
            }
        }
        "a" | "area" => {
            if let Some(href) = tag.attr("href") {
                push(ReferenceType::Anchor, href);
            }
        }
        "image" | "use" => {
            // SVG: href or the legacy xlink:href
            if let Some(href) = tag.attr("href").or_else(|| tag.attr("xlink:href")) {
                if !href.starts_with('#') {
                    push(ReferenceType::Image, href);
                }
            }
        }
        "input" if tag.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("image")) => {
            if let Some(src) = tag.attr("src") {
                push(ReferenceType::Image, src);
            }
        }
        _ => {}
    }

    // Legacy table/body backgrounds
    if let Some(bg) = tag.attr("background") {
        push(ReferenceType::Image, bg);
    }
}

/// Candidate URLs from a `srcset` value
fn srcset_urls(srcset: Option<&str>) -> impl Iterator<Item = &str> {
    srcset
        .into_iter()
        .flat_map(|s| s.split(','))
        .filter_map(|candidate| candidate.split_whitespace().next())
}

/// `url()` targets load as fonts; `@import` targets as stylesheets
fn css_url_type(kind: CssUrlKind) -> ReferenceType {
    match kind {
        CssUrlKind::Url => ReferenceType::Font,
        CssUrlKind::Import => ReferenceType::Css,
    }
}

/// References made by CSS text, lines relative to the text
pub fn collect_css(from: &str, css: &str) -> Vec<Reference> {
    let lines = LineIndex::new(css);
    css_urls(css)
        .into_iter()
        .map(|u| {
            let (line, column) = lines.position(u.offset);
            Reference::new(from, css_url_type(u.kind), u.url).at(line, Some(column))
        })
        .collect()
}

/// References made by script text, lines relative to the text
///
/// Picks up asset manifests (`{src: "img/a.png"}` or `{src: lib.bgPath}`
/// where `bgPath: "img/a.png"` appears elsewhere in the same text) and
/// `fetch`/XHR calls with literal URLs.
pub fn collect_script(from: &str, js: &str) -> Vec<Reference> {
    let lines = LineIndex::new(js);
    let mut out = Vec::new();

    for cap in manifest_re().captures_iter(js) {
        let Some(whole) = cap.get(0) else { continue };
        let url = match (cap.get(1).or_else(|| cap.get(2)), cap.get(3)) {
            (Some(literal), _) => Some(literal.as_str().to_string()),
            (None, Some(ident)) => deref_identifier(js, ident.as_str()),
            (None, None) => None,
        };
        if let Some(url) = url {
            let (line, column) = lines.position(whole.start());
            out.push(
                Reference::new(from, ReferenceType::from_extension(&url), url).at(line, Some(column)),
            );
        }
    }

    for re in [fetch_re(), xhr_re()] {
        for cap in re.captures_iter(js) {
            let (Some(whole), Some(url)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let (line, column) = lines.position(whole.start());
            out.push(Reference::new(from, ReferenceType::Network, url.as_str()).at(line, Some(column)));
        }
    }

    out
}

/// Find `name: "value"` or `name = "value"` for the last segment of a dotted name
fn deref_identifier(js: &str, ident: &str) -> Option<String> {
    let name = ident.rsplit('.').next()?;
    let pattern = format!(r#"\b{}\s*[:=]\s*["']([^"']+)["']"#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(js)?.get(1)?.as_str().to_string();
    // Only file-like values; a bare directory prefix is not an asset
    extension(&value).map(|_| value)
}

fn shift_line(mut reference: Reference, base_line: usize) -> Reference {
    if let Some(line) = reference.line {
        reference.line = Some(base_line + line - 1);
        // First-line columns count from the block start, not the file line
        if line == 1 {
            reference.column = None;
        }
    }
    reference
}

/// Drop repeats of the same (origin, type, url), keeping the first
fn dedupe(references: Vec<Reference>) -> Vec<Reference> {
    let mut seen = HashSet::new();
    references
        .into_iter()
        .filter(|r| seen.insert((r.from.clone(), r.ref_type, r.url.clone())))
        .collect()
}

/// Every reference reachable from the primary document, resolved
///
/// In-bundle stylesheets and scripts are scanned once each; cycles between
/// stylesheets (`@import` loops) terminate through the visited set.
///
/// # Examples
///
/// ```
/// use h5_audit::analyzer::html::HtmlDocument;
/// use h5_audit::analyzer::references::{collect_all, ReferenceType};
/// use h5_audit::bundle::Bundle;
///
/// let html = r#"<link rel="stylesheet" href="style.css"><img src="a.png">"#;
/// let bundle = Bundle::from_files("ad", vec![
///     ("index.html".to_string(), html.as_bytes().to_vec()),
///     ("style.css".to_string(), b"body{background:url(bg.png)}".to_vec()),
///     ("a.png".to_string(), vec![0; 4]),
///     ("bg.png".to_string(), vec![0; 4]),
/// ]);
///
/// let refs = collect_all(&bundle, "index.html", &HtmlDocument::parse(html));
/// assert_eq!(refs.len(), 3);
/// assert!(refs.iter().all(|r| r.in_zip));
/// assert_eq!(refs[2].from, "style.css");
/// assert_eq!(refs[2].ref_type, ReferenceType::Font);
/// ```
pub fn collect_all(bundle: &Bundle, primary: &str, doc: &HtmlDocument) -> Vec<Reference> {
    let mut all: Vec<Reference> = collect_html(primary, doc)
        .into_iter()
        .map(|r| r.resolved(bundle))
        .collect();

    let mut visited: HashSet<String> = HashSet::from([primary.to_string()]);
    let mut queue: VecDeque<String> = scannable_targets(&all).collect();

    while let Some(path) = queue.pop_front() {
        if !visited.insert(path.clone()) {
            continue;
        }
        let Some(text) = bundle.text(&path) else { continue };

        let (found, base) = match extension(&path).as_deref() {
            Some("css") => (collect_css(&path, &text), path.as_str()),
            Some("js") | Some("mjs") => (collect_script(&path, &text), primary),
            _ => continue,
        };
        let found: Vec<Reference> = dedupe(found)
            .into_iter()
            .map(|r| r.resolved_against(bundle, base))
            .collect();
        log::debug!("{}: {} references", path, found.len());

        queue.extend(scannable_targets(&found));
        all.extend(found);
    }

    all
}

fn scannable_targets(references: &[Reference]) -> impl Iterator<Item = String> + '_ {
    references
        .iter()
        .filter(|r| r.in_zip && r.ref_type != ReferenceType::Anchor)
        .filter_map(|r| r.normalized.clone())
        .filter(|p| matches!(extension(p).as_deref(), Some("css" | "js" | "mjs")))
}
