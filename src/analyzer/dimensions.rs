//! Creative size detection
//!
//! Sources are tried in a fixed order and the first explicit declaration
//! wins:
//!
//! 1. `<meta name="ad.size" content="width=W,height=H">`
//! 2. `<meta name="WxH">`
//! 3. Vendor metadata: JSON script blocks or an authoring-tool `properties`
//!    object exposing numeric width/height
//! 4. CSS: every `<style>` block, inline `style` attribute and linked
//!    in-bundle stylesheet; the candidate with the largest area wins
//!
//! CSS is only consulted when no explicit declaration exists, so a meta tag
//! always beats a larger CSS rule.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::css::{declared_size, largest_area, size_candidates, CssSize, CssSizeOrigin};
use super::html::HtmlDocument;
use super::references::is_data_block;
use super::resolver::resolve_decoded;
use crate::bundle::Bundle;

static META_WIDTH_RE: OnceLock<Regex> = OnceLock::new();
static META_HEIGHT_RE: OnceLock<Regex> = OnceLock::new();
static WXH_RE: OnceLock<Regex> = OnceLock::new();
static VENDOR_PROPS_RE: OnceLock<Regex> = OnceLock::new();

fn meta_width_re() -> &'static Regex {
    META_WIDTH_RE
        .get_or_init(|| Regex::new(r"(?i)\bwidth\s*=\s*(\d+)").expect("meta width regex is valid"))
}

fn meta_height_re() -> &'static Regex {
    META_HEIGHT_RE.get_or_init(|| {
        Regex::new(r"(?i)\bheight\s*=\s*(\d+)").expect("meta height regex is valid")
    })
}

fn wxh_re() -> &'static Regex {
    WXH_RE.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s*[xX×]\s*(\d+)\s*$").expect("WxH regex is valid")
    })
}

fn vendor_props_re() -> &'static Regex {
    VENDOR_PROPS_RE.get_or_init(|| {
        // Animate-style `lib.properties = { id: ..., width: 300, height: 250, ... }`
        Regex::new(r"properties\s*=\s*\{[^}]*?\bwidth\s*:\s*(\d+)[^}]*?\bheight\s*:\s*(\d+)")
            .expect("vendor properties regex is valid")
    })
}

/// Creative dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdSize {
    /// Width in px
    pub width: u32,
    /// Height in px
    pub height: u32,
}

impl AdSize {
    /// Width × height
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl From<CssSize> for AdSize {
    fn from(size: CssSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

impl fmt::Display for AdSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How a size was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeMethod {
    /// Declared meta tag
    Meta,
    /// Authoring-tool metadata block
    VendorMetadata,
    /// `@media` block
    CssMedia,
    /// Ordinary CSS rule
    CssRule,
    /// `style` attribute
    InlineStyle,
    /// Linked stylesheet
    LinkedCss,
}

impl SizeMethod {
    /// Label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeMethod::Meta => "meta",
            SizeMethod::VendorMetadata => "vendor-metadata",
            SizeMethod::CssMedia => "css-media",
            SizeMethod::CssRule => "css-rule",
            SizeMethod::InlineStyle => "inline-style",
            SizeMethod::LinkedCss => "linked-css",
        }
    }

    /// Whether the size was declared explicitly rather than inferred from CSS
    pub fn is_declared(&self) -> bool {
        matches!(self, SizeMethod::Meta | SizeMethod::VendorMetadata)
    }
}

impl fmt::Display for SizeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit trail for a detected size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeSourceInfo {
    /// Detection method
    pub method: SizeMethod,
    /// Text the size was read from
    pub snippet: String,
    /// File the text lives in
    pub path: String,
}

/// A size with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedSize {
    /// The size
    pub size: AdSize,
    /// Where it came from
    pub source: SizeSourceInfo,
}

impl DetectedSize {
    fn new(size: AdSize, method: SizeMethod, snippet: impl Into<String>, path: &str) -> Self {
        Self {
            size,
            source: SizeSourceInfo {
                method,
                snippet: snippet.into(),
                path: path.to_string(),
            },
        }
    }
}

/// Best-guess creative size for the primary document
///
/// # Examples
///
/// ```
/// use h5_audit::analyzer::dimensions::{detect_size, SizeMethod};
/// use h5_audit::analyzer::html::HtmlDocument;
/// use h5_audit::bundle::Bundle;
///
/// let html = r#"<meta name="ad.size" content="width=300,height=250">
/// <style>#stage { width: 970px; height: 250px }</style>"#;
/// let bundle = Bundle::from_files("ad", vec![("index.html".to_string(), html.as_bytes().to_vec())]);
///
/// let detected = detect_size(&bundle, "index.html", &HtmlDocument::parse(html)).unwrap();
/// assert_eq!(detected.size.to_string(), "300x250");
/// assert_eq!(detected.source.method, SizeMethod::Meta);
/// ```
pub fn detect_size(bundle: &Bundle, primary: &str, doc: &HtmlDocument) -> Option<DetectedSize> {
    let declared = meta_ad_size(primary, doc)
        .or_else(|| meta_wxh(primary, doc))
        .or_else(|| vendor_metadata(primary, doc));
    if declared.is_some() {
        return declared;
    }

    let candidates = css_candidates(bundle, primary, doc);
    log::debug!("{}: {} CSS size candidates", primary, candidates.len());
    largest_area(candidates, |c| c.size.area())
}

/// `<meta name="ad.size" content="width=W,height=H">`
pub fn meta_ad_size(primary: &str, doc: &HtmlDocument) -> Option<DetectedSize> {
    doc.tags_named("meta").find_map(|tag| {
        let name = tag.attr("name")?.to_ascii_lowercase();
        if !matches!(name.as_str(), "ad.size" | "ad-size" | "adsize") {
            return None;
        }
        let content = tag.attr("content")?;
        let width = capture_u32(meta_width_re(), content)?;
        let height = capture_u32(meta_height_re(), content)?;
        Some(DetectedSize::new(
            AdSize { width, height },
            SizeMethod::Meta,
            format!(r#"<meta name="{}" content="{}">"#, name, content),
            primary,
        ))
    })
}

/// `<meta name="300x250">`
pub fn meta_wxh(primary: &str, doc: &HtmlDocument) -> Option<DetectedSize> {
    doc.tags_named("meta").find_map(|tag| {
        let name = tag.attr("name")?;
        let cap = wxh_re().captures(name)?;
        let width = cap.get(1)?.as_str().parse().ok()?;
        let height = cap.get(2)?.as_str().parse().ok()?;
        Some(DetectedSize::new(
            AdSize { width, height },
            SizeMethod::Meta,
            format!(r#"<meta name="{}">"#, name),
            primary,
        ))
    })
}

/// Width/height exposed by an authoring tool's embedded metadata
pub fn vendor_metadata(primary: &str, doc: &HtmlDocument) -> Option<DetectedSize> {
    for block in &doc.scripts {
        let is_json = block.mime.as_deref().is_some_and(|m| m.contains("json"));
        if is_json {
            match serde_json::from_str::<serde_json::Value>(&block.text) {
                Ok(value) => {
                    if let Some(size) = json_size(&value) {
                        return Some(DetectedSize::new(
                            size,
                            SizeMethod::VendorMetadata,
                            format!("{{\"width\": {}, \"height\": {}}}", size.width, size.height),
                            primary,
                        ));
                    }
                }
                Err(e) => log::debug!("{}: skipping unparsable JSON block: {}", primary, e),
            }
        } else if !is_data_block(block.mime.as_deref()) {
            if let Some(cap) = vendor_props_re().captures(&block.text) {
                let (Some(w), Some(h)) = (cap.get(1), cap.get(2)) else {
                    continue;
                };
                let (Ok(width), Ok(height)) = (w.as_str().parse::<u32>(), h.as_str().parse::<u32>())
                else {
                    continue;
                };
                let size = AdSize { width, height };
                if (CssSize { width, height }).is_plausible() {
                    return Some(DetectedSize::new(
                        size,
                        SizeMethod::VendorMetadata,
                        cap.get(0).map_or("", |m| m.as_str()),
                        primary,
                    ));
                }
            }
        }
    }
    None
}

/// Depth-first search for an object with numeric `width` and `height`
fn json_size(value: &serde_json::Value) -> Option<AdSize> {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            let width = map.get("width").and_then(json_u32);
            let height = map.get("height").and_then(json_u32);
            if let (Some(width), Some(height)) = (width, height) {
                if (CssSize { width, height }).is_plausible() {
                    return Some(AdSize { width, height });
                }
            }
            map.values().find_map(json_size)
        }
        Value::Array(items) => items.iter().find_map(json_size),
        _ => None,
    }
}

fn json_u32(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().trim_end_matches("px").parse().ok(),
        _ => None,
    }
}

/// Every CSS-derived candidate, in source order: `<style>` blocks, inline
/// `style` attributes, then linked stylesheets
pub fn css_candidates(bundle: &Bundle, primary: &str, doc: &HtmlDocument) -> Vec<DetectedSize> {
    let mut out = Vec::new();

    for block in &doc.styles {
        for candidate in size_candidates(&block.text) {
            let method = match candidate.origin {
                CssSizeOrigin::Media => SizeMethod::CssMedia,
                CssSizeOrigin::Rule | CssSizeOrigin::Raw => SizeMethod::CssRule,
            };
            out.push(DetectedSize::new(
                candidate.size.into(),
                method,
                candidate.snippet,
                primary,
            ));
        }
    }

    for tag in &doc.tags {
        let Some(style) = tag.attr("style") else { continue };
        if let Some(size) = declared_size(style).filter(CssSize::is_plausible) {
            out.push(DetectedSize::new(
                size.into(),
                SizeMethod::InlineStyle,
                format!(r#"<{} style="{}">"#, tag.name, style.trim()),
                primary,
            ));
        }
    }

    for tag in doc.tags_named("link") {
        if !tag.attr_has_token("rel", "stylesheet") {
            continue;
        }
        let Some(path) = tag
            .attr("href")
            .and_then(|href| resolve_decoded(primary, href))
            .and_then(|p| bundle.canonical(&p))
        else {
            continue;
        };
        let Some(text) = bundle.text(path) else { continue };
        for candidate in size_candidates(&text) {
            out.push(DetectedSize::new(
                candidate.size.into(),
                SizeMethod::LinkedCss,
                candidate.snippet,
                path,
            ));
        }
    }

    out
}

fn capture_u32(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(files: &[(&str, &str)]) -> Option<DetectedSize> {
        let bundle = Bundle::from_files(
            "ad",
            files
                .iter()
                .map(|(p, c)| (p.to_string(), c.as_bytes().to_vec())),
        );
        let html = bundle.text("index.html").unwrap_or_default().into_owned();
        detect_size(&bundle, "index.html", &HtmlDocument::parse(&html))
    }

    #[test]
    fn test_detect_meta_ad_size_beats_larger_css() {
        let d = detect(&[(
            "index.html",
            r#"<meta name="ad.size" content="width=320,height=50"><div style="width:970px;height:250px">"#,
        )])
        .unwrap();
        assert_eq!(d.size, AdSize { width: 320, height: 50 });
        assert_eq!(d.source.method, SizeMethod::Meta);
    }

    #[test]
    fn test_detect_meta_wxh_name() {
        let d = detect(&[("index.html", r#"<meta name="160x600">"#)]).unwrap();
        assert_eq!(d.size, AdSize { width: 160, height: 600 });
        assert_eq!(d.source.method, SizeMethod::Meta);
    }

    #[test]
    fn test_detect_meta_ignores_viewport() {
        let d = detect(&[(
            "index.html",
            r#"<meta name="viewport" content="width=device-width, height=600"><style>#a{width:300px;height:600px}</style>"#,
        )])
        .unwrap();
        assert_eq!(d.source.method, SizeMethod::CssRule);
    }

    #[test]
    fn test_detect_vendor_json_block() {
        let d = detect(&[(
            "index.html",
            r#"<script type="application/json">{"creative": {"name": "x", "size": {"width": 728, "height": "90"}}}</script>"#,
        )])
        .unwrap();
        assert_eq!(d.size, AdSize { width: 728, height: 90 });
        assert_eq!(d.source.method, SizeMethod::VendorMetadata);
    }

    #[test]
    fn test_detect_vendor_properties_object() {
        let d = detect(&[(
            "index.html",
            r#"<script>lib.properties = { id: 'A1', width: 300, height: 600, fps: 24 };</script>"#,
        )])
        .unwrap();
        assert_eq!(d.size, AdSize { width: 300, height: 600 });
        assert_eq!(d.source.method, SizeMethod::VendorMetadata);
    }

    #[test]
    fn test_detect_malformed_json_falls_through_to_css() {
        let d = detect(&[(
            "index.html",
            r#"<script type="application/json">{"width": 300,</script><style>.ad{width:300px;height:250px}</style>"#,
        )])
        .unwrap();
        assert_eq!(d.source.method, SizeMethod::CssRule);
    }

    #[test]
    fn test_detect_css_largest_area_wins_across_sources() {
        let d = detect(&[
            (
                "index.html",
                r#"<link rel="stylesheet" href="css/main.css"><style>.a{width:300px;height:250px}</style><div style="width:320px;height:50px">"#,
            ),
            ("css/main.css", "@media all { .b { width:300px; height:600px } }"),
        ])
        .unwrap();
        assert_eq!(d.size, AdSize { width: 300, height: 600 });
        assert_eq!(d.source.method, SizeMethod::LinkedCss);
        assert_eq!(d.source.path, "css/main.css");
    }

    #[test]
    fn test_detect_css_tie_keeps_first_found() {
        let d = detect(&[(
            "index.html",
            r#"<style>@media all { .m { width:250px; height:300px } } .r { width:300px; height:250px }</style>"#,
        )])
        .unwrap();
        assert_eq!(d.source.method, SizeMethod::CssMedia);
        assert_eq!(d.size, AdSize { width: 250, height: 300 });
    }

    #[test]
    fn test_detect_inline_style_rejects_tiny_sizes() {
        let d = detect(&[(
            "index.html",
            r#"<div style="width:5px;height:5px"></div><div style="width:300px;height:250px"></div>"#,
        )])
        .unwrap();
        assert_eq!(d.source.method, SizeMethod::InlineStyle);
        assert_eq!(d.size.width, 300);
    }

    #[test]
    fn test_detect_nothing_returns_none() {
        assert!(detect(&[("index.html", "<p>hello</p>")]).is_none());
    }

    #[test]
    fn test_size_method_serializes_kebab_case() {
        let json = serde_json::to_string(&SizeMethod::VendorMetadata).unwrap();
        assert_eq!(json, "\"vendor-metadata\"");
    }
}
