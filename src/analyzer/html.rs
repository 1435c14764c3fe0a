//! Tolerant HTML tag scanner
//!
//! Creatives are frequently hand-edited or minified into shapes a strict
//! parser rejects, so the document is tokenized with regular expressions
//! instead: every start tag with its attributes, plus the raw text of each
//! `<style>` and `<script>` element. Comments are blanked before scanning so
//! commented-out markup produces no references. Scanning never fails; bad
//! markup simply yields fewer tags.

use regex::Regex;
use std::sync::OnceLock;

static TAG_RE: OnceLock<Regex> = OnceLock::new();
static ATTR_RE: OnceLock<Regex> = OnceLock::new();

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| {
        Regex::new(
            r#"<([A-Za-z][A-Za-z0-9:-]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*/?>"#,
        )
        .expect("tag regex is valid")
    })
}

fn attr_re() -> &'static Regex {
    ATTR_RE.get_or_init(|| {
        Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("attribute regex is valid")
    })
}

/// A start tag with lowercase name and attribute names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Lowercase element name
    pub name: String,
    /// `(lowercase name, raw value)` pairs in source order
    pub attrs: Vec<(String, String)>,
    /// 1-based line of the `<`
    pub line: usize,
    /// 1-based byte column of the `<`
    pub column: usize,
}

impl Tag {
    /// First value of an attribute (name is matched case-insensitively)
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether a space-separated attribute contains a token (e.g. `rel`)
    pub fn attr_has_token(&self, name: &str, token: &str) -> bool {
        self.attr(name)
            .map(|v| v.split_ascii_whitespace().any(|t| t.eq_ignore_ascii_case(token)))
            .unwrap_or(false)
    }
}

/// Raw text content of a `<style>` or `<script>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    /// Element text, untouched
    pub text: String,
    /// 1-based line where the text starts
    pub line: usize,
    /// Lowercased `type` attribute of the owning element
    pub mime: Option<String>,
}

/// Scanned document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlDocument {
    /// Every start tag in source order
    pub tags: Vec<Tag>,
    /// Inline stylesheets
    pub styles: Vec<TextBlock>,
    /// Inline scripts (external `<script src>` elements included, usually empty)
    pub scripts: Vec<TextBlock>,
}

impl HtmlDocument {
    /// Scan a document
    ///
    /// # Examples
    ///
    /// ```
    /// use h5_audit::analyzer::html::HtmlDocument;
    ///
    /// let doc = HtmlDocument::parse(r#"<img SRC="a.png"><style>b{}</style>"#);
    /// assert_eq!(doc.tags[0].attr("src"), Some("a.png"));
    /// assert_eq!(doc.styles[0].text, "b{}");
    /// ```
    pub fn parse(source: &str) -> Self {
        let masked = mask_comments(source);
        let lower = masked.to_ascii_lowercase();
        let lines = LineIndex::new(source);

        let mut doc = HtmlDocument::default();
        let mut pos = 0;

        while let Some(caps) = tag_re().captures_at(&masked, pos) {
            let Some(whole) = caps.get(0) else { break };
            let name = caps[1].to_ascii_lowercase();
            let attrs = parse_attributes(caps.get(2).map_or("", |m| m.as_str()));
            let (line, column) = lines.position(whole.start());
            pos = whole.end();

            // Raw-text elements: everything up to the closing tag is content
            if name == "script" || name == "style" {
                let close = format!("</{}", name);
                let end = lower[pos..]
                    .find(&close)
                    .map(|i| pos + i)
                    .unwrap_or(source.len());
                let block = TextBlock {
                    text: source[pos..end].to_string(),
                    line: lines.position(pos).0,
                    mime: attrs
                        .iter()
                        .find(|(n, _)| n == "type")
                        .map(|(_, v)| v.trim().to_ascii_lowercase()),
                };
                if name == "script" {
                    doc.scripts.push(block);
                } else {
                    doc.styles.push(block);
                }
                pos = end;
            }

            doc.tags.push(Tag {
                name,
                attrs,
                line,
                column,
            });
        }

        doc
    }

    /// Tags with the given lowercase name
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags.iter().filter(move |t| t.name == name)
    }
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    attr_re()
        .captures_iter(raw)
        .filter_map(|cap| {
            let name = cap.get(1)?.as_str().to_ascii_lowercase();
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .or_else(|| cap.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

/// Decode the handful of entities that show up inside attribute values
fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Replace `<!-- ... -->` with spaces, keeping byte offsets and newlines
fn mask_comments(source: &str) -> String {
    let mut bytes = source.as_bytes().to_vec();
    let mut search = 0;
    while let Some(start) = source[search..].find("<!--").map(|i| search + i) {
        let end = source[start + 4..]
            .find("-->")
            .map(|i| start + 4 + i + 3)
            .unwrap_or(source.len());
        for b in &mut bytes[start..end] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
        search = end;
    }
    // Whole comment ranges are replaced with ASCII, so this cannot fail
    String::from_utf8(bytes).unwrap_or_else(|_| source.to_string())
}

/// Byte offset → (line, column) lookup
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    /// Index the line starts of a text
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    /// 1-based line and byte column of an offset
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line + 1, offset - self.starts[line] + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reads_quoted_unquoted_and_bare_attributes() {
        let doc = HtmlDocument::parse(r#"<video src=intro.mp4 autoplay data-x='1' poster="p.jpg">"#);
        let tag = &doc.tags[0];
        assert_eq!(tag.name, "video");
        assert_eq!(tag.attr("src"), Some("intro.mp4"));
        assert_eq!(tag.attr("autoplay"), Some(""));
        assert_eq!(tag.attr("data-x"), Some("1"));
        assert_eq!(tag.attr("POSTER"), Some("p.jpg"));
    }

    #[test]
    fn test_parse_skips_commented_markup() {
        let doc = HtmlDocument::parse("<!-- <img src=\"old.png\"> -->\n<img src=\"new.png\">");
        assert_eq!(doc.tags.len(), 1);
        assert_eq!(doc.tags[0].attr("src"), Some("new.png"));
        assert_eq!(doc.tags[0].line, 2);
    }

    #[test]
    fn test_parse_does_not_scan_inside_scripts() {
        let doc = HtmlDocument::parse(
            "<script>var s = '<img src=\"fake.png\">';</script><img src=\"real.png\">",
        );
        let imgs: Vec<_> = doc.tags_named("img").collect();
        assert_eq!(imgs.len(), 1);
        assert_eq!(imgs[0].attr("src"), Some("real.png"));
        assert_eq!(doc.scripts.len(), 1);
        assert!(doc.scripts[0].text.contains("fake.png"));
    }

    #[test]
    fn test_parse_captures_style_blocks_with_line() {
        let doc = HtmlDocument::parse("<html>\n<head>\n<STYLE type=\"text/css\">\n#ad{width:300px}\n</STYLE>");
        assert_eq!(doc.styles.len(), 1);
        assert_eq!(doc.styles[0].line, 3);
        assert_eq!(doc.styles[0].mime.as_deref(), Some("text/css"));
        assert!(doc.styles[0].text.contains("#ad{width:300px}"));
    }

    #[test]
    fn test_parse_unclosed_script_runs_to_end() {
        let doc = HtmlDocument::parse("<script>var a = 1;");
        assert_eq!(doc.scripts[0].text, "var a = 1;");
    }

    #[test]
    fn test_parse_decodes_entities_in_values() {
        let doc = HtmlDocument::parse(r#"<a href="click.html?a=1&amp;b=2">"#);
        assert_eq!(doc.tags[0].attr("href"), Some("click.html?a=1&b=2"));
    }

    #[test]
    fn test_attr_has_token_matches_space_separated_values() {
        let doc = HtmlDocument::parse(r#"<link rel="preload Stylesheet" href="a.css">"#);
        assert!(doc.tags[0].attr_has_token("rel", "stylesheet"));
        assert!(!doc.tags[0].attr_has_token("rel", "icon"));
    }

    #[test]
    fn test_parse_garbage_yields_no_tags() {
        let doc = HtmlDocument::parse("<<<>>> < not a tag > \u{1F600}");
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn test_line_index_positions_are_one_based() {
        let index = LineIndex::new("ab\ncd\n");
        assert_eq!(index.position(0), (1, 1));
        assert_eq!(index.position(1), (1, 2));
        assert_eq!(index.position(3), (2, 1));
        assert_eq!(index.position(4), (2, 2));
    }
}
