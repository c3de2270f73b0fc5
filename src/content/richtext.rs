//! Rich text documents and their HTML serialization
//!
//! The content API stores long-form text as an ordered list of typed blocks.
//! Text blocks carry UTF-16 offset spans for inline formatting. The
//! serializer escapes every piece of text and every attribute, so the only
//! raw markup it can emit is oEmbed HTML, and only when the site opts in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::SiteConfig;
use crate::helpers::{html_escape, post_path, url_for};

/// A single block of a rich text field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RichTextBlock {
    #[serde(rename = "paragraph")]
    Paragraph(TextBlock),
    #[serde(rename = "heading1")]
    Heading1(TextBlock),
    #[serde(rename = "heading2")]
    Heading2(TextBlock),
    #[serde(rename = "heading3")]
    Heading3(TextBlock),
    #[serde(rename = "heading4")]
    Heading4(TextBlock),
    #[serde(rename = "heading5")]
    Heading5(TextBlock),
    #[serde(rename = "heading6")]
    Heading6(TextBlock),
    #[serde(rename = "preformatted")]
    Preformatted(TextBlock),
    #[serde(rename = "list-item")]
    ListItem(TextBlock),
    #[serde(rename = "o-list-item")]
    OrderedListItem(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "embed")]
    Embed(EmbedBlock),
    #[serde(other)]
    Unsupported,
}

/// Text with inline spans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TextBlock {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }
}

/// Inline formatting over `[start, end)` UTF-16 code unit offsets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(flatten)]
    pub kind: SpanKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SpanKind {
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "em")]
    Em,
    #[serde(rename = "hyperlink")]
    Hyperlink { data: LinkData },
    #[serde(rename = "label")]
    Label { data: LabelData },
    #[serde(other)]
    Unsupported,
}

/// Target of a hyperlink span
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkData {
    pub link_type: Option<String>,
    pub url: Option<String>,
    pub target: Option<String>,
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub document_type: Option<String>,
    #[serde(rename = "isBroken")]
    pub is_broken: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelData {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedBlock {
    pub oembed: OEmbed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OEmbed {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub embed_url: String,
    pub html: Option<String>,
    pub provider_name: Option<String>,
    pub title: Option<String>,
}

/// Serializes rich text blocks to HTML
#[derive(Debug, Clone)]
pub struct RichTextRenderer {
    config: SiteConfig,
}

impl RichTextRenderer {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Render a block sequence; consecutive list items share one list element
    pub fn render(&self, blocks: &[RichTextBlock]) -> String {
        let mut html = String::new();
        let mut open_list: Option<&'static str> = None;

        for block in blocks {
            let list_tag = match block {
                RichTextBlock::ListItem(_) => Some("ul"),
                RichTextBlock::OrderedListItem(_) => Some("ol"),
                _ => None,
            };

            if open_list != list_tag {
                if let Some(tag) = open_list {
                    html.push_str(&format!("</{}>", tag));
                }
                if let Some(tag) = list_tag {
                    html.push_str(&format!("<{}>", tag));
                }
                open_list = list_tag;
            }

            html.push_str(&self.render_block(block));
        }

        if let Some(tag) = open_list {
            html.push_str(&format!("</{}>", tag));
        }

        html
    }

    fn render_block(&self, block: &RichTextBlock) -> String {
        match block {
            RichTextBlock::Paragraph(text) => self.text_element("p", text),
            RichTextBlock::Heading1(text) => self.text_element("h1", text),
            RichTextBlock::Heading2(text) => self.text_element("h2", text),
            RichTextBlock::Heading3(text) => self.text_element("h3", text),
            RichTextBlock::Heading4(text) => self.text_element("h4", text),
            RichTextBlock::Heading5(text) => self.text_element("h5", text),
            RichTextBlock::Heading6(text) => self.text_element("h6", text),
            RichTextBlock::Preformatted(text) => self.text_element("pre", text),
            RichTextBlock::ListItem(text) | RichTextBlock::OrderedListItem(text) => {
                self.text_element("li", text)
            }
            RichTextBlock::Image(image) => {
                let copyright = image
                    .copyright
                    .as_deref()
                    .map(|c| format!(r#" copyright="{}""#, html_escape(c)))
                    .unwrap_or_default();
                format!(
                    r#"<p class="block-img"><img src="{}" alt="{}"{} /></p>"#,
                    html_escape(&safe_url(&image.url)),
                    html_escape(image.alt.as_deref().unwrap_or("")),
                    copyright
                )
            }
            RichTextBlock::Embed(embed) => self.render_embed(&embed.oembed),
            RichTextBlock::Unsupported => String::new(),
        }
    }

    fn text_element(&self, tag: &str, block: &TextBlock) -> String {
        let class = block
            .label
            .as_deref()
            .map(|label| format!(r#" class="{}""#, html_escape(label)))
            .unwrap_or_default();
        format!(
            "<{tag}{class}>{}</{tag}>",
            self.render_spans(&block.text, &block.spans)
        )
    }

    fn render_embed(&self, oembed: &OEmbed) -> String {
        let mut attrs = format!(r#" data-oembed="{}""#, html_escape(&oembed.embed_url));
        if let Some(kind) = &oembed.kind {
            attrs.push_str(&format!(r#" data-oembed-type="{}""#, html_escape(kind)));
        }
        if let Some(provider) = &oembed.provider_name {
            attrs.push_str(&format!(
                r#" data-oembed-provider="{}""#,
                html_escape(&provider.to_lowercase())
            ));
        }

        let inner = match (&oembed.html, self.config.trust_embed_html) {
            (Some(html), true) => html.clone(),
            _ => format!(
                r#"<a href="{}" target="_blank" rel="noopener">{}</a>"#,
                html_escape(&safe_url(&oembed.embed_url)),
                html_escape(oembed.title.as_deref().unwrap_or(&oembed.embed_url))
            ),
        };

        format!("<div{}>{}</div>", attrs, inner)
    }

    /// Apply spans to `text`
    ///
    /// Span offsets are UTF-16 code units. Spans that cross each other are
    /// closed and reopened at the crossing point so the produced markup
    /// always nests.
    fn render_spans(&self, text: &str, spans: &[Span]) -> String {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let offsets = Utf16Offsets::new(&chars);

        let mut ordered: Vec<(usize, usize, &SpanKind)> = spans
            .iter()
            .filter(|s| !matches!(s.kind, SpanKind::Unsupported))
            .map(|s| (offsets.char_index(s.start), offsets.char_index(s.end), &s.kind))
            .filter(|(start, end, _)| start < end)
            .collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut boundaries = BTreeSet::new();
        boundaries.insert(0);
        boundaries.insert(len);
        for (start, end, _) in &ordered {
            boundaries.insert(*start);
            boundaries.insert(*end);
        }
        let boundaries: Vec<usize> = boundaries.into_iter().collect();

        let mut html = String::new();
        let mut stack: Vec<usize> = Vec::new();

        for window in boundaries.windows(2) {
            let (from, to) = (window[0], window[1]);
            let active: Vec<usize> = ordered
                .iter()
                .enumerate()
                .filter(|(_, (start, end, _))| *start <= from && *end >= to)
                .map(|(i, _)| i)
                .collect();

            let common = stack
                .iter()
                .zip(active.iter())
                .take_while(|(a, b)| a == b)
                .count();

            while stack.len() > common {
                if let Some(i) = stack.pop() {
                    html.push_str(close_tag(ordered[i].2));
                }
            }
            for &i in &active[common..] {
                html.push_str(&self.open_tag(ordered[i].2));
                stack.push(i);
            }

            let segment: String = chars[from..to].iter().collect();
            html.push_str(&html_escape(&segment).replace('\n', "<br />"));
        }

        while let Some(i) = stack.pop() {
            html.push_str(close_tag(ordered[i].2));
        }

        html
    }

    fn open_tag(&self, kind: &SpanKind) -> String {
        match kind {
            SpanKind::Strong => "<strong>".to_string(),
            SpanKind::Em => "<em>".to_string(),
            SpanKind::Hyperlink { data } => {
                let target = data
                    .target
                    .as_deref()
                    .map(|t| format!(r#" target="{}" rel="noopener""#, html_escape(t)))
                    .unwrap_or_default();
                format!(
                    r#"<a href="{}"{}>"#,
                    html_escape(&self.resolve_link(data)),
                    target
                )
            }
            SpanKind::Label { data } => {
                format!(r#"<span class="{}">"#, html_escape(&data.label))
            }
            SpanKind::Unsupported => String::new(),
        }
    }

    /// Resolve a link to an href
    fn resolve_link(&self, link: &LinkData) -> String {
        if link.is_broken == Some(true) {
            return "#".to_string();
        }

        match link.link_type.as_deref() {
            Some("Document") => match (&link.uid, &link.document_type) {
                (Some(uid), Some(doc_type)) if *doc_type == self.config.document_type => {
                    url_for(&self.config, &post_path(uid))
                }
                _ => url_for(&self.config, ""),
            },
            _ => link
                .url
                .as_deref()
                .map(safe_url)
                .unwrap_or_else(|| "#".to_string()),
        }
    }
}

/// Maps UTF-16 offsets onto char indices of the same text
struct Utf16Offsets {
    /// UTF-16 offset at which each char starts
    starts: Vec<usize>,
}

impl Utf16Offsets {
    fn new(chars: &[char]) -> Self {
        let mut starts = Vec::with_capacity(chars.len());
        let mut offset = 0;
        for c in chars {
            starts.push(offset);
            offset += c.len_utf16();
        }
        Self { starts }
    }

    /// Index of the first char starting at or after `offset`
    ///
    /// An offset inside a surrogate pair moves to the next char; offsets
    /// past the end clamp to the length.
    fn char_index(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start < offset)
    }
}

fn close_tag(kind: &SpanKind) -> &'static str {
    match kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink { .. } => "</a>",
        SpanKind::Label { .. } => "</span>",
        SpanKind::Unsupported => "",
    }
}

/// Neutralize script URLs
fn safe_url(url: &str) -> String {
    let scheme = url.trim_start().to_ascii_lowercase();
    if scheme.starts_with("javascript:") || scheme.starts_with("vbscript:") {
        "#".to_string()
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn renderer() -> RichTextRenderer {
        RichTextRenderer::new(&SiteConfig::default())
    }

    fn blocks(value: serde_json::Value) -> Vec<RichTextBlock> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_paragraph_is_escaped() {
        let html = renderer().render(&[RichTextBlock::Paragraph(TextBlock::plain(
            "1 < 2 & <script>",
        ))]);
        assert_eq!(html, "<p>1 &lt; 2 &amp; &lt;script&gt;</p>");
    }

    #[test]
    fn test_blocks_concatenate_without_separator() {
        let html = renderer().render(&blocks(json!([
            { "type": "heading2", "text": "Title", "spans": [] },
            { "type": "paragraph", "text": "Line one\nLine two", "spans": [] },
            { "type": "preformatted", "text": "let x = 1;", "spans": [] }
        ])));
        assert_eq!(
            html,
            "<h2>Title</h2><p>Line one<br />Line two</p><pre>let x = 1;</pre>"
        );
    }

    #[test]
    fn test_nested_spans() {
        let html = renderer().render(&blocks(json!([{
            "type": "paragraph",
            "text": "hello brave world",
            "spans": [
                { "start": 0, "end": 11, "type": "strong" },
                { "start": 6, "end": 11, "type": "em" }
            ]
        }])));
        assert_eq!(
            html,
            "<p><strong>hello <em>brave</em></strong> world</p>"
        );
    }

    #[test]
    fn test_overlapping_spans_stay_well_formed() {
        let html = renderer().render(&blocks(json!([{
            "type": "paragraph",
            "text": "abcdef",
            "spans": [
                { "start": 0, "end": 4, "type": "strong" },
                { "start": 2, "end": 6, "type": "em" }
            ]
        }])));
        assert_eq!(
            html,
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_spans_use_utf16_offsets() {
        let html = renderer().render(&blocks(json!([{
            "type": "paragraph",
            "text": "ação rápida",
            "spans": [{ "start": 5, "end": 11, "type": "strong" }]
        }])));
        assert_eq!(html, "<p>ação <strong>rápida</strong></p>");

        // The emoji takes two UTF-16 code units
        let html = renderer().render(&blocks(json!([{
            "type": "paragraph",
            "text": "😀 bold 🚀 end",
            "spans": [
                { "start": 3, "end": 7, "type": "strong" },
                { "start": 8, "end": 10, "type": "em" },
                { "start": 11, "end": 99, "type": "em" }
            ]
        }])));
        assert_eq!(
            html,
            "<p>😀 <strong>bold</strong> <em>🚀</em> <em>end</em></p>"
        );
    }

    #[test]
    fn test_utf16_offsets_inside_surrogate_pair() {
        let chars: Vec<char> = "a😀b".chars().collect();
        let offsets = Utf16Offsets::new(&chars);
        assert_eq!(offsets.char_index(0), 0);
        assert_eq!(offsets.char_index(1), 1);
        assert_eq!(offsets.char_index(2), 2);
        assert_eq!(offsets.char_index(3), 2);
        assert_eq!(offsets.char_index(4), 3);
        assert_eq!(offsets.char_index(40), 3);
    }

    #[test]
    fn test_hyperlinks() {
        let html = renderer().render(&blocks(json!([{
            "type": "paragraph",
            "text": "docs and post and bad",
            "spans": [
                { "start": 0, "end": 4, "type": "hyperlink",
                  "data": { "link_type": "Web", "url": "https://docs.rs", "target": "_blank" } },
                { "start": 9, "end": 13, "type": "hyperlink",
                  "data": { "link_type": "Document", "uid": "criando-um-app", "type": "post" } },
                { "start": 18, "end": 21, "type": "hyperlink",
                  "data": { "link_type": "Web", "url": "javascript:alert(1)" } }
            ]
        }])));
        assert_eq!(
            html,
            concat!(
                r##"<p><a href="https://docs.rs" target="_blank" rel="noopener">docs</a> and "##,
                r##"<a href="/post/criando-um-app/">post</a> and <a href="#">bad</a></p>"##
            )
        );
    }

    #[test]
    fn test_list_items_are_grouped() {
        let html = renderer().render(&blocks(json!([
            { "type": "list-item", "text": "one", "spans": [] },
            { "type": "list-item", "text": "two", "spans": [] },
            { "type": "o-list-item", "text": "first", "spans": [] },
            { "type": "paragraph", "text": "after", "spans": [] }
        ])));
        assert_eq!(
            html,
            "<ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><p>after</p>"
        );
    }

    #[test]
    fn test_image_and_unknown_blocks() {
        let html = renderer().render(&blocks(json!([
            { "type": "image", "url": "https://images.prismic.io/a.png", "alt": "A \"cat\"",
              "dimensions": { "width": 10, "height": 10 } },
            { "type": "table", "rows": [] }
        ])));
        assert_eq!(
            html,
            r#"<p class="block-img"><img src="https://images.prismic.io/a.png" alt="A &quot;cat&quot;" /></p>"#
        );
    }

    #[test]
    fn test_embed_trust() {
        let embed = blocks(json!([{
            "type": "embed",
            "oembed": {
                "type": "video",
                "embed_url": "https://youtu.be/x",
                "provider_name": "YouTube",
                "title": "Talk",
                "html": "<iframe src=\"https://youtube.com/embed/x\"></iframe>"
            }
        }]));

        let trusted = renderer().render(&embed);
        assert!(trusted.contains("<iframe"));
        assert!(trusted.contains(r#"data-oembed-provider="youtube""#));

        let config = SiteConfig {
            trust_embed_html: false,
            ..SiteConfig::default()
        };
        let untrusted = RichTextRenderer::new(&config).render(&embed);
        assert!(!untrusted.contains("<iframe"));
        assert!(untrusted.contains(r#"<a href="https://youtu.be/x""#));
        assert!(untrusted.contains(">Talk</a>"));
    }

    #[test]
    fn test_label_spans_and_blocks() {
        let html = renderer().render(&blocks(json!([{
            "type": "paragraph",
            "text": "note",
            "label": "callout",
            "spans": [{ "start": 0, "end": 4, "type": "label", "data": { "label": "hl" } }]
        }])));
        assert_eq!(html, r#"<p class="callout"><span class="hl">note</span></p>"#);
    }
}
