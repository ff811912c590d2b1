//! HTML flattening for cobalt error texts.
//!
//! Cobalt error messages sometimes carry HTML (paragraphs, links, emphasis).
//! The markup is rewritten into its Markdown equivalent with ATX-style
//! headings and everything else is stripped. Telegram then gets that Markdown
//! back as its own HTML subset.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#).unwrap()
});
static STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(b|strong)\b[^>]*>(.*?)</(b|strong)\s*>").unwrap());
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(i|em)\b[^>]*>(.*?)</(i|em)\s*>").unwrap());
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<code\b[^>]*>(.*?)</code\s*>").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\r\n]+").unwrap());
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<li\b[^>]*>").unwrap());
static BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(p|div|ul|ol|blockquote)\b[^>]*>").unwrap());
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").unwrap());
static LINE_EDGES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]*\n[ \t]*").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

static MD_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static MD_STRONG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").unwrap());
static MD_EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\s][^*\n]*)\*").unwrap());
static MD_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\n]+)\]\(([^)\s]+)\)").unwrap());
static MD_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#{1,6} (.+)$").unwrap());

/// Convert an HTML fragment into Markdown-flavoured plain text.
///
/// Whitespace is collapsed as in rendered HTML; line breaks come only from
/// `<br>` and block elements.
pub fn html_to_markdown(html: &str) -> String {
    let text = WHITESPACE.replace_all(html, " ");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = CODE.replace_all(&text, "`$1`");
    let text = STRONG.replace_all(&text, "**$2**");
    let text = EMPHASIS.replace_all(&text, "*$2*");
    let text = LINK.replace_all(&text, |caps: &Captures| {
        let href = &caps[1];
        let label = ANY_TAG.replace_all(&caps[2], "");
        let label = label.trim();
        if label.is_empty() || label == href {
            href.to_string()
        } else {
            format!("[{label}]({href})")
        }
    });
    let text = HEADING.replace_all(&text, |caps: &Captures| {
        let level: usize = caps[1].parse().unwrap_or(1);
        let inner = ANY_TAG.replace_all(&caps[2], "");
        format!("\n\n{} {}\n\n", "#".repeat(level), inner.trim())
    });
    let text = LIST_ITEM.replace_all(&text, "\n* ");
    let text = BLOCK.replace_all(&text, "\n\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);
    let text = LINE_EDGES.replace_all(&text, "\n");
    let text = BLANK_LINES.replace_all(&text, "\n\n");

    text.trim().to_string()
}

/// Render the Markdown produced by [`html_to_markdown`] as Telegram HTML.
///
/// The input is escaped first, so anything that isn't one of the supported
/// constructs shows up literally.
pub fn markdown_to_html(markdown: &str) -> String {
    let text = escape_html(markdown);
    let text = MD_CODE.replace_all(&text, "<code>${1}</code>");
    let text = MD_STRONG.replace_all(&text, "<b>${1}</b>");
    let text = MD_EMPHASIS.replace_all(&text, "<i>${1}</i>");
    let text = MD_LINK.replace_all(&text, "<a href=\"${2}\">${1}</a>");
    let text = MD_HEADING.replace_all(&text, "<b>${1}</b>");
    text.into_owned()
}

fn decode_entities(s: &str) -> String {
    let s = NUMERIC_ENTITY.replace_all(s, |caps: &Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse().ok(),
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    // `&amp;` last so `&amp;lt;` decodes to `&lt;`, not `<`.
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}
