//! Markup-to-text conversion for SAP Help page bodies.
//!
//! This is a restricted-grammar text filter, not an HTML parser. It
//! understands the subset the portal emits for topic bodies:
//!
//! | Markup | Output |
//! |--------|--------|
//! | `<script>`, `<style>` | removed with contents |
//! | `<h1>`..`<h6>` | newline + `#`..`######` |
//! | `<p>`, `</p>`, `<br>` | newline |
//! | `<li>` | newline + `• ` |
//! | `<code>` | `` ` `` delimiters |
//! | `<pre>` | fenced code block |
//! | other tags | removed |
//!
//! Anything that does not look like a tag (e.g. `a < b`) passes through.
//! Entities are decoded last, then blank-line runs are collapsed.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("valid script/style regex")
});

static PRE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<pre\b[^>]*>(.*?)</pre\s*>").expect("valid pre regex")
});

static HEADING_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<h([1-6])\b[^>]*>").expect("valid heading regex"));

static HEADING_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</h[1-6]\s*>").expect("valid heading close regex"));

static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?p\b[^>]*>").expect("valid paragraph regex"));

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\b[^>]*/?>").expect("valid br regex"));

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<li\b[^>]*>").expect("valid li regex"));

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?code\b[^>]*>").expect("valid code regex"));

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z][A-Za-z0-9:-]*(?:\s[^<>]*)?/?>")
        .expect("valid tag regex")
});

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n)+").expect("valid blank-line regex"));

/// Convert a page body to Markdown-flavoured plain text.
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_STYLE.replace_all(html, "");

    let text = PRE_BLOCK.replace_all(&text, |caps: &Captures| {
        let inner = ANY_TAG.replace_all(&caps[1], "");
        format!("\n```\n{}\n```\n", inner.trim_matches('\n'))
    });

    let text = HEADING_OPEN.replace_all(&text, |caps: &Captures| {
        let level: usize = caps[1].parse().unwrap_or(1);
        format!("\n{} ", "#".repeat(level))
    });
    let text = HEADING_CLOSE.replace_all(&text, "\n");

    let text = PARAGRAPH.replace_all(&text, "\n");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = LIST_ITEM.replace_all(&text, "\n• ");
    let text = INLINE_CODE.replace_all(&text, "`");

    let text = ANY_TAG.replace_all(&text, "");
    let text = html_escape::decode_html_entities(&text);

    BLANK_RUN.replace_all(&text, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_and_paragraph() {
        let out = html_to_text("<h1>Title</h1><p>Hello<br/>World</p>");
        assert_eq!(out, "# Title\n\nHello\nWorld");
    }

    #[test]
    fn test_heading_levels() {
        let out = html_to_text("<h3 class=\"x\">Deep</h3>");
        assert_eq!(out, "### Deep");
    }

    #[test]
    fn test_strips_script_and_style() {
        let out = html_to_text(
            "<style>.a{color:red}</style><p>Keep</p><script type=\"text/javascript\">alert('x')</script>",
        );
        assert_eq!(out, "Keep");
    }

    #[test]
    fn test_list_items() {
        let out = html_to_text("<ul><li>One</li><li>Two</li></ul>");
        assert_eq!(out, "• One\n• Two");
    }

    #[test]
    fn test_inline_code() {
        let out = html_to_text("<p>Call <code>BAPI_CURRENCY_CONV</code> first.</p>");
        assert_eq!(out, "Call `BAPI_CURRENCY_CONV` first.");
    }

    #[test]
    fn test_preformatted_block() {
        let out = html_to_text("<p>Example:</p><pre><code>SELECT *\nFROM t</code></pre>");
        assert_eq!(out, "Example:\n\n```\nSELECT *\nFROM t\n```");
    }

    #[test]
    fn test_unknown_tags_removed_text_kept() {
        let out = html_to_text("<div><span class=\"ph\">Value</span> &amp; more</div>");
        assert_eq!(out, "Value & more");
    }

    #[test]
    fn test_non_tag_angle_brackets_pass_through() {
        let out = html_to_text("<p>if a < b and c > d</p>");
        assert_eq!(out, "if a < b and c > d");
    }

    #[test]
    fn test_collapses_blank_lines() {
        let out = html_to_text("<p>A</p>\n\n   \n<p></p><p>B</p>");
        assert_eq!(out, "A\n\nB");
    }

    #[test]
    fn test_no_leftover_tags() {
        let out = html_to_text("<section><h2>Steps</h2><ol><li><p>Open</p></li></ol></section>");
        assert!(!out.contains('<'), "leftover tag in {:?}", out);
    }
}
