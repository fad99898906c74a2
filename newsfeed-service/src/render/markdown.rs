//! Restricted markdown rendering.
//!
//! Only the allow-listed constructs produce markup: paragraphs, headings
//! 1-3, ordered and unordered lists, blockquotes, and http(s) links.
//! Everything else, including raw HTML, renders as escaped text.

/// Render post content to HTML using the restricted element set.
pub fn render_markdown(source: &str) -> String {
    let mut out = String::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut quote: Vec<&str> = Vec::new();
    let mut list: Option<(ListKind, Vec<String>)> = None;

    for raw_line in source.lines() {
        let line = raw_line.trim();

        if line.is_empty() {
            flush_paragraph(&mut out, &mut paragraph);
            flush_quote(&mut out, &mut quote);
            flush_list(&mut out, &mut list);
            continue;
        }

        if let Some((level, text)) = parse_heading(line) {
            flush_paragraph(&mut out, &mut paragraph);
            flush_quote(&mut out, &mut quote);
            flush_list(&mut out, &mut list);
            out.push_str(&format!("<h{level}>{}</h{level}>", render_inline(text)));
            continue;
        }

        if let Some(item) = parse_list_item(line, ListKind::Unordered) {
            flush_paragraph(&mut out, &mut paragraph);
            flush_quote(&mut out, &mut quote);
            push_list_item(&mut out, &mut list, ListKind::Unordered, item);
            continue;
        }

        if let Some(item) = parse_list_item(line, ListKind::Ordered) {
            flush_paragraph(&mut out, &mut paragraph);
            flush_quote(&mut out, &mut quote);
            push_list_item(&mut out, &mut list, ListKind::Ordered, item);
            continue;
        }

        if let Some(rest) = line.strip_prefix('>') {
            flush_paragraph(&mut out, &mut paragraph);
            flush_list(&mut out, &mut list);
            quote.push(rest.trim_start());
            continue;
        }

        flush_quote(&mut out, &mut quote);
        flush_list(&mut out, &mut list);
        paragraph.push(line);
    }

    flush_paragraph(&mut out, &mut paragraph);
    flush_quote(&mut out, &mut quote);
    flush_list(&mut out, &mut list);

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

fn flush_paragraph(out: &mut String, paragraph: &mut Vec<&str>) {
    if paragraph.is_empty() {
        return;
    }
    let text = paragraph.join(" ");
    out.push_str(&format!("<p>{}</p>", render_inline(&text)));
    paragraph.clear();
}

fn flush_quote(out: &mut String, quote: &mut Vec<&str>) {
    if quote.is_empty() {
        return;
    }
    let text = quote.join(" ");
    out.push_str(&format!(
        "<blockquote><p>{}</p></blockquote>",
        render_inline(&text)
    ));
    quote.clear();
}

fn flush_list(out: &mut String, list: &mut Option<(ListKind, Vec<String>)>) {
    if let Some((kind, items)) = list.take() {
        let tag = kind.tag();
        out.push_str(&format!("<{tag}>"));
        for item in items {
            out.push_str(&format!("<li>{item}</li>"));
        }
        out.push_str(&format!("</{tag}>"));
    }
}

fn push_list_item(
    out: &mut String,
    list: &mut Option<(ListKind, Vec<String>)>,
    kind: ListKind,
    item: &str,
) {
    match list {
        Some((current, items)) if *current == kind => items.push(render_inline(item)),
        _ => {
            flush_list(out, list);
            *list = Some((kind, vec![render_inline(item)]));
        }
    }
}

/// `#`, `##`, `###` followed by a space. Deeper headings are not in the
/// allow-list and fall through to paragraph text.
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.bytes().take_while(|b| *b == b'#').count();
    if !(1..=3).contains(&level) {
        return None;
    }
    line[level..].strip_prefix(' ').map(|text| (level, text))
}

fn parse_list_item(line: &str, kind: ListKind) -> Option<&str> {
    match kind {
        ListKind::Unordered => line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("* ")),
        ListKind::Ordered => {
            let digits = line.bytes().take_while(|b| b.is_ascii_digit()).count();
            if digits == 0 {
                return None;
            }
            line[digits..].strip_prefix(". ")
        }
    }
}

/// Inline rendering: everything is escaped except `[text](http…)` links.
fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while !rest.is_empty() {
        if rest.starts_with('[') {
            if let Some((label, url, consumed)) = parse_link(rest) {
                out.push_str(&format!(
                    r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                    escape_html(url),
                    escape_html(label)
                ));
                rest = &rest[consumed..];
                continue;
            }
        }

        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            push_escaped(&mut out, ch);
        }
        rest = chars.as_str();
    }

    out
}

/// `[label](url)` with an http(s) url; anything else is not a link.
fn parse_link(s: &str) -> Option<(&str, &str, usize)> {
    let rest = &s[1..];
    let close = rest.find(']')?;
    let label = &rest[..close];

    let after = &rest[close + 1..];
    let url_rest = after.strip_prefix('(')?;
    let end = url_rest.find(')')?;
    let url = &url_rest[..end];

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return None;
    }
    if url.contains(char::is_whitespace) {
        return None;
    }

    Some((label, url, label.len() + url.len() + 4))
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        push_escaped(&mut out, ch);
    }
    out
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(ch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let html = render_markdown("first line\nsame paragraph\n\nsecond");
        assert_eq!(html, "<p>first line same paragraph</p><p>second</p>");
    }

    #[test]
    fn test_headings_one_through_three() {
        assert_eq!(render_markdown("# Title"), "<h1>Title</h1>");
        assert_eq!(render_markdown("## Sub"), "<h2>Sub</h2>");
        assert_eq!(render_markdown("### Deep"), "<h3>Deep</h3>");
    }

    #[test]
    fn test_heading_level_four_is_not_allowed() {
        assert_eq!(render_markdown("#### nope"), "<p>#### nope</p>");
    }

    #[test]
    fn test_unordered_list() {
        let html = render_markdown("- one\n- two\n* three");
        assert_eq!(html, "<ul><li>one</li><li>two</li><li>three</li></ul>");
    }

    #[test]
    fn test_ordered_list() {
        let html = render_markdown("1. one\n2. two");
        assert_eq!(html, "<ol><li>one</li><li>two</li></ol>");
    }

    #[test]
    fn test_blockquote() {
        let html = render_markdown("> wise\n> words");
        assert_eq!(html, "<blockquote><p>wise words</p></blockquote>");
    }

    #[test]
    fn test_link_rendering() {
        let html = render_markdown("see [docs](https://example.com)");
        assert_eq!(
            html,
            r#"<p>see <a href="https://example.com" target="_blank" rel="noopener noreferrer">docs</a></p>"#
        );
    }

    #[test]
    fn test_non_http_link_stays_text() {
        let html = render_markdown("[x](javascript:alert(1))");
        assert!(!html.contains("<a"));
        assert!(html.contains("javascript:alert(1"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_markdown("<script>alert('hi')</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_link_label_and_url_are_escaped() {
        let html = render_markdown(r#"[<b>](https://example.com/"x)"#);
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("&quot;x"));
    }

    #[test]
    fn test_mixed_document() {
        let html = render_markdown("# Dinner\n\nTonight:\n\n- soup\n- bread\n\n> so good");
        assert_eq!(
            html,
            "<h1>Dinner</h1><p>Tonight:</p><ul><li>soup</li><li>bread</li></ul><blockquote><p>so good</p></blockquote>"
        );
    }
}
