use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\x0C\r]+").unwrap());
static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

const PARAGRAPH_BLOCKS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "ul", "ol", "table",
];
const LINE_BLOCKS: &[&str] = &["li", "div", "tr", "dt", "dd", "figcaption"];
const SKIPPED: &[&str] = &["script", "style", "noscript"];

/// Convert an HTML fragment to plain text, keeping paragraph and line-break
/// structure as newlines. Entities come back decoded.
pub fn flatten(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    collect(fragment.root_element(), &mut out);
    tidy(&out)
}

fn collect(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name().to_ascii_lowercase();
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                if SKIPPED.contains(&name.as_str()) {
                    continue;
                }
                if let Some(el) = ElementRef::wrap(child) {
                    collect(el, out);
                }
                if PARAGRAPH_BLOCKS.contains(&name.as_str()) {
                    out.push_str("\n\n");
                } else if LINE_BLOCKS.contains(&name.as_str()) {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn tidy(raw: &str) -> String {
    let raw = raw.replace('\u{00A0}', " ");
    let spaced = RE_HSPACE.replace_all(&raw, " ");
    let lines: Vec<&str> = spaced.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    RE_BLANK_LINES.replace_all(&joined, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keeps_paragraph_structure() {
        let html = "<h2>Heading</h2>\n<p>First &amp; <b>bold</b>\n  line<br>second line</p><p>Last&nbsp;one</p>";
        assert_eq!(flatten(html), "Heading\n\nFirst & bold\nline\nsecond line\n\nLast one");
    }

    #[test]
    fn lists_become_lines() {
        assert_eq!(flatten("<ul><li>a</li><li>b</li></ul><p>c</p>"), "a\nb\n\nc");
    }

    #[test]
    fn decodes_numeric_entities() {
        assert_eq!(flatten("caf&#233; &#x2014; &lt;tag&gt;"), "café — <tag>");
    }

    #[test]
    fn plain_text_is_a_fixed_point() {
        let once = flatten("<div><p>one</p>\n\n\n<p>two   three</p></div>");
        assert_eq!(once, "one\n\ntwo three");
        assert_eq!(flatten(&once), once);
    }
}
