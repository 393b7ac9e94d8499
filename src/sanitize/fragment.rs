use std::borrow::Cow;

use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::{ElementRef, Html, Node};

use crate::text::{cut_at_whitespace, ELLIPSIS};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// What to do with an element during a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Keep,
    /// Drop the tag, keep its content.
    Unwrap,
    /// Drop the tag and its content.
    Drop,
}

/// Where the walker is: open (kept) ancestors, innermost last, and the
/// number of chars written so far.
pub(crate) struct Cursor<'a> {
    pub ancestors: &'a [String],
    pub offset: usize,
}

impl Cursor<'_> {
    pub fn inside(&self, names: &[&str]) -> bool {
        self.ancestors.iter().any(|a| names.contains(&a.as_str()))
    }
}

pub(crate) trait Visitor {
    fn element(&mut self, _el: ElementRef<'_>, _cx: &Cursor<'_>) -> Action {
        Action::Keep
    }

    /// `None` drops the text node.
    fn text<'t>(&mut self, text: &'t str, _cx: &Cursor<'_>) -> Option<Cow<'t, str>> {
        Some(Cow::Borrowed(text))
    }
}

/// Re-serializes unchanged.
pub(crate) struct KeepAll;

impl Visitor for KeepAll {}

#[derive(Default)]
struct Output {
    buf: String,
    chars: usize,
}

impl Output {
    fn push(&mut self, s: &str) {
        self.chars += s.chars().count();
        self.buf.push_str(s);
    }
}

struct Walker<'v, V> {
    visitor: &'v mut V,
    ancestors: Vec<String>,
    out: Output,
}

/// Parse `html` as a body fragment and serialize it back, letting `visitor`
/// decide the fate of every element and text node.
pub(crate) fn rewrite<V: Visitor>(html: &str, visitor: &mut V) -> String {
    let fragment = Html::parse_fragment(html);
    let mut walker = Walker { visitor, ancestors: Vec::new(), out: Output::default() };
    walker.children(fragment.root_element());
    walker.out.buf
}

impl<V: Visitor> Walker<'_, V> {
    fn children(&mut self, parent: ElementRef<'_>) {
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => {
                    let cx = Cursor { ancestors: &self.ancestors, offset: self.out.chars };
                    if let Some(t) = self.visitor.text(text, &cx) {
                        self.out.push(&encode_text(&t));
                    }
                }
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        self.element(el);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, el: ElementRef<'_>) {
        let name = el.value().name().to_ascii_lowercase();
        let action = {
            let cx = Cursor { ancestors: &self.ancestors, offset: self.out.chars };
            self.visitor.element(el, &cx)
        };
        match action {
            Action::Drop => {}
            Action::Unwrap => self.children(el),
            Action::Keep => {
                self.out.push(&open_tag(&name, el));
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return;
                }
                self.ancestors.push(name);
                self.children(el);
                if let Some(name) = self.ancestors.pop() {
                    self.out.push(&format!("</{name}>"));
                }
            }
        }
    }
}

fn open_tag(name: &str, el: ElementRef<'_>) -> String {
    // Sorted so the output does not depend on attribute storage order.
    let mut attrs: Vec<(&str, &str)> = el
        .value()
        .attrs()
        .filter(|(k, _)| !k.to_ascii_lowercase().starts_with("on"))
        .collect();
    attrs.sort_by(|a, b| a.0.cmp(b.0));

    let mut tag = format!("<{name}");
    for (key, value) in attrs {
        tag.push(' ');
        tag.push_str(key);
        tag.push_str("=\"");
        tag.push_str(&encode_double_quoted_attribute(value));
        tag.push('"');
    }
    tag.push('>');
    tag
}

/// Number of text chars in a fragment, markup excluded.
pub(crate) fn text_len(html: &str) -> usize {
    Html::parse_fragment(html)
        .root_element()
        .text()
        .map(|t| t.chars().count())
        .sum()
}

struct TextBudget {
    remaining: usize,
    exhausted: bool,
}

impl Visitor for TextBudget {
    fn element(&mut self, _el: ElementRef<'_>, _cx: &Cursor<'_>) -> Action {
        if self.exhausted {
            Action::Drop
        } else {
            Action::Keep
        }
    }

    fn text<'t>(&mut self, text: &'t str, _cx: &Cursor<'_>) -> Option<Cow<'t, str>> {
        if self.exhausted {
            return None;
        }
        let len = text.chars().count();
        if len <= self.remaining {
            self.remaining -= len;
            return Some(Cow::Borrowed(text));
        }
        self.exhausted = true;
        let mut cut = cut_at_whitespace(text, self.remaining).to_string();
        cut.push(ELLIPSIS);
        Some(Cow::Owned(cut))
    }
}

/// Cap the visible text of a fragment at `max` chars (ellipsis included).
/// The text node that crosses the limit is cut on whitespace; everything
/// after it is dropped. Open elements are closed normally.
pub fn truncate_html(html: &str, max: usize) -> String {
    if text_len(html) <= max {
        return rewrite(html, &mut KeepAll);
    }
    if max == 0 {
        return String::new();
    }
    rewrite(html, &mut TextBudget { remaining: max - 1, exhausted: false })
}
