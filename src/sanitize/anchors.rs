use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use super::fragment::{rewrite, Action, Cursor, Visitor};

const UNSAFE_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:"];

/// Containers whose links are citations or tables of contents.
const LOW_VALUE_CONTAINERS: &[&str] = &["figcaption", "caption", "ul", "ol", "table", "dl"];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

static RE_BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(read\s+more|continue|view\s+sources|references|back\s+to\s+top)\s*[.…»›→]*\s*$",
    )
    .unwrap()
});

fn is_anchor(el: &ElementRef<'_>) -> bool {
    el.value().name().eq_ignore_ascii_case("a")
}

fn is_hyperlink(el: &ElementRef<'_>) -> bool {
    is_anchor(el) && el.value().attr("href").is_some()
}

/// `mailto:`, `tel:`, `javascript:` or a bare `#fragment`. Embedded
/// whitespace and control chars are ignored the way URL parsers ignore them.
fn is_unsafe_href(href: &str) -> bool {
    let compact: String = href
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with('#') || UNSAFE_SCHEMES.iter().any(|s| compact.starts_with(s))
}

struct UnsafeAnchors;

impl Visitor for UnsafeAnchors {
    fn element(&mut self, el: ElementRef<'_>, _cx: &Cursor<'_>) -> Action {
        match el.value().attr("href") {
            Some(href) if is_anchor(&el) && is_unsafe_href(href) => Action::Unwrap,
            _ => Action::Keep,
        }
    }
}

/// Unwrap links that do not navigate anywhere useful.
pub fn unwrap_unsafe_anchors(html: &str) -> String {
    rewrite(html, &mut UnsafeAnchors)
}

struct LowValueAnchors;

impl Visitor for LowValueAnchors {
    fn element(&mut self, el: ElementRef<'_>, cx: &Cursor<'_>) -> Action {
        if !is_anchor(&el) {
            return Action::Keep;
        }
        if cx.inside(LOW_VALUE_CONTAINERS) {
            return Action::Unwrap;
        }
        let text: String = el.text().collect();
        if RE_BOILERPLATE.is_match(&text) {
            return Action::Unwrap;
        }
        Action::Keep
    }
}

/// Unwrap links in captions, lists and tables, and boilerplate
/// "read more" style links.
pub fn unwrap_low_value_anchors(html: &str) -> String {
    rewrite(html, &mut LowValueAnchors)
}

struct AnchorSeen {
    offset: usize,
    in_heading: bool,
}

#[derive(Default)]
struct AnchorSurvey {
    anchors: Vec<AnchorSeen>,
}

impl Visitor for AnchorSurvey {
    fn element(&mut self, el: ElementRef<'_>, cx: &Cursor<'_>) -> Action {
        if is_hyperlink(&el) {
            self.anchors.push(AnchorSeen { offset: cx.offset, in_heading: cx.inside(HEADINGS) });
        }
        Action::Keep
    }
}

struct UnwrapPlanned {
    plan: Vec<bool>,
    next: usize,
}

impl Visitor for UnwrapPlanned {
    fn element(&mut self, el: ElementRef<'_>, _cx: &Cursor<'_>) -> Action {
        if !is_hyperlink(&el) {
            return Action::Keep;
        }
        let unwrap = self.plan.get(self.next).copied().unwrap_or(false);
        self.next += 1;
        if unwrap {
            Action::Unwrap
        } else {
            Action::Keep
        }
    }
}

/// Enforce at most `max_links` hyperlinks.
///
/// Links inside headings always go. Above the cap, every link starting in
/// the final quarter of the fragment goes as a block, even when dropping
/// fewer would already reach the cap. If the fragment is still above the
/// cap after that, all links go.
pub fn cap_links(html: &str, max_links: usize) -> String {
    let mut survey = AnchorSurvey::default();
    let normalized = rewrite(html, &mut survey);
    let total = normalized.chars().count();

    let mut plan: Vec<bool> = survey.anchors.iter().map(|a| a.in_heading).collect();
    let kept = |plan: &[bool]| plan.iter().filter(|u| !**u).count();

    if kept(&plan) > max_links {
        for (unwrap, anchor) in plan.iter_mut().zip(&survey.anchors) {
            if anchor.offset * 4 >= total * 3 {
                *unwrap = true;
            }
        }
    }
    if kept(&plan) > max_links {
        plan.iter_mut().for_each(|u| *u = true);
    }

    if !plan.iter().any(|u| *u) {
        return normalized;
    }
    rewrite(&normalized, &mut UnwrapPlanned { plan, next: 0 })
}
