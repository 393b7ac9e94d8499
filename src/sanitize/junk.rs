use scraper::ElementRef;

use super::fragment::{rewrite, Action, Cursor, Visitor};

const JUNK_TAGS: &[&str] = &["nav", "footer", "aside", "header", "script", "style", "noscript"];

/// Class-name fragments that mark non-article blocks.
const JUNK_CLASS_KEYWORDS: &[&str] = &[
    "related",
    "share",
    "social",
    "subscribe",
    "tags",
    "promo",
    "newsletter",
    "sidebar",
    "advert",
    "sponsor",
    "comments",
];

struct JunkFilter;

impl Visitor for JunkFilter {
    fn element(&mut self, el: ElementRef<'_>, _cx: &Cursor<'_>) -> Action {
        let name = el.value().name().to_ascii_lowercase();
        if JUNK_TAGS.contains(&name.as_str()) {
            return Action::Drop;
        }
        if let Some(class) = el.value().attr("class") {
            let class = class.to_lowercase();
            if JUNK_CLASS_KEYWORDS.iter().any(|k| class.contains(k)) {
                return Action::Drop;
            }
        }
        Action::Keep
    }
}

/// Remove navigation, boilerplate and script blocks with their content.
pub fn remove_junk(html: &str) -> String {
    rewrite(html, &mut JunkFilter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn drops_structural_junk() {
        let html = "<nav><a href=\"/\">Home</a></nav><p>Body</p><script>track()</script><footer>f</footer>";
        assert_eq!(remove_junk(html), "<p>Body</p>");
    }

    #[test]
    fn drops_blocks_by_class_keyword() {
        let html = r#"<div class="Article-Related-Links"><a href="x">x</a></div><p class="lead">Keep</p><ul class="post-tags"><li>a</li></ul>"#;
        assert_eq!(remove_junk(html), r#"<p class="lead">Keep</p>"#);
    }

    #[test]
    fn second_pass_is_noop() {
        let once = remove_junk("<aside>x</aside><div><p>y</p><style>p{}</style></div>");
        assert_eq!(remove_junk(&once), once);
        assert_eq!(once, "<div><p>y</p></div>");
    }
}
