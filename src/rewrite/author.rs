use scraper::{Html, Selector};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::fetch::{ArticlePage, Fetch};
use crate::text::fix_mojibake;

/// Find a display name for the article's author.
///
/// `meta[name=author]` wins; otherwise the page's JSON-LD blocks are
/// searched. Any failure simply yields `None`.
pub fn find_author<F: Fetch + ?Sized>(page: &mut ArticlePage<'_, F>) -> Option<String> {
    let doc = page.document()?;
    meta_author(doc).or_else(|| json_ld_author(doc))
}

fn meta_author(doc: &Html) -> Option<String> {
    let sel = Selector::parse("meta").ok()?;
    doc.select(&sel)
        .filter(|m| {
            m.value()
                .attr("name")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case("author"))
        })
        .filter_map(|m| m.value().attr("content"))
        .find_map(clean_name)
}

fn json_ld_author(doc: &Html) -> Option<String> {
    let sel = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    let blocks: Vec<JsonValue> = doc
        .select(&sel)
        .filter_map(|node| {
            let text: String = node.text().collect();
            match serde_json::from_str::<JsonValue>(text.trim()) {
                Ok(v) => Some(v),
                Err(e) => {
                    debug!(error = %e, "skipping malformed JSON-LD block");
                    None
                }
            }
        })
        .collect();

    author_from_json_ld(&blocks)
}

/// Resolve an author name across JSON-LD blocks, in priority order:
/// a direct `author` on a root object, then the author of any
/// Article-typed node, then any `author` property anywhere.
pub fn author_from_json_ld(blocks: &[JsonValue]) -> Option<String> {
    blocks
        .iter()
        .find_map(|b| b.get("author").and_then(author_name))
        .or_else(|| blocks.iter().find_map(article_author))
        .or_else(|| blocks.iter().find_map(any_author))
}

/// Same shape test as for picking article nodes: `@type`/`type`, string or array.
fn is_article_node(v: &JsonValue) -> bool {
    let Some(t) = v.get("@type").or_else(|| v.get("type")) else {
        return false;
    };
    let matches = |s: &str| {
        let s = s.to_lowercase();
        s.contains("article") || s.contains("posting") || s.contains("report")
    };
    match t {
        JsonValue::String(s) => matches(s.as_str()),
        JsonValue::Array(arr) => arr.iter().filter_map(|e| e.as_str()).any(matches),
        _ => false,
    }
}

fn article_author(v: &JsonValue) -> Option<String> {
    if is_article_node(v) {
        if let Some(name) = v.get("author").and_then(author_name) {
            return Some(name);
        }
    }
    children(v).find_map(article_author)
}

fn any_author(v: &JsonValue) -> Option<String> {
    v.get("author")
        .and_then(author_name)
        .or_else(|| children(v).find_map(any_author))
}

fn children(v: &JsonValue) -> Box<dyn Iterator<Item = &JsonValue> + '_> {
    match v {
        JsonValue::Object(map) => Box::new(map.values()),
        JsonValue::Array(arr) => Box::new(arr.iter()),
        _ => Box::new(std::iter::empty()),
    }
}

/// A string, an object with `name`, or an array of either (first usable).
fn author_name(v: &JsonValue) -> Option<String> {
    match v {
        JsonValue::String(s) => clean_name(s),
        JsonValue::Object(obj) => obj.get("name").and_then(author_name),
        JsonValue::Array(arr) => arr.iter().find_map(author_name),
        _ => None,
    }
}

fn clean_name(raw: &str) -> Option<String> {
    let name = fix_mojibake(raw);
    let name = match name.get(..3) {
        Some(p) if p.eq_ignore_ascii_case("by ") => name[3..].trim().to_string(),
        _ => name,
    };
    if name.is_empty() || name.starts_with("http://") || name.starts_with("https://") {
        None
    } else {
        Some(name)
    }
}
