use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::fetch::{ArticlePage, Fetch};
use crate::model::FeedItem;
use crate::sanitize::sanitize_image_url;
use crate::xml::XmlElement;

/// Meta keys that carry a share image, best first.
const IMAGE_META_KEYS: &[&str] = &["og:image", "og:image:secure_url", "twitter:image"];

/// Pick the item's thumbnail.
///
/// Order: existing `media:thumbnail`, then `media:content` / `enclosure`
/// URLs in the item, then the article page's share image, then `default`.
/// Each candidate must survive [`sanitize_image_url`]; rejected ones fall
/// through. The article page is only fetched when the item has nothing usable.
pub fn resolve_thumbnail<F: Fetch + ?Sized>(
    item: &FeedItem,
    page: &mut ArticlePage<'_, F>,
    extensions: &[String],
    default: Option<&str>,
) -> Option<String> {
    if let Some(url) = item.thumbnail.as_deref().and_then(|u| sanitize_image_url(u, extensions)) {
        return Some(url);
    }

    if let Some(url) = item_media_urls(item)
        .into_iter()
        .find_map(|u| sanitize_image_url(&u, extensions))
    {
        return Some(url);
    }

    let base = page.url().cloned();
    if let Some(doc) = page.document() {
        if let Some(url) = page_share_images(doc, base.as_ref())
            .into_iter()
            .find_map(|u| sanitize_image_url(&u, extensions))
        {
            return Some(url);
        }
    }

    let fallback = default.and_then(|u| sanitize_image_url(u, extensions));
    if fallback.is_none() {
        debug!(link = ?item.link, "no usable thumbnail");
    }
    fallback
}

/// `media:content@url` (anywhere, e.g. inside `media:group`), then `enclosure@url`.
fn item_media_urls(item: &FeedItem) -> Vec<String> {
    let mut media = Vec::new();
    let mut enclosures = Vec::new();
    for el in &item.extra {
        el.walk(&mut |e: &XmlElement| {
            if let Some(url) = e.attr("url") {
                if e.is("media:content") {
                    media.push(url.to_string());
                } else if e.is("enclosure") {
                    enclosures.push(url.to_string());
                }
            }
        });
    }
    media.extend(enclosures);
    media
}

fn page_share_images(doc: &Html, base: Option<&Url>) -> Vec<String> {
    let Ok(sel) = Selector::parse("meta") else {
        return Vec::new();
    };
    let mut found: Vec<(usize, String)> = Vec::new();
    for m in doc.select(&sel) {
        let Some(key) = m.value().attr("property").or_else(|| m.value().attr("name")) else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let Some(rank) = IMAGE_META_KEYS.iter().position(|k| *k == key) else {
            continue;
        };
        if let Some(content) = m.value().attr("content") {
            let resolved = match base {
                Some(b) => b.join(content.trim()).map(String::from).unwrap_or_else(|_| content.to_string()),
                None => content.to_string(),
            };
            found.push((rank, resolved));
        }
    }
    found.sort_by_key(|(rank, _)| *rank);
    found.into_iter().map(|(_, u)| u).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::FetchResponse;
    use crate::xml::XmlNode;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    struct Page {
        html: &'static str,
        calls: Cell<usize>,
    }

    impl Fetch for Page {
        fn fetch(&self, _url: &str, _accept: &str) -> Result<FetchResponse, FetchError> {
            self.calls.set(self.calls.get() + 1);
            Ok(FetchResponse { status: 200, body: self.html.as_bytes().to_vec() })
        }
    }

    fn exts() -> Vec<String> {
        crate::config::IMAGE_EXTENSIONS.iter().map(|s| s.to_string()).collect()
    }

    fn item(thumbnail: Option<&str>, extra: Vec<XmlElement>) -> FeedItem {
        FeedItem {
            link: Some("https://news.example/story".into()),
            thumbnail: thumbnail.map(String::from),
            extra,
            ..FeedItem::default()
        }
    }

    const OG_PAGE: &str = r#"<html><head>
        <meta name="twitter:image" content="https://cdn.example/tw.png">
        <meta property="og:image" content="/img/og.jpg">
        </head></html>"#;

    #[test]
    fn existing_thumbnail_wins_without_fetching() {
        let f = Page { html: OG_PAGE, calls: Cell::new(0) };
        let it = item(Some("http://cdn.example/t.jpg"), vec![]);
        let mut page = ArticlePage::new(&f, it.link.as_deref());
        assert_eq!(
            resolve_thumbnail(&it, &mut page, &exts(), None).as_deref(),
            Some("https://cdn.example/t.jpg")
        );
        assert_eq!(f.calls.get(), 0);
    }

    #[test]
    fn media_content_before_enclosure() {
        let f = Page { html: OG_PAGE, calls: Cell::new(0) };
        let mut group = XmlElement::new("media:group");
        group.children.push(XmlNode::Element(
            XmlElement::new("media:content").with_attr("url", "https://cdn.example/m.webp"),
        ));
        let extra = vec![XmlElement::new("enclosure").with_attr("url", "https://cdn.example/e.jpg"), group];
        let it = item(Some("javascript:alert(1)"), extra);
        let mut page = ArticlePage::new(&f, it.link.as_deref());
        assert_eq!(
            resolve_thumbnail(&it, &mut page, &exts(), None).as_deref(),
            Some("https://cdn.example/m.webp")
        );
    }

    #[test]
    fn falls_back_to_og_image_resolved_against_page() {
        let f = Page { html: OG_PAGE, calls: Cell::new(0) };
        let it = item(None, vec![XmlElement::new("enclosure").with_attr("url", "https://cdn.example/a.mp3")]);
        let mut page = ArticlePage::new(&f, it.link.as_deref());
        assert_eq!(
            resolve_thumbnail(&it, &mut page, &exts(), None).as_deref(),
            Some("https://news.example/img/og.jpg")
        );
        assert_eq!(f.calls.get(), 1);
    }

    #[test]
    fn default_then_nothing() {
        let f = Page { html: "<html></html>", calls: Cell::new(0) };
        let it = item(None, vec![]);
        let mut page = ArticlePage::new(&f, it.link.as_deref());
        assert_eq!(
            resolve_thumbnail(&it, &mut page, &exts(), Some("https://x.example/d.png")).as_deref(),
            Some("https://x.example/d.png")
        );
        let mut page = ArticlePage::new(&f, it.link.as_deref());
        assert_eq!(resolve_thumbnail(&it, &mut page, &exts(), Some("https://x.example/d.svg")), None);
    }
}
