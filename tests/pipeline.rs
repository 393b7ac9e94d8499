use std::cell::RefCell;
use std::collections::HashMap;

use feedwash::config::{BodyMode, Config};
use feedwash::error::{FeedError, FetchError};
use feedwash::fetch::{Fetch, FetchResponse};
use feedwash::xml::{self, XmlElement};
use feedwash::{rewrite_document, run};
use pretty_assertions::assert_eq;

const SOURCE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:media="http://search.yahoo.com/mrss/" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
  <channel>
    <title>Example   Daily</title>
    <link>https://site.example/</link>
    <description>All the news</description>
    <language>en</language>
    <lastBuildDate>2025-06-10T04:00:00Z</lastBuildDate>
    <atom:link href="https://site.example/feed" rel="self" type="application/rss+xml"/>
    <atom:link href="https://site.example/feed?again"/>
    <itunes:author>Vendor</itunes:author>
    <image><url>https://site.example/logo.png</url><title>Example Daily</title></image>
    <item>
      <title>Best Shows Coming in [current_year]</title>
      <link>https://site.example/shows?utm_source=rss&amp;id=7</link>
      <guid isPermaLink="false">shows-7</guid>
      <pubDate>Tue, 10 Jun 2025 04:00:00 GMT</pubDate>
      <description><![CDATA[
        <nav><a href="/">Home</a></nav>
        <p>The season opens with <a href="https://site.example/one">one show</a>
        and <a href="mailto:tips@site.example">a tip line</a>.</p>
        <div class="social-share"><a href="https://social.example/">Share</a></div>
        <p><a href="https://site.example/shows">Read more</a></p>
      ]]></description>
    </item>
    <item>
      <title>Second &#124; Story</title>
      <link>https://site.example/second</link>
      <dc:creator>Desk</dc:creator>
      <media:content url="https://cdn.site.example/second.jpg" medium="image"/>
      <itunes:duration>12:00</itunes:duration>
      <content:encoded><![CDATA[<p>Links to <a href="https://a.example/1">a</a>, <a href="https://a.example/2">b</a>,
        <a href="https://a.example/3">c</a>, <a href="https://a.example/4">d</a>,
        <a href="https://a.example/5">e</a>, <a href="https://a.example/6">f</a>
        and <a href="https://a.example/7">g</a>.</p>
        <p><a href="javascript:void(0)">Do not click</a> with a long tail of words that keeps going for a while.</p>]]></content:encoded>
    </item>
    <item>
      <title>Le château – guide</title>
      <link>https://site.example/missing</link>
      <atom:link href="https://site.example/missing" rel="self"/>
      <description>Just text with a &amp;lt; b.</description>
      <media:group>
        <media:thumbnail url="http://site.example/t.svg"/>
        <media:thumbnail url="//cdn.site.example/t.webp"/>
      </media:group>
    </item>
  </channel>
</rss>"#;

const SHOWS_PAGE: &str = r#"<html><head>
  <meta name="author" content="By Jane Doe">
  <meta property="og:image" content="/img/shows.jpg">
</head><body><p>Story</p></body></html>"#;

/// Serves canned responses; anything unknown is a 404.
struct FakeFetcher {
    pages: HashMap<String, (u16, String)>,
    calls: RefCell<Vec<String>>,
}

impl FakeFetcher {
    fn new(config: &Config) -> Self {
        let mut pages = HashMap::new();
        pages.insert(config.source_url.clone(), (200, SOURCE.to_string()));
        pages.insert("https://site.example/shows?id=7".to_string(), (200, SHOWS_PAGE.to_string()));
        Self { pages, calls: RefCell::new(Vec::new()) }
    }
}

impl Fetch for FakeFetcher {
    fn fetch(&self, url: &str, _accept: &str) -> Result<FetchResponse, FetchError> {
        self.calls.borrow_mut().push(url.to_string());
        Ok(match self.pages.get(url) {
            Some((status, body)) => FetchResponse { status: *status, body: body.as_bytes().to_vec() },
            None => FetchResponse { status: 404, body: Vec::new() },
        })
    }
}

fn run_to_string(config: &Config) -> String {
    let fetcher = FakeFetcher::new(config);
    String::from_utf8(run(config, &fetcher).unwrap()).unwrap()
}

fn items(output: &str) -> Vec<XmlElement> {
    let root = xml::parse(output).unwrap().unwrap();
    root.child("channel").unwrap().elements().filter(|e| e.is("item")).cloned().collect()
}

#[test]
fn output_has_single_declaration_self_link_and_allowed_namespaces_only() {
    let config = Config::default();
    let out = run_to_string(&config);

    assert_eq!(out.matches("<?xml").count(), 1);
    assert_eq!(out.matches("<atom:link").count(), 1);
    assert!(out.contains(r#"<atom:link href="https://news.example.org/feed.xml" rel="self" type="application/rss+xml"/>"#));
    assert!(!out.contains("itunes"));
    assert_eq!(out.matches("xmlns:").count(), config.namespaces.len());
    for (prefix, uri) in &config.namespaces {
        assert!(out.contains(&format!(r#"xmlns:{prefix}="{uri}""#)));
    }
    assert!(out.contains("<image>"));
    assert!(out.contains("<title>Example Daily</title>"));
    assert!(out.contains("<lastBuildDate>Tue, 10 Jun 2025 04:00:00 +0000</lastBuildDate>"));
}

#[test]
fn items_are_rewritten_and_enriched() {
    let config = Config::default();
    let fetcher = FakeFetcher::new(&config);
    let out = String::from_utf8(rewrite_document(SOURCE, &config, &fetcher, 2025).unwrap()).unwrap();
    let items = items(&out);
    assert_eq!(items.len(), 3);

    let first = &items[0];
    assert_eq!(first.child("title").unwrap().text(), "Best Shows Coming in2025");
    assert_eq!(first.child("link").unwrap().text(), "https://site.example/shows?id=7");
    assert_eq!(first.child("pubDate").unwrap().text(), "Tue, 10 Jun 2025 04:00:00 +0000");
    assert_eq!(first.child("dc:creator").unwrap().text(), "Jane Doe");
    assert_eq!(first.child("author").unwrap().text(), "Jane Doe");
    assert_eq!(first.child("media:thumbnail").unwrap().attr("url"), Some("https://site.example/img/shows.jpg"));
    assert_eq!(
        first.child("description").unwrap().text(),
        "The season opens with one show\nand a tip line.\n\nRead more"
    );

    let second = &items[1];
    assert_eq!(second.child("title").unwrap().text(), "Second | Story");
    assert_eq!(second.child("dc:creator").unwrap().text(), "Desk");
    assert!(second.child("author").is_none());
    assert_eq!(second.child("media:thumbnail").unwrap().attr("url"), Some("https://cdn.site.example/second.jpg"));
    assert!(second.child("media:content").is_some());

    let third = &items[2];
    assert_eq!(third.child("title").unwrap().text(), "Le château – guide");
    assert_eq!(third.child("description").unwrap().text(), "Just text with a &lt; b.");
    assert!(third.child("atom:link").is_none());
    let group = third.child("media:group").unwrap();
    let nested: Vec<_> = group.elements().map(|e| e.attr("url").unwrap_or_default()).collect();
    assert_eq!(nested, ["https://cdn.site.example/t.webp"]);
    assert!(third.child("dc:creator").is_none());
    assert_eq!(third.child("media:thumbnail").unwrap().attr("url"), config.default_thumbnail.as_deref());

    // Each article page at most once; items that need nothing are not fetched.
    assert_eq!(
        *fetcher.calls.borrow(),
        ["https://site.example/shows?id=7", "https://site.example/missing"]
    );
}

#[test]
fn author_is_never_duplicated() {
    let out = run_to_string(&Config::default());
    assert_eq!(out.matches("<dc:creator>").count(), 2);
    assert_eq!(out.matches("<author>").count(), 1);
}

#[test]
fn item_count_is_capped_in_document_order() {
    let config = Config { max_items: 2, ..Config::default() };
    let out = run_to_string(&config);
    let titles: Vec<String> = items(&out).iter().map(|i| i.child("title").unwrap().text()).collect();
    assert_eq!(titles.len(), 2);
    assert!(titles[1].starts_with("Second"));
}

#[test]
fn bodies_respect_the_character_cap() {
    for mode in [BodyMode::PlainText, BodyMode::Html] {
        let config = Config { max_body_chars: 40, body_mode: mode, ..Config::default() };
        let out = run_to_string(&config);
        for item in items(&out) {
            for name in ["description", "content:encoded"] {
                if let Some(body) = item.child(name) {
                    let text = body.text();
                    // Both modes are HTML on the wire; the cap counts decoded text.
                    let visible: usize = scraper::Html::parse_fragment(&text)
                        .root_element()
                        .text()
                        .map(|t| t.chars().count())
                        .sum();
                    assert!(visible <= 40, "{mode:?} {name}: {text:?}");
                }
            }
        }
    }
}

#[test]
fn html_bodies_keep_only_safe_capped_links() {
    let config = Config { body_mode: BodyMode::Html, ..Config::default() };
    let out = run_to_string(&config);
    for item in items(&out) {
        for name in ["description", "content:encoded"] {
            let Some(body) = item.child(name) else { continue };
            let html = body.text();
            assert!(html.matches("<a ").count() <= config.max_links, "{html}");
            assert!(!html.contains("mailto:"));
            assert!(!html.contains("javascript:"));
            assert!(!html.contains("<nav"));
            assert!(!html.contains("Share"));
        }
    }
}

#[test]
fn second_run_over_output_is_byte_identical() {
    for mode in [BodyMode::PlainText, BodyMode::Html] {
        let config = Config { body_mode: mode, ..Config::default() };
        let fetcher = FakeFetcher::new(&config);
        let once = rewrite_document(SOURCE, &config, &fetcher, 2025).unwrap();
        let once = String::from_utf8(once).unwrap();
        let twice = rewrite_document(&once, &config, &fetcher, 2025).unwrap();
        assert_eq!(String::from_utf8(twice).unwrap(), once, "{mode:?}");
        assert!(once.contains("Le château – guide"));
        assert!(!once.contains("t.svg"));
    }
}

#[test]
fn non_feed_payload_is_fatal() {
    let config = Config::default();
    let fetcher = FakeFetcher::new(&config);
    let err = rewrite_document("<html><body>Service unavailable</body></html>", &config, &fetcher, 2025).unwrap_err();
    assert!(matches!(err, FeedError::MissingRoot));
}

#[test]
fn source_fetch_failure_is_fatal() {
    let config = Config { source_url: "https://site.example/gone.xml".into(), ..Config::default() };
    let fetcher = FakeFetcher::new(&Config::default());
    let err = run(&config, &fetcher).unwrap_err();
    assert!(matches!(err, FeedError::Fetch(FetchError::HttpStatus(404))));
}
