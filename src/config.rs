//! Build-time configuration for a feed rewrite run.
//!
//! Every knob lives in [`Config`]; `Config::default()` carries the values the
//! published feed is built with. The binary may override a handful of them
//! from the command line, nothing else is read at runtime.

use std::path::PathBuf;
use std::time::Duration;

/// Address of the upstream feed.
pub const SOURCE_URL: &str = "https://feeds.example-news.com/rss/latest.xml";
/// Where the rewritten feed is published on disk.
pub const OUTPUT_PATH: &str = "public/feed.xml";
/// Canonical address of the published feed (the `atom:link rel="self"` target).
pub const SELF_URL: &str = "https://news.example.org/feed.xml";
/// Client identifier sent with every request.
pub const USER_AGENT: &str = "feedwash/0.1 (+https://news.example.org/feed.xml)";
/// Used when no item-level image survives validation.
pub const DEFAULT_THUMBNAIL: &str = "https://news.example.org/static/feed-thumbnail.png";

pub const MAX_ITEMS: usize = 25;
pub const MAX_BODY_CHARS: usize = 2000;
pub const MAX_LINKS: usize = 5;
pub const TIMEOUT_MS: u64 = 10_000;
/// Hard ceiling on any fetched body (10 MiB).
pub const MAX_FETCH_BYTES: usize = 10 * 1024 * 1024;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

pub const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "utm_id",
    "fbclid",
    "gclid",
    "mc_cid",
    "mc_eid",
];

/// Prefixes the output root declares, with their namespace URIs.
pub const NAMESPACES: &[(&str, &str)] = &[
    ("media", "http://search.yahoo.com/mrss/"),
    ("content", "http://purl.org/rss/1.0/modules/content/"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("atom", "http://www.w3.org/2005/Atom"),
];

/// How item bodies are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyMode {
    /// Sanitized HTML fragment with a capped number of hyperlinks.
    Html,
    /// Flattened plain text, paragraphs separated by blank lines.
    #[default]
    PlainText,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source_url: String,
    pub output_path: PathBuf,
    pub self_url: String,
    pub user_agent: String,
    pub max_items: usize,
    pub max_body_chars: usize,
    pub max_links: usize,
    pub body_mode: BodyMode,
    pub image_extensions: Vec<String>,
    pub default_thumbnail: Option<String>,
    pub tracking_params: Vec<String>,
    /// `(prefix, uri)` pairs, in declaration order.
    pub namespaces: Vec<(String, String)>,
    pub timeout: Duration,
    pub max_fetch_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: SOURCE_URL.to_string(),
            output_path: PathBuf::from(OUTPUT_PATH),
            self_url: SELF_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            max_items: MAX_ITEMS,
            max_body_chars: MAX_BODY_CHARS,
            max_links: MAX_LINKS,
            body_mode: BodyMode::default(),
            image_extensions: IMAGE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            default_thumbnail: Some(DEFAULT_THUMBNAIL.to_string()),
            tracking_params: TRACKING_PARAMS.iter().map(|s| s.to_string()).collect(),
            namespaces: NAMESPACES
                .iter()
                .map(|(p, u)| (p.to_string(), u.to_string()))
                .collect(),
            timeout: Duration::from_millis(TIMEOUT_MS),
            max_fetch_bytes: MAX_FETCH_BYTES,
        }
    }
}

impl Config {
    /// True when `prefix` is one of the declared namespace prefixes (ASCII case-insensitive).
    pub fn allows_prefix(&self, prefix: &str) -> bool {
        self.namespaces
            .iter()
            .any(|(p, _)| p.eq_ignore_ascii_case(prefix))
    }
}
