use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use scraper::Html;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::FetchError;

pub const FEED_ACCEPT: &str = "application/rss+xml, application/xml;q=0.9, text/xml;q=0.8";
pub const PAGE_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

/// Status and body of one GET request.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability to retrieve a URL. Implementations send the configured client
/// identifier; `accept` goes out as the `Accept` header.
pub trait Fetch {
    fn fetch(&self, url: &str, accept: &str) -> Result<FetchResponse, FetchError>;
}

/// Fetch and fail on any non-2xx status.
pub fn fetch_ok<F: Fetch + ?Sized>(fetcher: &F, url: &str, accept: &str) -> Result<Vec<u8>, FetchError> {
    let resp = fetcher.fetch(url, accept)?;
    if !resp.is_success() {
        return Err(FetchError::HttpStatus(resp.status));
    }
    Ok(resp.body)
}

/// Blocking HTTP implementation.
pub struct HttpFetcher {
    client: Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client, max_bytes: config.max_fetch_bytes })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, accept: &str) -> Result<FetchResponse, FetchError> {
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()?;

        let status = resp.status().as_u16();
        if let Some(len) = resp.content_length() {
            if len > self.max_bytes as u64 {
                return Err(FetchError::TooLarge(len));
            }
        }
        let body = resp.bytes()?;
        if body.len() > self.max_bytes {
            return Err(FetchError::TooLarge(body.len() as u64));
        }
        debug!(url, status, bytes = body.len(), "fetched");
        Ok(FetchResponse { status, body: body.to_vec() })
    }
}

/// An item's article page, fetched at most once and only on first use.
///
/// Any failure (no link, transport error, bad status) leaves the page
/// unavailable; callers treat that as "no enrichment".
pub struct ArticlePage<'a, F: Fetch + ?Sized> {
    fetcher: &'a F,
    url: Option<Url>,
    document: Option<Option<Html>>,
}

impl<'a, F: Fetch + ?Sized> ArticlePage<'a, F> {
    pub fn new(fetcher: &'a F, link: Option<&str>) -> Self {
        let url = link
            .and_then(|l| Url::parse(l.trim()).ok())
            .filter(|u| matches!(u.scheme(), "http" | "https"));
        Self { fetcher, url, document: None }
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn document(&mut self) -> Option<&Html> {
        if self.document.is_none() {
            self.document = Some(self.load());
        }
        self.document.as_ref().and_then(|d| d.as_ref())
    }

    fn load(&self) -> Option<Html> {
        let url = self.url.as_ref()?;
        match fetch_ok(self.fetcher, url.as_str(), PAGE_ACCEPT) {
            Ok(body) => Some(Html::parse_document(&String::from_utf8_lossy(&body))),
            Err(e) => {
                debug!(url = %url, error = %e, "article page unavailable");
                None
            }
        }
    }
}
