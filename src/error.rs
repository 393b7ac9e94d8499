use thiserror::Error;

/// Failure retrieving a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, timeout).
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-2xx response.
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("response too large: {0} bytes")]
    TooLarge(u64),
}

/// Fatal errors. Any of these aborts the run; the caller writes a diagnostic
/// payload instead of a feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to fetch source feed: {0}")]
    Fetch(#[from] FetchError),
    #[error("malformed feed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("source payload has no <rss> root element")]
    MissingRoot,
    #[error("source payload has no <channel> element")]
    MissingChannel,
    #[error("output invariant violated: {0}")]
    Invariant(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
