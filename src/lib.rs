//! feedwash: rewrite a third-party RSS feed into a clean, self-consistent
//! static feed.
//!
//! The pipeline is fetch, decode, [`normalize`], per-item [`rewrite`],
//! [`serialize`], then [`guard`]. Only the source feed fetch, a malformed
//! source document and an invariant violation in the output are fatal;
//! everything that happens per item degrades to "leave it as is".

pub mod config;
pub mod error;
pub mod fetch;
pub mod guard;
pub mod model;
pub mod normalize;
pub mod publish;
pub mod rewrite;
pub mod sanitize;
pub mod serialize;
pub mod text;
pub mod xml;

use chrono::Datelike;
use tracing::info;

use crate::config::Config;
use crate::error::FeedError;
use crate::fetch::{fetch_ok, Fetch, FEED_ACCEPT};
use crate::rewrite::ItemRewriter;

/// Rewrite an already decoded feed document into publishable bytes.
///
/// `year` completes titles left ending in a dangling "in".
pub fn rewrite_document<F: Fetch + ?Sized>(
    xml_text: &str,
    config: &Config,
    fetcher: &F,
    year: i32,
) -> Result<Vec<u8>, FeedError> {
    let mut doc = normalize::normalize(xml_text, config)?;

    let rewriter = ItemRewriter::new(config, fetcher, year);
    for item in doc.items.iter_mut() {
        rewriter.rewrite(item);
    }

    let out = serialize::to_bytes(&doc, config)?;
    guard::check(&out, config)?;
    info!(items = doc.items.len(), bytes = out.len(), "feed rewritten");
    Ok(out)
}

/// Fetch the configured source feed and rewrite it.
pub fn run<F: Fetch + ?Sized>(config: &Config, fetcher: &F) -> Result<Vec<u8>, FeedError> {
    info!(source = %config.source_url, "fetching source feed");
    let body = fetch_ok(fetcher, &config.source_url, FEED_ACCEPT)?;
    let text = normalize::decode_bytes(&body);
    rewrite_document(&text, config, fetcher, chrono::Local::now().year())
}
