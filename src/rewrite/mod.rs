//! Per-item rewriting: title, body, link, date, thumbnail, author.
//!
//! Every step is idempotent, so a feed that already went through the
//! pipeline comes out byte-identical.

mod author;
mod body;
mod link;
mod thumbnail;
mod title;

pub use author::{author_from_json_ld, find_author};
pub use body::{rewrite_body, BodyPolicy};
pub use link::strip_tracking;
pub use thumbnail::resolve_thumbnail;
pub use title::clean_title;

use tracing::debug;

use crate::config::Config;
use crate::fetch::{ArticlePage, Fetch};
use crate::model::FeedItem;
use crate::text::format_pub_date;

pub struct ItemRewriter<'a, F: Fetch + ?Sized> {
    config: &'a Config,
    fetcher: &'a F,
    year: i32,
}

impl<'a, F: Fetch + ?Sized> ItemRewriter<'a, F> {
    /// `year` is what trailing-"in" titles get completed with.
    pub fn new(config: &'a Config, fetcher: &'a F, year: i32) -> Self {
        Self { config, fetcher, year }
    }

    fn body_policy(&self) -> BodyPolicy {
        BodyPolicy {
            mode: self.config.body_mode,
            max_chars: self.config.max_body_chars,
            max_links: self.config.max_links,
        }
    }

    /// Rewrite one item in place. Never fails: enrichment that cannot be
    /// done is skipped.
    pub fn rewrite(&self, item: &mut FeedItem) {
        if let Some(title) = item.title.as_mut() {
            *title = clean_title(title, self.year);
        }

        let policy = self.body_policy();
        for body in [&mut item.description, &mut item.content].into_iter().flatten() {
            *body = rewrite_body(body, policy);
        }

        if let Some(link) = item.link.as_mut() {
            *link = strip_tracking(link, &self.config.tracking_params);
        }

        if let Some(date) = item.pub_date.as_mut() {
            *date = format_pub_date(date);
        }

        let mut page = ArticlePage::new(self.fetcher, item.link.as_deref());

        item.thumbnail = resolve_thumbnail(
            item,
            &mut page,
            &self.config.image_extensions,
            self.config.default_thumbnail.as_deref(),
        );

        if item.creator.is_none() && item.author.is_none() {
            if let Some(name) = find_author(&mut page) {
                debug!(link = ?item.link, author = %name, "backfilled author");
                item.creator = Some(name.clone());
                item.author = Some(name);
            }
        }
    }
}
