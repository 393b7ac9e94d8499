//! Markup sanitizer: composable transforms over HTML fragments.
//!
//! Every transform parses its input with `scraper` (html5ever, so nesting and
//! quoting quirks are handled the way a browser would), walks the tree and
//! re-serializes it. The serializer is deterministic, so feeding any output
//! back in yields the same string.

mod anchors;
mod flatten;
mod fragment;
mod junk;
mod urls;

pub use anchors::{cap_links, unwrap_low_value_anchors, unwrap_unsafe_anchors};
pub use flatten::flatten;
pub use fragment::truncate_html;
pub use junk::remove_junk;
pub use urls::{has_image_extension, sanitize_image_url, sanitize_url};
