use html_escape::encode_text;

use crate::config::BodyMode;
use crate::sanitize::{
    cap_links, flatten, remove_junk, truncate_html, unwrap_low_value_anchors, unwrap_unsafe_anchors,
};
use crate::text::truncate_at_whitespace;

/// Body policy knobs, lifted out of [`crate::config::Config`].
#[derive(Debug, Clone, Copy)]
pub struct BodyPolicy {
    pub mode: BodyMode,
    pub max_chars: usize,
    pub max_links: usize,
}

/// Sanitize an item body and bring it under the length cap.
///
/// Plain-text output is still entity-escaped (`&`, `<`, `>`): RSS readers
/// treat the body as HTML, and a rerun decodes it back to the same text.
/// The cap counts decoded characters.
pub fn rewrite_body(raw: &str, policy: BodyPolicy) -> String {
    let html = remove_junk(raw);
    let html = unwrap_unsafe_anchors(&html);
    let html = unwrap_low_value_anchors(&html);
    match policy.mode {
        BodyMode::Html => truncate_html(&cap_links(&html, policy.max_links), policy.max_chars)
            .trim()
            .to_string(),
        BodyMode::PlainText => {
            let text = truncate_at_whitespace(&flatten(&html), policy.max_chars);
            encode_text(&text).into_owned()
        }
    }
}
