//! Document-level normalization: encoding, namespaces, self link, item cap.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::FeedError;
use crate::model::{is_self_link, Channel, FeedDocument};
use crate::sanitize::sanitize_image_url;
use crate::text::{collapse_whitespace, format_pub_date};
use crate::xml::{self, split_prefix, XmlElement, XmlNode};

static RE_XML_DECL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<\?xml\s.*?\?>").unwrap());
static RE_DECL_ENCODING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<\?xml[^>]*encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#).unwrap());

/// Decode fetched bytes to UTF-8, honouring a BOM first and the XML
/// declaration's `encoding` second.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let declared = RE_DECL_ENCODING
        .captures(&head)
        .and_then(|c| encoding_rs::Encoding::for_label(c[1].as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);
    let (text, used, had_errors) = declared.decode(bytes);
    if had_errors {
        debug!(encoding = used.name(), "feed payload contained undecodable bytes");
    }
    text.into_owned()
}

/// Remove every element whose prefix is not allowed (with its subtree), and
/// every attribute that declares a namespace or uses a disallowed prefix.
/// Allowed prefixes are rewritten in lowercase.
pub fn strip_foreign_namespaces(el: &mut XmlElement, config: &Config) {
    el.attrs.retain(|(key, _)| attr_allowed(key, config));
    for (key, _) in el.attrs.iter_mut() {
        lowercase_prefix(key);
    }

    el.children.retain(|child| match child {
        XmlNode::Element(e) => e.prefix().map_or(true, |p| config.allows_prefix(p)),
        _ => true,
    });
    for child in el.children.iter_mut() {
        if let XmlNode::Element(e) = child {
            lowercase_prefix(&mut e.name);
            strip_foreign_namespaces(e, config);
        }
    }
}

fn attr_allowed(key: &str, config: &Config) -> bool {
    match split_prefix(key) {
        (None, local) => !local.eq_ignore_ascii_case("xmlns"),
        (Some(prefix), _) => {
            !prefix.eq_ignore_ascii_case("xmlns")
                && (prefix.eq_ignore_ascii_case("xml") || config.allows_prefix(prefix))
        }
    }
}

fn lowercase_prefix(name: &mut String) {
    if let (Some(prefix), local) = split_prefix(name) {
        if prefix.chars().any(|c| c.is_ascii_uppercase()) {
            *name = format!("{}:{}", prefix.to_ascii_lowercase(), local);
        }
    }
}

/// Parse and normalize a decoded feed.
///
/// Fails when there is no `rss` root with a `channel`. The returned document
/// has exactly one self link (the configured one), only allowed namespaces
/// and at most `max_items` items.
pub fn normalize(xml_text: &str, config: &Config) -> Result<FeedDocument, FeedError> {
    let stripped = RE_XML_DECL.replace_all(xml_text, "");
    let mut root = xml::parse(&stripped)?.ok_or(FeedError::MissingRoot)?;
    if !root.local_name().eq_ignore_ascii_case("rss") {
        return Err(FeedError::MissingRoot);
    }

    strip_foreign_namespaces(&mut root, config);

    let channel = root
        .children
        .into_iter()
        .find_map(|c| match c {
            XmlNode::Element(e) if e.is("channel") => Some(e),
            _ => None,
        })
        .ok_or(FeedError::MissingChannel)?;

    let (mut channel, mut items) = Channel::from_element(channel);
    for list in [&mut channel.head, &mut channel.tail] {
        list.retain_mut(|el| clean_passthrough(el, config));
    }
    for item in items.iter_mut() {
        item.extra.retain_mut(|el| clean_passthrough(el, config));
    }
    if channel.self_link.as_deref() != Some(config.self_url.as_str()) {
        debug!(found = ?channel.self_link, "replacing self link");
    }
    channel.self_link = Some(config.self_url.clone());
    normalize_channel_metadata(&mut channel);

    let total = items.len();
    items.truncate(config.max_items);
    info!(total, kept = items.len(), "normalized feed document");

    Ok(FeedDocument { channel, items })
}

/// Prepare an element that is copied to the output as is. Returns `false`
/// when it must be dropped: self links anywhere but the one the serializer
/// writes, and thumbnails whose URL does not pass image validation.
/// Surviving thumbnail URLs are rewritten to their sanitized form.
fn clean_passthrough(el: &mut XmlElement, config: &Config) -> bool {
    if is_self_link(el) {
        debug!(href = ?el.attr("href"), "dropping nested self link");
        return false;
    }
    if el.is("media:thumbnail") {
        let Some(url) = el.attr("url").and_then(|u| sanitize_image_url(u, &config.image_extensions)) else {
            debug!(url = ?el.attr("url"), "dropping nested thumbnail");
            return false;
        };
        for (key, value) in el.attrs.iter_mut() {
            if key.eq_ignore_ascii_case("url") {
                *value = url.clone();
            }
        }
    }
    el.children.retain_mut(|child| match child {
        XmlNode::Element(e) => clean_passthrough(e, config),
        _ => true,
    });
    true
}

fn normalize_channel_metadata(channel: &mut Channel) {
    for field in [&mut channel.title, &mut channel.description] {
        if let Some(v) = field.as_mut() {
            *v = collapse_whitespace(v);
        }
    }
    for field in [&mut channel.pub_date, &mut channel.last_build_date] {
        if let Some(v) = field.as_mut() {
            *v = format_pub_date(v);
        }
    }
}
