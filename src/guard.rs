//! Final check on serialized output before it is published.
//!
//! The bytes are re-read with a strict reader and checked for: a single XML
//! declaration, an `rss` root, element and attribute prefixes drawn only from
//! the allowed set, namespace declarations only on the root, and exactly one
//! self link pointing at the configured address.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::config::Config;
use crate::error::FeedError;
use crate::xml::split_prefix;

#[derive(Default)]
struct Tally {
    declarations: usize,
    self_links: Vec<String>,
    saw_root: bool,
}

pub fn check(output: &[u8], config: &Config) -> Result<(), FeedError> {
    let mut reader = Reader::from_reader(output);
    reader.config_mut().trim_text(true);

    let mut tally = Tally::default();
    let mut depth = 0usize;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Decl(_) => tally.declarations += 1,
            Event::Start(e) => {
                inspect(&e, depth, config, &mut tally)?;
                depth += 1;
            }
            Event::Empty(e) => inspect(&e, depth, config, &mut tally)?,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if tally.declarations != 1 {
        return Err(violation(format!("expected one XML declaration, found {}", tally.declarations)));
    }
    if !tally.saw_root {
        return Err(violation("missing <rss> root".to_string()));
    }
    match tally.self_links.as_slice() {
        [href] if *href == config.self_url => {}
        [href] => return Err(violation(format!("self link points at {href}"))),
        links => return Err(violation(format!("expected one self link, found {}", links.len()))),
    }
    debug!(bytes = output.len(), "output passed invariant checks");
    Ok(())
}

fn inspect(e: &BytesStart<'_>, depth: usize, config: &Config, tally: &mut Tally) -> Result<(), FeedError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    if depth == 0 {
        if !name.eq_ignore_ascii_case("rss") || tally.saw_root {
            return Err(violation(format!("unexpected root element <{name}>")));
        }
        tally.saw_root = true;
    }
    if let (Some(prefix), _) = split_prefix(&name) {
        if !config.allows_prefix(prefix) {
            return Err(violation(format!("element <{name}> uses undeclared prefix")));
        }
    }

    let mut rel = None;
    let mut href = None;
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        match split_prefix(&key) {
            (None, "xmlns") => return Err(violation("default namespace declaration".to_string())),
            (Some("xmlns"), declared) => {
                if depth != 0 {
                    return Err(violation(format!("namespace declaration on <{name}>")));
                }
                if !config.allows_prefix(declared) {
                    return Err(violation(format!("undeclared namespace prefix {declared}")));
                }
            }
            (Some("xml"), _) | (None, _) => {}
            (Some(prefix), _) if config.allows_prefix(prefix) => {}
            (Some(_), _) => return Err(violation(format!("attribute {key} uses undeclared prefix"))),
        }
        if key.eq_ignore_ascii_case("rel") {
            rel = Some(attr.unescape_value()?.into_owned());
        } else if key.eq_ignore_ascii_case("href") {
            href = Some(attr.unescape_value()?.into_owned());
        }
    }

    let is_self = name.eq_ignore_ascii_case("atom:link")
        && rel.as_deref().map_or(true, |r| r.trim().eq_ignore_ascii_case("self"));
    if is_self {
        tally.self_links.push(href.unwrap_or_default());
    }
    Ok(())
}

fn violation(msg: String) -> FeedError {
    FeedError::Invariant(msg)
}
