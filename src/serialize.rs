//! Writes a [`FeedDocument`] back out as RSS 2.0.
//!
//! Output is deterministic: one declaration, every allowed namespace
//! declared on the root, a fixed element order, two-space indentation.
//! Parsing the output and serializing it again yields the same bytes.

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::Config;
use crate::error::FeedError;
use crate::model::{Channel, FeedDocument, FeedItem};
use crate::text::strip_control_chars;
use crate::xml::{XmlElement, XmlNode};

type XmlWriter = Writer<Vec<u8>>;

pub fn to_bytes(doc: &FeedDocument, config: &Config) -> Result<Vec<u8>, FeedError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    for (prefix, uri) in &config.namespaces {
        let key = format!("xmlns:{prefix}");
        rss.push_attribute((key.as_str(), uri.as_str()));
    }
    writer.write_event(Event::Start(rss))?;
    write_channel(&mut writer, &doc.channel, &doc.items, config)?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let mut out = writer.into_inner();
    out.push(b'\n');
    Ok(out)
}

fn write_channel(w: &mut XmlWriter, channel: &Channel, items: &[FeedItem], config: &Config) -> Result<(), FeedError> {
    w.write_event(Event::Start(BytesStart::new("channel")))?;
    write_opt_text(w, "title", channel.title.as_deref())?;
    write_opt_text(w, "link", channel.link.as_deref())?;
    write_opt_text(w, "description", channel.description.as_deref())?;
    write_opt_text(w, "language", channel.language.as_deref())?;
    write_opt_text(w, "pubDate", channel.pub_date.as_deref())?;
    write_opt_text(w, "lastBuildDate", channel.last_build_date.as_deref())?;

    let mut self_link = BytesStart::new("atom:link");
    self_link.push_attribute(("href", strip_control_chars(&config.self_url).as_str()));
    self_link.push_attribute(("rel", "self"));
    self_link.push_attribute(("type", "application/rss+xml"));
    w.write_event(Event::Empty(self_link))?;

    for el in &channel.head {
        write_element(w, el)?;
    }
    for item in items {
        write_item(w, item)?;
    }
    for el in &channel.tail {
        write_element(w, el)?;
    }
    w.write_event(Event::End(BytesEnd::new("channel")))?;
    Ok(())
}

fn write_item(w: &mut XmlWriter, item: &FeedItem) -> Result<(), FeedError> {
    w.write_event(Event::Start(BytesStart::new("item")))?;
    if let Some(title) = &item.title {
        write_cdata(w, "title", title)?;
    }
    write_opt_text(w, "link", item.link.as_deref())?;
    if let Some(guid) = &item.guid {
        let mut start = BytesStart::new("guid");
        if let Some(p) = &guid.is_permalink {
            start.push_attribute(("isPermaLink", strip_control_chars(p).as_str()));
        }
        w.write_event(Event::Start(start))?;
        w.write_event(Event::Text(BytesText::new(&strip_control_chars(&guid.value))))?;
        w.write_event(Event::End(BytesEnd::new("guid")))?;
    }
    write_opt_text(w, "pubDate", item.pub_date.as_deref())?;
    write_opt_text(w, "dc:creator", item.creator.as_deref())?;
    write_opt_text(w, "author", item.author.as_deref())?;
    if let Some(body) = &item.description {
        write_cdata(w, "description", body)?;
    }
    if let Some(body) = &item.content {
        write_cdata(w, "content:encoded", body)?;
    }
    if let Some(url) = &item.thumbnail {
        let mut thumb = BytesStart::new("media:thumbnail");
        thumb.push_attribute(("url", strip_control_chars(url).as_str()));
        w.write_event(Event::Empty(thumb))?;
    }
    for el in &item.extra {
        write_element(w, el)?;
    }
    w.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

fn write_opt_text(w: &mut XmlWriter, name: &str, text: Option<&str>) -> Result<(), FeedError> {
    let Some(text) = text else {
        return Ok(());
    };
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(&strip_control_chars(text))))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_cdata(w: &mut XmlWriter, name: &str, text: &str) -> Result<(), FeedError> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::CData(BytesCData::new(cdata_safe(text))))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// A CDATA section cannot contain its own terminator.
fn cdata_safe(text: &str) -> String {
    strip_control_chars(text).replace("]]>", "]]&gt;")
}

/// Passthrough element, written as it was read.
fn write_element(w: &mut XmlWriter, el: &XmlElement) -> Result<(), FeedError> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attrs {
        start.push_attribute((key.as_str(), strip_control_chars(value).as_str()));
    }
    if el.children.is_empty() {
        w.write_event(Event::Empty(start))?;
        return Ok(());
    }
    w.write_event(Event::Start(start))?;
    for child in &el.children {
        match child {
            XmlNode::Element(e) => write_element(w, e)?,
            XmlNode::Text(t) => w.write_event(Event::Text(BytesText::new(&strip_control_chars(t))))?,
            XmlNode::CData(t) => w.write_event(Event::CData(BytesCData::new(cdata_safe(t))))?,
        }
    }
    w.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
    Ok(())
}

/// Body written in place of the feed when the run fails.
pub fn error_payload(message: &str) -> Vec<u8> {
    let message = html_escape::encode_text(&strip_control_chars(message)).into_owned();
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<error><message>{message}</message></error>\n").into_bytes()
}
