//! A small, tolerant XML element tree.
//!
//! Built from `quick-xml` events: end-tag names are not checked, unclosed
//! elements are closed at end of input, comments, processing instructions
//! and declarations are dropped, and whitespace-only text between elements
//! is discarded. Text is entity-decoded with the HTML entity table so feeds
//! that leak `&nbsp;` and friends still read.

use html_escape::decode_html_entities;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::FeedError;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attrs: Vec::new(), children: Vec::new() }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn with_cdata(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::CData(text.into()));
        self
    }

    /// Namespace prefix of the element name, if any.
    pub fn prefix(&self) -> Option<&str> {
        split_prefix(&self.name).0
    }

    /// True when the element name equals `name`, ignoring ASCII case.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn local_name(&self) -> &str {
        split_prefix(&self.name).1
    }

    /// Attribute value by key, ignoring ASCII case.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(name))
    }

    /// Concatenated text and CDATA of direct children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                XmlNode::Element(_) => {}
            }
        }
        out
    }

    /// Visit this element and all descendants in document order.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a XmlElement)) {
        visit(self);
        for el in self.elements() {
            el.walk(visit);
        }
    }
}

pub fn split_prefix(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Parse `xml` and return its first root element, if there is one.
pub fn parse(xml: &str) -> Result<Option<XmlElement>, FeedError> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(element_from(&e)),
            Event::Empty(e) => {
                let el = element_from(&e);
                attach(&mut stack, &mut root, el);
            }
            Event::End(_) => {
                if let Some(el) = stack.pop() {
                    attach(&mut stack, &mut root, el);
                }
            }
            Event::Text(t) => {
                let raw = String::from_utf8_lossy(&t);
                if raw.trim().is_empty() {
                    continue;
                }
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(decode_html_entities(&raw).into_owned()));
                }
            }
            Event::CData(c) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::CData(String::from_utf8_lossy(&c).into_owned()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        if root.is_some() && stack.is_empty() {
            break;
        }
    }

    // Close anything left open by a truncated payload.
    while let Some(el) = stack.pop() {
        attach(&mut stack, &mut root, el);
    }
    Ok(root)
}

fn element_from(e: &BytesStart<'_>) -> XmlElement {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let attrs = e
        .attributes()
        .with_checks(false)
        .flatten()
        .map(|a| {
            let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&a.value).into_owned();
            (key, decode_html_entities(&raw).into_owned())
        })
        .collect();
    XmlElement { name, attrs, children: Vec::new() }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, el: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(el)),
        None => {
            if root.is_none() {
                *root = Some(el);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_nested_tree_with_cdata_and_entities() {
        let root = parse(
            r#"<rss><channel><title>A &amp; B&nbsp;C</title><item><description><![CDATA[<p>x</p>]]></description></item></channel></rss>"#,
        )
        .unwrap()
        .unwrap();
        let channel = root.child("channel").unwrap();
        assert_eq!(channel.child("title").unwrap().text(), "A & B\u{a0}C");
        let item = channel.child("item").unwrap();
        assert_eq!(item.child("description").unwrap().text(), "<p>x</p>");
    }

    #[test]
    fn self_closing_elements_and_attributes() {
        let root = parse(r#"<rss><atom:link href="https://a.b/feed?x=1&amp;y=2" rel="self"/></rss>"#)
            .unwrap()
            .unwrap();
        let link = root.child("atom:link").unwrap();
        assert_eq!(link.prefix(), Some("atom"));
        assert_eq!(link.local_name(), "link");
        assert_eq!(link.attr("HREF"), Some("https://a.b/feed?x=1&y=2"));
        assert!(link.children.is_empty());
    }

    #[test]
    fn unclosed_elements_are_closed_at_eof() {
        let root = parse("<rss><channel><item><title>t</title>").unwrap().unwrap();
        let item = root.child("channel").unwrap().child("item").unwrap();
        assert_eq!(item.child("title").unwrap().text(), "t");
    }

    #[test]
    fn no_root_element() {
        assert!(parse("just some text").unwrap().is_none());
    }

    #[test]
    fn whitespace_between_elements_is_dropped() {
        let root = parse("<a>\n  <b>x</b>\n</a>").unwrap().unwrap();
        assert_eq!(root.children.len(), 1);
    }
}
