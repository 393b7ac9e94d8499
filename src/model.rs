//! Typed view of a feed: channel metadata plus items.
//!
//! Elements the pipeline does not rewrite are carried through untouched in
//! `head`/`tail` (channel) and `extra` (item).

use crate::xml::XmlElement;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedDocument {
    pub channel: Channel,
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub pub_date: Option<String>,
    pub last_build_date: Option<String>,
    pub self_link: Option<String>,
    /// Other channel children before the first item.
    pub head: Vec<XmlElement>,
    /// Channel children after the first item that are not items.
    pub tail: Vec<XmlElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Guid {
    pub value: String,
    pub is_permalink: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub guid: Option<Guid>,
    pub pub_date: Option<String>,
    /// `dc:creator`
    pub creator: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    /// `content:encoded`
    pub content: Option<String>,
    /// `media:thumbnail@url`
    pub thumbnail: Option<String>,
    pub extra: Vec<XmlElement>,
}

/// Trimmed text content, `None` when blank.
fn text_of(el: &XmlElement) -> Option<String> {
    let text = el.text();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Store into `slot` unless it already holds a value; later duplicates are dropped.
fn first(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

pub fn is_self_link(el: &XmlElement) -> bool {
    el.is("atom:link")
        && el
            .attr("rel")
            .map_or(true, |rel| rel.trim().eq_ignore_ascii_case("self"))
}

impl Channel {
    /// Split a `<channel>` element into metadata, items and passthrough
    /// elements. Self links are collected into `self_link` (the last one wins;
    /// the normalizer replaces it anyway).
    pub fn from_element(el: XmlElement) -> (Channel, Vec<FeedItem>) {
        let mut channel = Channel::default();
        let mut items = Vec::new();

        for child in el.children {
            let crate::xml::XmlNode::Element(child) = child else {
                continue;
            };
            match child.name.to_ascii_lowercase().as_str() {
                "item" => {
                    items.push(FeedItem::from_element(child));
                    continue;
                }
                "title" => first(&mut channel.title, text_of(&child)),
                "link" => first(&mut channel.link, text_of(&child)),
                "description" => first(&mut channel.description, text_of(&child)),
                "language" => first(&mut channel.language, text_of(&child)),
                "pubdate" => first(&mut channel.pub_date, text_of(&child)),
                "lastbuilddate" => first(&mut channel.last_build_date, text_of(&child)),
                _ if is_self_link(&child) => {
                    channel.self_link = child.attr("href").map(str::to_string);
                }
                _ if items.is_empty() => channel.head.push(child),
                _ => channel.tail.push(child),
            }
        }
        (channel, items)
    }
}

impl FeedItem {
    pub fn from_element(el: XmlElement) -> FeedItem {
        let mut item = FeedItem::default();
        for child in el.children {
            let crate::xml::XmlNode::Element(child) = child else {
                continue;
            };
            match child.name.to_ascii_lowercase().as_str() {
                "title" => first(&mut item.title, text_of(&child)),
                "link" => first(&mut item.link, text_of(&child)),
                "guid" => {
                    if item.guid.is_none() {
                        item.guid = text_of(&child).map(|value| Guid {
                            value,
                            is_permalink: child.attr("isPermaLink").map(str::to_string),
                        });
                    }
                }
                "pubdate" => first(&mut item.pub_date, text_of(&child)),
                "dc:creator" => first(&mut item.creator, text_of(&child)),
                "author" => first(&mut item.author, text_of(&child)),
                "description" => first(&mut item.description, Some(child.text())),
                "content:encoded" => first(&mut item.content, Some(child.text())),
                "media:thumbnail" => first(&mut item.thumbnail, child.attr("url").map(str::to_string)),
                _ => item.extra.push(child),
            }
        }
        item
    }
}
