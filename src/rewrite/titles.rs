//! Full title reconstruction.
//!
//! Upstream item titles are truncated; the complete text only survives in
//! the item's HTML description. The document is scanned with a streaming
//! XML reader to locate `rss > channel > item` records by byte offset, and
//! only the inner text of each item's first `<title>` is spliced. Every other
//! byte of the document is copied through untouched.

use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use quick_xml::escape::{partial_escape, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

use crate::config::MissingTitlePolicy;
use crate::rewrite::FeedError;

/// Channel feeds: `...</a></p><p>Full title</p>`.
static CHANNEL_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)/a>\s*</p>\s*<p>(.*?)</p>").expect("Invalid channel title pattern")
});

/// Board feeds: `<a ...><img ...></a>Full title` up to the end of the description.
static BOARD_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)>\s*</a>(.*)\z").expect("Invalid board title pattern")
});

/// Byte layout of one `<item>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpan {
    /// From `<item>` through `</item>`.
    pub range: Range<usize>,
    /// Inner text of the first `<title>` element, if any.
    pub title: Option<Range<usize>>,
    /// Unescaped description markup (text and CDATA joined).
    pub description: Option<String>,
}

/// Byte layout of a feed document.
///
/// `head` is everything before the first item and `tail` everything from
/// `</channel>` on; both are copied verbatim on output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedLayout {
    pub head: Range<usize>,
    pub items: Vec<ItemSpan>,
    pub tail: Range<usize>,
}

#[derive(Default)]
struct ItemBuilder {
    start: usize,
    title_start: Option<usize>,
    title: Option<Range<usize>>,
    description: Option<String>,
    /// Set once the description held text that could not be unescaped.
    undecodable: bool,
}

fn at(stack: &[Vec<u8>], path: &[&[u8]]) -> bool {
    stack.len() == path.len() && stack.iter().zip(path).all(|(a, b)| a.as_slice() == *b)
}

const CHANNEL: &[&[u8]] = &[b"rss", b"channel"];
const ITEM: &[&[u8]] = &[b"rss", b"channel", b"item"];
const TITLE: &[&[u8]] = &[b"rss", b"channel", b"item", b"title"];
const DESCRIPTION: &[&[u8]] = &[b"rss", b"channel", b"item", b"description"];

impl FeedLayout {
    /// Locate items, titles and descriptions in `feed`.
    pub fn scan(feed: &[u8]) -> Result<Self, FeedError> {
        let mut reader = Reader::from_reader(feed);
        let mut stack: Vec<Vec<u8>> = Vec::new();
        let mut items = Vec::new();
        let mut current: Option<ItemBuilder> = None;
        let mut saw_channel = false;
        let mut channel_end = None;

        loop {
            let event_start = reader.buffer_position() as usize;
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(source) => {
                    return Err(FeedError::Malformed {
                        position: reader.error_position() as usize,
                        source,
                    })
                }
            };
            let event_end = reader.buffer_position() as usize;

            match event {
                Event::Start(e) => {
                    stack.push(e.name().as_ref().to_vec());
                    if at(&stack, CHANNEL) {
                        saw_channel = true;
                    } else if at(&stack, ITEM) {
                        current = Some(ItemBuilder {
                            start: event_start,
                            ..Default::default()
                        });
                    } else if at(&stack, TITLE) {
                        if let Some(item) = current.as_mut() {
                            if item.title.is_none() && item.title_start.is_none() {
                                item.title_start = Some(event_end);
                            }
                        }
                    } else if at(&stack, DESCRIPTION) {
                        if let Some(item) = current.as_mut().filter(|item| !item.undecodable) {
                            item.description.get_or_insert_with(String::new);
                        }
                    }
                }
                Event::End(_) => {
                    if at(&stack, TITLE) {
                        if let Some(item) = current.as_mut() {
                            if let Some(start) = item.title_start.take() {
                                item.title = Some(start..event_start);
                            }
                        }
                    } else if at(&stack, ITEM) {
                        if let Some(item) = current.take() {
                            items.push(ItemSpan {
                                range: item.start..event_end,
                                title: item.title,
                                description: item.description,
                            });
                        }
                    } else if at(&stack, CHANNEL) {
                        channel_end = Some(event_start);
                    }
                    stack.pop();
                }
                Event::Text(text) if at(&stack, DESCRIPTION) => match text.unescape() {
                    Ok(text) => push_description(&mut current, &text),
                    Err(e) => {
                        tracing::debug!(position = event_start, error = %e, "Undecodable item description");
                        if let Some(item) = current.as_mut() {
                            item.description = None;
                            item.undecodable = true;
                        }
                    }
                },
                Event::CData(data) if at(&stack, DESCRIPTION) => {
                    push_description(&mut current, &String::from_utf8_lossy(&data));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_channel {
            return Err(FeedError::MissingChannel);
        }
        let tail_start = match channel_end {
            Some(pos) if stack.is_empty() => pos,
            _ => return Err(FeedError::Truncated),
        };
        let head_end = match items.first() {
            Some(item) => item.range.start,
            None => return Err(FeedError::NoItems),
        };

        Ok(Self {
            head: 0..head_end,
            items,
            tail: tail_start..feed.len(),
        })
    }
}

fn push_description(current: &mut Option<ItemBuilder>, text: &str) {
    if let Some(description) = current.as_mut().and_then(|item| item.description.as_mut()) {
        description.push_str(text);
    }
}

/// Recover the full title from an item's description markup.
///
/// Channel-style markup is tried first, then board-style. Entities in the
/// recovered text are decoded where possible. `None` means the description
/// carries no usable title; this is not an error.
pub fn full_title(description: &str) -> Option<String> {
    let captured = CHANNEL_TITLE
        .captures(description)
        .or_else(|| BOARD_TITLE.captures(description))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())?;
    if captured.is_empty() {
        return None;
    }
    let decoded = unescape(captured).unwrap_or(Cow::Borrowed(captured));
    Some(decoded.into_owned())
}

/// Replaces truncated item titles with the full title from the description.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleReconstructor {
    policy: MissingTitlePolicy,
}

/// Result of reconstructing one document.
#[derive(Debug)]
pub struct Reconstructed {
    pub body: Vec<u8>,
    pub items: usize,
    pub rewritten: usize,
}

impl TitleReconstructor {
    pub fn new(policy: MissingTitlePolicy) -> Self {
        Self { policy }
    }

    /// Rewrite every item title in `feed`.
    ///
    /// Fails when the document is not an RSS channel with at least one item.
    pub fn reconstruct(&self, feed: &[u8]) -> Result<Reconstructed, FeedError> {
        let layout = FeedLayout::scan(feed)?;
        let mut body = Vec::with_capacity(feed.len());
        let mut cursor = 0;
        let mut rewritten = 0;

        for item in &layout.items {
            let Some(title) = &item.title else {
                continue;
            };
            let replacement = match item.description.as_deref().and_then(full_title) {
                Some(full) => partial_escape(&full).into_owned(),
                None => match self.policy {
                    MissingTitlePolicy::Keep => continue,
                    MissingTitlePolicy::Blank => String::new(),
                },
            };
            body.extend_from_slice(&feed[cursor..title.start]);
            body.extend_from_slice(replacement.as_bytes());
            cursor = title.end;
            rewritten += 1;
        }
        body.extend_from_slice(&feed[cursor..]);

        Ok(Reconstructed {
            body,
            items: layout.items.len(),
            rewritten,
        })
    }
}
