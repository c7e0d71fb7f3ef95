//! Mention parsing and display segmentation.
//!
//! Chat messages embed mention tokens as `@` followed by word characters.
//! Parsing never touches storage; resolving a token against the active
//! staff roster is the caller's job.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref MENTION_RE: Regex = Regex::new(r"@(\w+)").unwrap();
}

/// One piece of a message rendered for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSegment {
    /// Literal text, shown as-is.
    Text(String),
    /// A token that resolved to an active staff username.
    Mention(String),
}

/// Extracts candidate usernames from mention tokens, in order of first
/// occurrence, without duplicates.
///
/// Tokens are *candidates*: `@carol` is returned even if no such staff
/// member exists. Fan-out resolves each candidate against the roster.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut mentions = Vec::new();
    for cap in MENTION_RE.captures_iter(text) {
        let username = cap[1].to_string();
        if seen.insert(username.clone()) {
            mentions.push(username);
        }
    }
    mentions
}

/// Splits a message into literal and mention segments for display.
///
/// Only tokens present in `active_usernames` become `Mention` segments; an
/// unresolved token stays inside the surrounding literal text rather than
/// turning into an error. Consecutive literal stretches are merged.
pub fn render_with_mentions(
    text: &str,
    active_usernames: &HashSet<String>,
) -> Vec<MessageSegment> {
    let mut segments: Vec<MessageSegment> = Vec::new();
    let mut literal = String::new();
    let mut cursor = 0;

    for m in MENTION_RE.captures_iter(text) {
        let whole = m.get(0).unwrap();
        let username = &m[1];

        literal.push_str(&text[cursor..whole.start()]);
        if active_usernames.contains(username) {
            if !literal.is_empty() {
                segments.push(MessageSegment::Text(std::mem::take(&mut literal)));
            }
            segments.push(MessageSegment::Mention(username.to_string()));
        } else {
            literal.push_str(whole.as_str());
        }
        cursor = whole.end();
    }

    literal.push_str(&text[cursor..]);
    if !literal.is_empty() {
        segments.push(MessageSegment::Text(literal));
    }
    segments
}
