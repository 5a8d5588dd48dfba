//! Parser for the server's plain-text listings.
//!
//! Recent changes, search results and page histories share one format:
//! blocks of `key: value` lines separated by blank lines, where the first
//! block describes the wiki itself.
//!
//! ```text
//! title: Alex Schroeder
//! link: https://alexschroeder.ch/wiki
//!
//! title: Contact
//! generator: Alex
//! last-modified: 2024-01-01T00:00:00Z
//! revision: 59
//! minor: 1
//! ```
//!
//! The format is not a strict grammar, so the parser never fails: lines and
//! records it cannot use are reported as [`ParseAnomaly`] and skipped.

use crate::domain::FeedItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAnomaly {
    /// A line without a `key: value` separator.
    MalformedLine { line: usize, text: String },
    /// A record that never named its page.
    MissingTitle { line: usize },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> Vec<FeedItem> {
        self.parse_report(text).0
    }

    pub fn parse_report(&self, text: &str) -> (Vec<FeedItem>, Vec<ParseAnomaly>) {
        let mut items = Vec::new();
        let mut anomalies = Vec::new();

        for block in blocks(text).skip(1) {
            match parse_block(&block, &mut anomalies) {
                Some(item) => items.push(item),
                None => anomalies.push(ParseAnomaly::MissingTitle {
                    line: block.first_line,
                }),
            }
        }

        for anomaly in &anomalies {
            tracing::debug!("Skipping feed input: {:?}", anomaly);
        }

        (items, anomalies)
    }
}

struct Block<'a> {
    /// 1-based line number of the first line
    first_line: usize,
    lines: Vec<&'a str>,
}

fn blocks(text: &str) -> impl Iterator<Item = Block<'_>> {
    let mut blocks = Vec::new();
    let mut current: Option<Block<'_>> = None;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            continue;
        }
        current
            .get_or_insert_with(|| Block {
                first_line: index + 1,
                lines: Vec::new(),
            })
            .lines
            .push(line);
    }

    if let Some(block) = current {
        blocks.push(block);
    }
    blocks.into_iter()
}

fn parse_block(block: &Block<'_>, anomalies: &mut Vec<ParseAnomaly>) -> Option<FeedItem> {
    let mut title = None;
    let mut item = FeedItem::default();

    for (offset, line) in block.lines.iter().enumerate() {
        let Some((key, value)) = line.split_once(':') else {
            anomalies.push(ParseAnomaly::MalformedLine {
                line: block.first_line + offset,
                text: line.to_string(),
            });
            continue;
        };

        let value = value.trim();
        let present = (!value.is_empty()).then(|| value.to_string());
        match key.trim() {
            "title" => title = present,
            "revision" => item.revision = present,
            "generator" => item.generator = present,
            "last-modified" => item.last_modified = present,
            "description" => item.description = present,
            "minor" => item.is_minor = is_set(value),
            _ => {}
        }
    }

    item.title = title?;
    Some(item)
}

fn is_set(value: &str) -> bool {
    !value.is_empty() && !matches!(value.to_ascii_lowercase().as_str(), "0" | "false" | "off")
}
