//! Read-only listings fetched from a wiki: recent changes, full-text search
//! and page-name matches. They differ only in how they are fetched and
//! parsed, which [`ListingKind`] captures.

use crate::app::Result;
use crate::domain::{FeedItem, WikiConfig};
use crate::sync::SyncEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingKind {
    RecentChanges,
    Search(String),
    /// Page names matching a pattern
    Match(String),
}

impl ListingKind {
    pub fn title(&self) -> String {
        match self {
            ListingKind::RecentChanges => "Recent changes".to_string(),
            ListingKind::Search(pattern) => format!("Search: {}", pattern),
            ListingKind::Match(pattern) => format!("Pages matching: {}", pattern),
        }
    }

    async fn fetch(&self, engine: &SyncEngine, wiki: &WikiConfig) -> Result<Vec<FeedItem>> {
        match self {
            ListingKind::RecentChanges => engine.recent_changes(wiki).await,
            ListingKind::Search(pattern) => engine.search(wiki, pattern).await,
            ListingKind::Match(pattern) => Ok(engine
                .match_page_names(wiki, pattern)
                .await?
                .into_iter()
                .map(FeedItem::new)
                .collect()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteListing {
    wiki: WikiConfig,
    kind: ListingKind,
    items: Vec<FeedItem>,
}

impl RemoteListing {
    pub fn new(wiki: WikiConfig, kind: ListingKind) -> Self {
        Self {
            wiki,
            kind,
            items: Vec::new(),
        }
    }

    pub fn kind(&self) -> &ListingKind {
        &self.kind
    }

    pub fn title(&self) -> String {
        format!("{} ({})", self.kind.title(), self.wiki.name)
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    /// Fetch again. On failure the previous items are kept.
    pub async fn reload(&mut self, engine: &SyncEngine) -> Result<&[FeedItem]> {
        self.items = self.kind.fetch(engine, &self.wiki).await?;
        Ok(&self.items)
    }
}
