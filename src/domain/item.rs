use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One record of a recent-changes, search or history response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub revision: Option<String>,
    pub generator: Option<String>,
    pub last_modified: Option<String>,
    pub description: Option<String>,
    pub is_minor: bool,
}

impl FeedItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.last_modified
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn display_author(&self) -> &str {
        self.generator.as_deref().unwrap_or("(anonymous)")
    }
}
