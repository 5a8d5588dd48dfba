use std::fmt;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Revision value recorded for a page that does not exist on the server yet.
pub const NEW_REVISION: &str = "new";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageKey {
    pub wiki: String,
    pub page: String,
}

impl PageKey {
    pub fn new(wiki: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            wiki: wiki.into(),
            page: page.into(),
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.wiki, self.page)
    }
}

pub fn page_id(name: &str) -> String {
    name.replace(' ', "_")
}

/// Inverse of [`page_id`], for names coming back from the server.
pub fn display_name(id: &str) -> String {
    id.replace('_', " ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub key: PageKey,
    pub revision: String,
    /// Timestamp of `revision` as reported by the page history
    pub last_modified: Option<String>,
}

impl RevisionRecord {
    pub fn new(key: PageKey, revision: impl Into<String>) -> Self {
        Self {
            key,
            revision: revision.into(),
            last_modified: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.revision == NEW_REVISION
    }

    /// Seconds since the epoch, the form the server expects in `oldtime`.
    pub fn oldtime(&self) -> Option<i64> {
        let stamp = self.last_modified.as_deref()?;
        DateTime::parse_from_rfc3339(stamp)
            .ok()
            .map(|dt| dt.timestamp())
            .or_else(|| stamp.parse::<i64>().ok())
    }
}

/// Caller-supplied metadata for a post or preview.
#[derive(Debug, Clone, Default)]
pub struct PostMeta {
    pub summary: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub minor: bool,
}
