//! Command templates for the `command` transport.

use serde::{Deserialize, Serialize};

use crate::transport::command::{self, CommandSet};
use crate::transport::template::TemplateError;

/// One shell command per remote operation. Unset entries use curl defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    pub get: String,
    pub history: String,
    pub post: String,
    pub preview: String,
    pub index: String,
    pub recent_changes: String,
    pub search: String,
    #[serde(rename = "match")]
    pub match_pages: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            get: command::DEFAULT_GET.to_string(),
            history: command::DEFAULT_HISTORY.to_string(),
            post: command::DEFAULT_POST.to_string(),
            preview: command::DEFAULT_PREVIEW.to_string(),
            index: command::DEFAULT_INDEX.to_string(),
            recent_changes: command::DEFAULT_RECENT_CHANGES.to_string(),
            search: command::DEFAULT_SEARCH.to_string(),
            match_pages: command::DEFAULT_MATCH.to_string(),
        }
    }
}

impl CommandConfig {
    /// Parse every template, failing on the first invalid one.
    pub fn compile(&self) -> Result<CommandSet, TemplateError> {
        Ok(CommandSet {
            get: self.get.parse()?,
            history: self.history.parse()?,
            post: self.post.parse()?,
            preview: self.preview.parse()?,
            index: self.index.parse()?,
            recent_changes: self.recent_changes.parse()?,
            search: self.search.parse()?,
            match_pages: self.match_pages.parse()?,
        })
    }
}
