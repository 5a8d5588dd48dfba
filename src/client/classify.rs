//! Turning raw server answers into success or failure.
//!
//! The server reports most failures as an ordinary HTML page titled
//! "Error", so every textual response is scanned for that page before the
//! caller gets to parse it.

use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;

use crate::app::{Result, SyncError};
use crate::transport::{Operation, Response, TRANSPORT_FAILURE_STATUS};

static ERROR_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?is)<title>\s*Error\s*</title>") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    });
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    });
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"<[^>]*>") {
    Ok(re) => re,
    Err(_) => unreachable!("static regex pattern"),
});

pub const CAUSE_UNKNOWN: &str = "cause unknown";
pub const TRANSPORT_FAILURE: &str = "transport failure";

/// Status the server answers with after storing a page.
pub const SAVED_STATUS: &str = "302";
/// Status of a re-rendered edit form.
pub const EDIT_FORM_STATUS: &str = "200";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStatus {
    Saved,
    /// The command did not report a status; the body showed no error.
    Unreported,
}

/// Error page first, then transport failure, otherwise the body is returned.
pub fn classify_response(operation: Operation, response: Response) -> Result<String> {
    if let Some(marker) = ERROR_TITLE_RE.find(&response.body) {
        let message = HEADING_RE
            .captures(&response.body[marker.end()..])
            .and_then(|caps| caps.get(1))
            .map(|m| clean_heading(m.as_str()))
            .filter(|heading| !heading.is_empty())
            .unwrap_or_else(|| CAUSE_UNKNOWN.to_string());

        tracing::warn!("Error {}: {}", operation.describe(), message);
        return Err(SyncError::Remote {
            message,
            raw: Some(response.body),
        });
    }

    if response
        .status
        .as_deref()
        .is_some_and(|status| status.starts_with(TRANSPORT_FAILURE_STATUS))
    {
        tracing::warn!("Error {}: {}", operation.describe(), TRANSPORT_FAILURE);
        return Err(SyncError::Remote {
            message: TRANSPORT_FAILURE.to_string(),
            raw: Some(response.body),
        });
    }

    Ok(response.body)
}

/// Interpret the status of a post whose body passed [`classify_response`].
pub fn classify_post_status(page: &str, status: Option<&str>) -> Result<PostStatus> {
    match status {
        Some(SAVED_STATUS) => Ok(PostStatus::Saved),
        Some(EDIT_FORM_STATUS) => Err(SyncError::EditConflict {
            page: page.to_string(),
        }),
        Some(other) => Err(SyncError::remote(format!("HTTP status {}", other))),
        None => Ok(PostStatus::Unreported),
    }
}

fn clean_heading(raw: &str) -> String {
    let text = TAG_RE.replace_all(raw, "");
    decode_html_entities(text.trim()).into_owned()
}
