//! The boundary to the wiki server.
//!
//! - [`Transport`]: async trait executing one [`Request`]
//! - [`HttpTransport`](http::HttpTransport): reqwest-based implementation
//! - [`CommandTransport`](command::CommandTransport): runs shell command templates (curl by default)

pub mod command;
pub mod http;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::WikiConfig;

/// Status prefix reported when a request never reached the server.
pub const TRANSPORT_FAILURE_STATUS: &str = "000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetPage,
    History,
    Post,
    Preview,
    Index,
    RecentChanges,
    Search,
    MatchPages,
}

impl Operation {
    pub fn describe(&self) -> &'static str {
        match self {
            Operation::GetPage => "getting page",
            Operation::History => "getting history",
            Operation::Post => "posting",
            Operation::Preview => "previewing",
            Operation::Index => "getting index",
            Operation::RecentChanges => "getting recent changes",
            Operation::Search => "searching",
            Operation::MatchPages => "matching page names",
        }
    }

    /// Whether the response carries an HTTP status code after the body.
    pub fn reports_status(&self) -> bool {
        matches!(self, Operation::Post | Operation::Preview)
    }
}

/// Everything the server needs to store (or preview) a page.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    /// Page name as the caller knows it; transports convert it to the server id.
    pub page: String,
    /// Local file holding the page text.
    pub source: PathBuf,
    pub summary: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub minor: bool,
    /// Baseline revision the edit started from
    pub revision: String,
    /// Timestamp of the baseline revision, in epoch seconds
    pub oldtime: Option<i64>,
}

impl PostForm {
    pub fn minor_flag(&self) -> &'static str {
        if self.minor {
            "on"
        } else {
            "off"
        }
    }
}

#[derive(Debug, Clone)]
pub enum Request<'a> {
    GetPage { page: &'a str },
    History { page: &'a str },
    Post(&'a PostForm),
    Preview(&'a PostForm),
    Index,
    RecentChanges,
    Search { pattern: &'a str },
    MatchPages { pattern: &'a str },
}

impl Request<'_> {
    pub fn operation(&self) -> Operation {
        match self {
            Request::GetPage { .. } => Operation::GetPage,
            Request::History { .. } => Operation::History,
            Request::Post(_) => Operation::Post,
            Request::Preview(_) => Operation::Preview,
            Request::Index => Operation::Index,
            Request::RecentChanges => Operation::RecentChanges,
            Request::Search { .. } => Operation::Search,
            Request::MatchPages { .. } => Operation::MatchPages,
        }
    }
}

/// Raw server answer, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub body: String,
    /// HTTP status as text (`"302"`), or `"000"` when the server was not reached
    pub status: Option<String>,
}

impl Response {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            status: None,
        }
    }

    pub fn with_status(body: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            status: Some(status.into()),
        }
    }

    pub fn transport_failure(detail: impl Into<String>) -> Self {
        Self::with_status(detail, TRANSPORT_FAILURE_STATUS)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, wiki: &WikiConfig, request: &Request<'_>) -> Result<Response>;
}
