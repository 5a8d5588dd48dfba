pub mod classify;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::app::Result;
use crate::domain::page::display_name;
use crate::domain::WikiConfig;
use crate::transport::{PostForm, Request, Transport};

pub use classify::PostStatus;

/// The remote operations of a wiki, with every answer classified.
#[derive(Clone)]
pub struct WikiClient {
    transport: Arc<dyn Transport>,
}

impl WikiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn text(&self, wiki: &WikiConfig, request: Request<'_>) -> Result<String> {
        let response = self.transport.execute(wiki, &request).await?;
        classify::classify_response(request.operation(), response)
    }

    pub async fn fetch_page(&self, wiki: &WikiConfig, page: &str) -> Result<String> {
        self.text(wiki, Request::GetPage { page }).await
    }

    pub async fn fetch_history(&self, wiki: &WikiConfig, page: &str) -> Result<String> {
        self.text(wiki, Request::History { page }).await
    }

    pub async fn post(&self, wiki: &WikiConfig, form: &PostForm) -> Result<PostStatus> {
        let request = Request::Post(form);
        let response = self.transport.execute(wiki, &request).await?;
        let status = response.status.clone();
        classify::classify_response(request.operation(), response)?;
        classify::classify_post_status(&form.page, status.as_deref())
    }

    /// Rendered HTML of `form` without storing it.
    pub async fn preview(&self, wiki: &WikiConfig, form: &PostForm) -> Result<String> {
        self.text(wiki, Request::Preview(form)).await
    }

    pub async fn fetch_index(&self, wiki: &WikiConfig) -> Result<BTreeSet<String>> {
        let body = self.text(wiki, Request::Index).await?;
        Ok(page_names(&body).collect())
    }

    pub async fn fetch_recent_changes(&self, wiki: &WikiConfig) -> Result<String> {
        self.text(wiki, Request::RecentChanges).await
    }

    pub async fn search(&self, wiki: &WikiConfig, pattern: &str) -> Result<String> {
        self.text(wiki, Request::Search { pattern }).await
    }

    /// Page names matching `pattern`, in server order.
    pub async fn match_page_names(&self, wiki: &WikiConfig, pattern: &str) -> Result<Vec<String>> {
        let body = self.text(wiki, Request::MatchPages { pattern }).await?;
        Ok(page_names(&body).collect())
    }
}

/// One name per line; ids are converted back to display names.
fn page_names(body: &str) -> impl Iterator<Item = String> + '_ {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(display_name)
}
