use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::app::Result;
use crate::domain::page::page_id;
use crate::domain::{Encoding, WikiConfig};
use crate::transport::{PostForm, Request, Response, Transport};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct HttpTransport {
    client: Client,
    /// Never follows redirects: a successful save answers 302.
    post_client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = client_builder(timeout).build()?;
        let post_client = client_builder(timeout).redirect(Policy::none()).build()?;

        Ok(Self {
            client,
            post_client,
        })
    }

    async fn build(&self, wiki: &WikiConfig, request: &Request<'_>) -> Result<RequestBuilder> {
        let builder = match request {
            Request::Post(form) => self
                .post_client
                .post(base_url(wiki)?)
                .multipart(post_form(wiki, form, false).await?),
            Request::Preview(form) => self
                .post_client
                .post(base_url(wiki)?)
                .multipart(post_form(wiki, form, true).await?),
            _ => self.client.get(query_url(wiki, request)?),
        };
        Ok(builder)
    }
}

fn client_builder(timeout: Duration) -> ClientBuilder {
    Client::builder()
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .user_agent(concat!("oddsync/", env!("CARGO_PKG_VERSION")))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, wiki: &WikiConfig, request: &Request<'_>) -> Result<Response> {
        let builder = self.build(wiki, request).await?;
        tracing::debug!("{} on {}", request.operation().describe(), wiki.name);

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return Ok(Response::transport_failure(e.to_string())),
        };

        let status = response.status().as_str().to_string();
        let body = match response.bytes().await {
            Ok(bytes) => wiki.encoding.decode(&bytes),
            Err(e) => return Ok(Response::transport_failure(e.to_string())),
        };

        Ok(Response::with_status(body, status))
    }
}

fn base_url(wiki: &WikiConfig) -> Result<Url> {
    Ok(Url::parse(&wiki.url)?)
}

fn encode_value(encoding: Encoding, value: &str) -> String {
    byte_serialize(&encoding.encode(value)).collect()
}

/// URL for the read-only operations. The server separates parameters with `;`.
pub fn query_url(wiki: &WikiConfig, request: &Request<'_>) -> Result<Url> {
    let enc = |value: &str| encode_value(wiki.encoding, value);
    let query = match request {
        Request::GetPage { page } => format!("action=browse;raw=2;id={}", enc(&page_id(page))),
        Request::History { page } => format!("action=history;raw=1;id={}", enc(&page_id(page))),
        Request::Index => "action=index;raw=1".to_string(),
        Request::MatchPages { pattern } => format!("action=index;raw=1;match={}", enc(pattern)),
        Request::RecentChanges => "action=rc;raw=1".to_string(),
        Request::Search { pattern } => format!("search={};raw=1", enc(pattern)),
        Request::Post(_) | Request::Preview(_) => String::new(),
    };

    let mut url = base_url(wiki)?;
    url.set_query(Some(&query));
    Ok(url)
}

async fn post_form(wiki: &WikiConfig, form: &PostForm, preview: bool) -> Result<Form> {
    let text = tokio::fs::read(&form.source).await?;
    let encoding = wiki.encoding;
    let field = |value: &str| Part::bytes(encoding.encode(value));

    let mut multipart = Form::new()
        .part("title", field(&page_id(&form.page)))
        .part("text", Part::bytes(text))
        .part("summary", field(&form.summary))
        .text("recent_edit", form.minor_flag())
        .text("revision", form.revision.clone())
        .text(wiki.antispam_field.clone(), "1");

    if let Some(username) = form.username.as_deref() {
        multipart = multipart.part("username", field(username));
    }
    if let Some(password) = form.password.as_deref() {
        multipart = multipart.part("pwd", field(password));
    }
    if let Some(oldtime) = form.oldtime {
        multipart = multipart.text("oldtime", oldtime.to_string());
    }
    if preview {
        multipart = multipart.text("Preview", "Preview");
    }

    Ok(multipart)
}
