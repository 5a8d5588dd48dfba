use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::app::Result;
use crate::domain::page::page_id;
use crate::domain::WikiConfig;
use crate::transport::template::{CommandTemplate, TemplateVars};
use crate::transport::{Operation, PostForm, Request, Response, Transport};

pub const DEFAULT_GET: &str = "curl --silent --get --data-urlencode id={page} {url}'?action=browse;raw=2'";
pub const DEFAULT_HISTORY: &str =
    "curl --silent --get --data-urlencode id={page} {url}'?action=history;raw=1'";
pub const DEFAULT_INDEX: &str = "curl --silent {url}'?action=index;raw=1'";
pub const DEFAULT_MATCH: &str =
    "curl --silent --get --data-urlencode match={pattern} {url}'?action=index;raw=1'";
pub const DEFAULT_RECENT_CHANGES: &str = "curl --silent {url}'?action=rc;raw=1'";
pub const DEFAULT_SEARCH: &str =
    "curl --silent --get --data-urlencode search={pattern} {url}'?raw=1'";
pub const DEFAULT_POST: &str = "curl --silent --write-out '%{{http_code}}' \
--form-string title={page} --form-string summary={summary} \
--form-string username={username} --form-string pwd={password} \
--form-string {antispam_field}={antispam_value} --form-string recent_edit={minor} \
--form-string oldtime={oldtime} --form text='<'{file} {url}";
pub const DEFAULT_PREVIEW: &str = "curl --silent --write-out '%{{http_code}}' \
--form-string title={page} --form-string summary={summary} \
--form-string username={username} --form-string pwd={password} \
--form-string {antispam_field}={antispam_value} --form-string recent_edit={minor} \
--form-string oldtime={oldtime} --form text='<'{file} --form-string Preview=Preview {url}";

/// One compiled template per operation.
#[derive(Debug, Clone)]
pub struct CommandSet {
    pub get: CommandTemplate,
    pub history: CommandTemplate,
    pub post: CommandTemplate,
    pub preview: CommandTemplate,
    pub index: CommandTemplate,
    pub recent_changes: CommandTemplate,
    pub search: CommandTemplate,
    pub match_pages: CommandTemplate,
}

impl CommandSet {
    pub fn defaults() -> Result<Self> {
        Ok(Self {
            get: DEFAULT_GET.parse()?,
            history: DEFAULT_HISTORY.parse()?,
            post: DEFAULT_POST.parse()?,
            preview: DEFAULT_PREVIEW.parse()?,
            index: DEFAULT_INDEX.parse()?,
            recent_changes: DEFAULT_RECENT_CHANGES.parse()?,
            search: DEFAULT_SEARCH.parse()?,
            match_pages: DEFAULT_MATCH.parse()?,
        })
    }

    pub fn template(&self, operation: Operation) -> &CommandTemplate {
        match operation {
            Operation::GetPage => &self.get,
            Operation::History => &self.history,
            Operation::Post => &self.post,
            Operation::Preview => &self.preview,
            Operation::Index => &self.index,
            Operation::RecentChanges => &self.recent_changes,
            Operation::Search => &self.search,
            Operation::MatchPages => &self.match_pages,
        }
    }
}

/// Runs each request as a shell command and reads the answer from stdout.
pub struct CommandTransport {
    commands: CommandSet,
    shell: String,
}

impl CommandTransport {
    pub fn new(commands: CommandSet) -> Self {
        Self {
            commands,
            shell: "sh".to_string(),
        }
    }

    pub fn render(&self, wiki: &WikiConfig, request: &Request<'_>) -> String {
        self.commands
            .template(request.operation())
            .render(&template_vars(wiki, request))
    }
}

#[async_trait]
impl Transport for CommandTransport {
    async fn execute(&self, wiki: &WikiConfig, request: &Request<'_>) -> Result<Response> {
        let operation = request.operation();
        let command = self.render(wiki, request);
        tracing::debug!("{} on {} via {}", operation.describe(), wiki.name, self.shell);

        let output = match Command::new(&self.shell)
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => return Ok(Response::transport_failure(e.to_string())),
        };

        if !output.status.success() && output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Ok(Response::transport_failure(stderr));
        }

        let stdout = wiki.encoding.decode(&output.stdout);
        if operation.reports_status() {
            return Ok(split_status(stdout));
        }
        Ok(Response::new(stdout))
    }
}

fn template_vars(wiki: &WikiConfig, request: &Request<'_>) -> TemplateVars {
    let mut vars = TemplateVars {
        url: Some(wiki.url.clone()),
        antispam_field: Some(wiki.antispam_field.clone()),
        antispam_value: Some("1".to_string()),
        ..Default::default()
    };

    match request {
        Request::GetPage { page } | Request::History { page } => {
            vars.page = Some(page_id(page));
        }
        Request::Search { pattern } | Request::MatchPages { pattern } => {
            vars.pattern = Some(pattern.to_string());
        }
        Request::Post(form) | Request::Preview(form) => fill_post_vars(&mut vars, form),
        Request::Index | Request::RecentChanges => {}
    }

    vars
}

fn fill_post_vars(vars: &mut TemplateVars, form: &PostForm) {
    vars.page = Some(page_id(&form.page));
    vars.summary = Some(form.summary.clone());
    vars.username = form.username.clone();
    vars.password = form.password.clone();
    vars.minor = Some(form.minor_flag().to_string());
    vars.oldtime = form.oldtime.map(|t| t.to_string());
    vars.revision = Some(form.revision.clone());
    vars.file = Some(form.source.to_string_lossy().into_owned());
}

/// Split the three-digit status curl's `--write-out` appends to the body.
fn split_status(mut stdout: String) -> Response {
    let len = stdout.len();
    let has_status = len >= 3
        && stdout.is_char_boundary(len - 3)
        && stdout[len - 3..].bytes().all(|b| b.is_ascii_digit());

    if has_status {
        let status = stdout.split_off(len - 3);
        Response::with_status(stdout, status)
    } else {
        Response::new(stdout)
    }
}
