//! Shell command templates with a closed set of placeholders.
//!
//! A template is plain text with `{field}` placeholders; `{{` and `}}` stand
//! for literal braces. Templates are validated when parsed, so a typo in a
//! placeholder name is reported before any command runs.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown placeholder {{{name}}} in command template")]
    UnknownPlaceholder { name: String },

    #[error("unterminated placeholder starting at byte {offset}")]
    Unterminated { offset: usize },

    #[error("unmatched '}}' at byte {offset}")]
    UnmatchedClose { offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Url,
    Page,
    Summary,
    Username,
    Password,
    AntispamField,
    AntispamValue,
    Minor,
    Oldtime,
    Revision,
    Pattern,
    File,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Url,
        Field::Page,
        Field::Summary,
        Field::Username,
        Field::Password,
        Field::AntispamField,
        Field::AntispamValue,
        Field::Minor,
        Field::Oldtime,
        Field::Revision,
        Field::Pattern,
        Field::File,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Url => "url",
            Field::Page => "page",
            Field::Summary => "summary",
            Field::Username => "username",
            Field::Password => "password",
            Field::AntispamField => "antispam_field",
            Field::AntispamValue => "antispam_value",
            Field::Minor => "minor",
            Field::Oldtime => "oldtime",
            Field::Revision => "revision",
            Field::Pattern => "pattern",
            Field::File => "file",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Values substituted into a template. Unset fields render as `''`.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    pub url: Option<String>,
    pub page: Option<String>,
    pub summary: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub antispam_field: Option<String>,
    pub antispam_value: Option<String>,
    pub minor: Option<String>,
    pub oldtime: Option<String>,
    pub revision: Option<String>,
    pub pattern: Option<String>,
    pub file: Option<String>,
}

impl TemplateVars {
    fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Url => &self.url,
            Field::Page => &self.page,
            Field::Summary => &self.summary,
            Field::Username => &self.username,
            Field::Password => &self.password,
            Field::AntispamField => &self.antispam_field,
            Field::AntispamValue => &self.antispam_value,
            Field::Minor => &self.minor,
            Field::Oldtime => &self.oldtime,
            Field::Revision => &self.revision,
            Field::Pattern => &self.pattern,
            Field::File => &self.file,
        };
        value.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Field),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl CommandTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unterminated { offset });
                    }
                    let field = Field::from_name(name.trim())
                        .ok_or(TemplateError::UnknownPlaceholder { name })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(field));
                }
                '}' if chars.peek().is_some_and(|&(_, next)| next == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::UnmatchedClose { offset }),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn uses(&self, field: Field) -> bool {
        self.segments.contains(&Segment::Placeholder(field))
    }

    /// Render the final shell command.
    pub fn render(&self, vars: &TemplateVars) -> String {
        let mut command = String::with_capacity(self.source.len() + 64);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => command.push_str(text),
                Segment::Placeholder(field) => {
                    command.push_str(&shell_quote(vars.get(*field).unwrap_or("")))
                }
            }
        }
        // A bare `&` would put the command in the background.
        command.replace('&', "%26")
    }
}

impl FromStr for CommandTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Single-quote `value` for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_render_substitutes_quoted_values() {
        let template =
            CommandTemplate::parse("curl --silent {url}'?action=browse;raw=2;id='{page}").unwrap();
        let vars = TemplateVars {
            url: Some("https://alexschroeder.ch/wiki".into()),
            page: Some("Contact".into()),
            ..Default::default()
        };
        assert_eq!(
            template.render(&vars),
            "curl --silent 'https://alexschroeder.ch/wiki''?action=browse;raw=2;id=''Contact'"
        );
    }

    #[test]
    fn test_render_encodes_ampersand() {
        let template = CommandTemplate::parse("curl --form summary={summary}").unwrap();
        let vars = TemplateVars {
            summary: Some("typos & links".into()),
            ..Default::default()
        };
        assert_eq!(
            template.render(&vars),
            "curl --form summary='typos %26 links'"
        );
    }

    #[test]
    fn test_missing_value_renders_empty() {
        let template = CommandTemplate::parse("echo {username}").unwrap();
        assert_eq!(template.render(&TemplateVars::default()), "echo ''");
    }

    #[test]
    fn test_escaped_braces() {
        let template = CommandTemplate::parse("curl --write-out '%{{http_code}}' {url}").unwrap();
        assert!(template.uses(Field::Url));
        let vars = TemplateVars {
            url: Some("http://x".into()),
            ..Default::default()
        };
        assert_eq!(
            template.render(&vars),
            "curl --write-out '%{http_code}' 'http://x'"
        );
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = CommandTemplate::parse("curl {wiki}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownPlaceholder {
                name: "wiki".into()
            }
        );
    }

    #[test]
    fn test_unterminated_placeholder_rejected() {
        let err = CommandTemplate::parse("curl {url").unwrap_err();
        assert_eq!(err, TemplateError::Unterminated { offset: 5 });
    }

    #[test]
    fn test_unmatched_close_rejected() {
        let err = CommandTemplate::parse("curl url}").unwrap_err();
        assert_eq!(err, TemplateError::UnmatchedClose { offset: 8 });
    }

    #[test]
    fn test_every_field_name_parses() {
        for field in Field::ALL {
            let template = CommandTemplate::parse(&format!("x {{{}}}", field.name())).unwrap();
            assert!(template.uses(field));
        }
    }
}
