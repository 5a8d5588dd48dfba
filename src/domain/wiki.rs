use serde::{Deserialize, Serialize};

/// Character encoding a wiki uses for page text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "iso-8859-1", alias = "latin-1", alias = "latin1")]
    Latin1,
}

impl Encoding {
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }

    /// Characters outside the encoding's range become `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Latin1 => "iso-8859-1",
        }
    }
}

/// Connection settings for one wiki.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiConfig {
    pub name: String,
    /// Base URL of the wiki script, e.g. `https://www.emacswiki.org/emacs`
    pub url: String,
    #[serde(default)]
    pub encoding: Encoding,
    /// Form field the server checks to tell humans from spam bots
    #[serde(default = "default_antispam_field")]
    pub antispam_field: String,
    #[serde(default)]
    pub username: Option<String>,
    /// Administrator password, needed to edit locked pages
    #[serde(default)]
    pub password: Option<String>,
}

fn default_antispam_field() -> String {
    "question".to_string()
}

impl WikiConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            encoding: Encoding::default(),
            antispam_field: default_antispam_field(),
            username: None,
            password: None,
        }
    }
}
