pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::PostMeta;

#[derive(Parser)]
#[command(name = "oddsync")]
#[command(about = "Edit Oddmuse wiki pages locally and sync them with the server", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/oddsync/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log requests and parser details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configured wikis
    Wikis,
    /// Fetch a page into the local directory
    Get {
        wiki: String,
        page: String,
        /// Fetch again even if a local copy exists, discarding it
        #[arg(short, long)]
        force: bool,
        /// Fail unless the page is in the wiki's index
        #[arg(long)]
        must_exist: bool,
    },
    /// Send the local copy of a page to the server
    Post {
        wiki: String,
        page: String,
        #[command(flatten)]
        meta: MetaArgs,
    },
    /// Render the local copy on the server without saving it
    Preview {
        wiki: String,
        page: String,
        #[command(flatten)]
        meta: MetaArgs,
        /// Open the rendered page in a browser instead of printing it
        #[arg(long)]
        open: bool,
    },
    /// Show the recorded revision of a page
    Status { wiki: String, page: String },
    /// Show the history of a page
    History {
        wiki: String,
        page: String,
        #[arg(long)]
        json: bool,
    },
    /// Show recent changes
    Rc {
        wiki: String,
        #[arg(long)]
        json: bool,
    },
    /// Full-text search
    Search {
        wiki: String,
        pattern: String,
        #[arg(long)]
        json: bool,
    },
    /// List page names matching a pattern
    Match {
        wiki: String,
        pattern: String,
        #[arg(long)]
        json: bool,
    },
    /// List all page names
    Index {
        wiki: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct MetaArgs {
    /// Summary of the change
    #[arg(short, long, default_value = "")]
    pub summary: String,

    /// Mark the change as minor
    #[arg(short, long)]
    pub minor: bool,

    /// Username (default: the wiki's configured username)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Administrator password, for locked pages
    #[arg(short, long)]
    pub password: Option<String>,
}

impl From<MetaArgs> for PostMeta {
    fn from(args: MetaArgs) -> Self {
        PostMeta {
            summary: args.summary,
            username: args.username,
            password: args.password,
            minor: args.minor,
        }
    }
}
