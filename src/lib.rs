//! # Oddsync
//!
//! Edit pages of Oddmuse wikis as local files and sync them with the server.
//!
//! ## Architecture
//!
//! ```text
//! Transport → WikiClient → SyncEngine → Workspace
//!                  ↓
//!             FeedParser
//! ```
//!
//! - [`transport`]: Raw requests over HTTP or external commands
//! - [`client`]: Wiki operations and response classification
//! - [`sync`]: Revision bookkeeping around load, post and preview
//! - [`store`]: Revision store, page index cache and SQLite state
//!
//! ## Quick Start
//!
//! ```bash
//! # Fetch a page into ~/wiki/<wiki>/<page>
//! oddsync get Community "Site Map"
//!
//! # Edit the file, then send it back
//! oddsync post Community "Site Map" -s "typo"
//!
//! # What changed lately
//! oddsync rc Community
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`cli`]: Command-line interface definitions
//! - [`domain`]: Wiki, page and feed record models
//! - [`feed`]: Parser for the plain-text record format
//! - [`registry`]: Configured wikis by name
//! - [`workspace`]: Local page files

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the registry,
/// the transport, the sync engine and the persisted state.
pub mod app;

/// Command-line interface using clap.
///
/// - `get <wiki> <page>` - Fetch a page into the local directory
/// - `post <wiki> <page>` - Send the local copy to the server
/// - `preview <wiki> <page>` - Render the local copy without saving
/// - `history`, `rc`, `search`, `match`, `index` - Remote listings
pub mod cli;

/// Typed wiki operations on top of a [`Transport`](transport::Transport).
pub mod client;

/// Configuration loaded from `~/.config/oddsync/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`WikiConfig`](domain::WikiConfig): One configured wiki
/// - [`PageKey`](domain::PageKey): Wiki and page name pair
/// - [`FeedItem`](domain::FeedItem): One record of a listing response
pub mod domain;

/// Parser for recent changes, search and history listings.
pub mod feed;

/// Configured wikis by name.
pub mod registry;

/// In-memory stores and their SQLite persistence.
///
/// - [`RevisionStore`](store::RevisionStore): Last known revision per page
/// - [`PageIndexCache`](store::PageIndexCache): Page names per wiki
/// - [`StateDb`](store::StateDb): Revisions saved between invocations
pub mod store;

/// Load, post and preview with revision bookkeeping.
pub mod sync;

/// Request delivery.
///
/// - [`HttpTransport`](transport::http::HttpTransport): reqwest-based implementation
/// - [`CommandTransport`](transport::command::CommandTransport): Shell command templates
pub mod transport;

/// Local page files under `<root>/<wiki>/<page>`.
pub mod workspace;
