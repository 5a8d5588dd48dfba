use std::path::Path;
use std::sync::Arc;

use crate::app::error::Result;
use crate::client::WikiClient;
use crate::config::{Config, TransportKind};
use crate::domain::WikiConfig;
use crate::registry::WikiRegistry;
use crate::store::{PageIndexCache, RevisionStore, StateDb};
use crate::sync::SyncEngine;
use crate::transport::command::CommandTransport;
use crate::transport::http::HttpTransport;
use crate::transport::Transport;
use crate::workspace::Workspace;

pub struct AppContext {
    pub config: Config,
    pub registry: WikiRegistry,
    pub engine: SyncEngine,
    pub workspace: Workspace,
    state: StateDb,
}

impl AppContext {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load(config_path)?;
        let data_dir = Config::data_dir()?;
        std::fs::create_dir_all(&data_dir)?;
        let state = StateDb::new(data_dir.join("state.db"))?;
        Self::from_config(config, state)
    }

    pub fn from_config(config: Config, state: StateDb) -> Result<Self> {
        let transport: Arc<dyn Transport> = match config.transport {
            TransportKind::Http => Arc::new(HttpTransport::with_timeout(config.timeout())?),
            TransportKind::Command => Arc::new(CommandTransport::new(config.commands.compile()?)),
        };
        Self::with_transport(config, state, transport)
    }

    pub fn with_transport(
        config: Config,
        state: StateDb,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let revisions = Arc::new(RevisionStore::new());
        let restored = state.load_into(&revisions)?;
        tracing::debug!("Restored {} page revisions", restored);

        let engine = SyncEngine::new(
            WikiClient::new(transport),
            revisions,
            Arc::new(PageIndexCache::new()),
        );
        let registry = WikiRegistry::from_configs(config.wikis.iter().cloned());
        let workspace = Workspace::new(config.pages_dir()?);

        Ok(Self {
            config,
            registry,
            engine,
            workspace,
            state,
        })
    }

    pub fn wiki(&self, name: &str) -> Result<&WikiConfig> {
        self.registry.lookup(name)
    }

    /// Persist the revision bookkeeping for later invocations.
    pub fn save_state(&self) -> Result<()> {
        let saved = self.state.save_from(self.engine.revisions())?;
        tracing::debug!("Saved {} page revisions", saved);
        Ok(())
    }
}
