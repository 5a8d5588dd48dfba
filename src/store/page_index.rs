use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::app::Result;

type PageSet = Arc<BTreeSet<String>>;

/// Known page names per wiki, loaded lazily.
///
/// A loaded set stays until [`reload`](Self::reload); pages posted in the
/// meantime are added with [`add`](Self::add).
#[derive(Debug, Default)]
pub struct PageIndexCache {
    indexes: Mutex<HashMap<String, PageSet>>,
}

impl PageIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PageSet>> {
        self.indexes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached set without loading.
    pub fn get(&self, wiki: &str) -> Option<PageSet> {
        self.lock().get(wiki).cloned()
    }

    pub async fn get_or_load<F, Fut>(&self, wiki: &str, loader: F) -> Result<PageSet>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<BTreeSet<String>>>,
    {
        if let Some(pages) = self.get(wiki) {
            return Ok(pages);
        }
        self.reload(wiki, loader).await
    }

    pub async fn reload<F, Fut>(&self, wiki: &str, loader: F) -> Result<PageSet>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<BTreeSet<String>>>,
    {
        let pages = Arc::new(loader().await?);
        tracing::debug!("Loaded {} page names for {}", pages.len(), wiki);
        self.lock().insert(wiki.to_string(), Arc::clone(&pages));
        Ok(pages)
    }

    /// Returns true if the page was newly added. Wikis that were never
    /// loaded are left alone.
    pub fn add(&self, wiki: &str, page: &str) -> bool {
        match self.lock().get_mut(wiki) {
            Some(pages) => Arc::make_mut(pages).insert(page.to_string()),
            None => false,
        }
    }

    /// `None` when the wiki's index has not been loaded.
    pub fn contains(&self, wiki: &str, page: &str) -> Option<bool> {
        self.lock().get(wiki).map(|pages| pages.contains(page))
    }
}
