use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{PageKey, RevisionRecord};

/// Last revision observed for each page.
///
/// Records are only ever overwritten, so a key that was recorded once stays
/// recorded for the lifetime of the store.
#[derive(Debug, Default)]
pub struct RevisionStore {
    records: Mutex<HashMap<PageKey, RevisionRecord>>,
}

impl RevisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PageKey, RevisionRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &PageKey) -> Option<String> {
        self.lock().get(key).map(|r| r.revision.clone())
    }

    pub fn record(&self, key: &PageKey) -> Option<RevisionRecord> {
        self.lock().get(key).cloned()
    }

    pub fn put(&self, key: &PageKey, revision: &str) {
        self.put_record(RevisionRecord::new(key.clone(), revision));
    }

    pub fn put_record(&self, record: RevisionRecord) {
        tracing::debug!("Revision of {} is now {}", record.key, record.revision);
        self.lock().insert(record.key.clone(), record);
    }

    /// All records, ordered by key.
    pub fn snapshot(&self) -> Vec<RevisionRecord> {
        let mut records: Vec<_> = self.lock().values().cloned().collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
