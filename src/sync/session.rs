use crate::domain::PageKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Loaded,
    Modified,
    /// A preview round trip is in flight.
    Previewing,
}

/// One page being edited locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub key: PageKey,
    pub state: SessionState,
    /// Revision the local copy is based on, as of the last load or post
    pub baseline: Option<String>,
}

impl EditSession {
    pub fn new(key: PageKey) -> Self {
        Self {
            key,
            state: SessionState::Unloaded,
            baseline: None,
        }
    }

    pub(crate) fn loaded(key: PageKey, baseline: String) -> Self {
        Self {
            key,
            state: SessionState::Loaded,
            baseline: Some(baseline),
        }
    }

    /// Record a local edit. Sessions that were never loaded stay unloaded.
    pub fn mark_modified(&mut self) {
        if self.state == SessionState::Loaded {
            self.state = SessionState::Modified;
        }
    }
}
