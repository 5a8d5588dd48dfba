pub mod page_index;
pub mod revisions;
pub mod sqlite;

pub use page_index::PageIndexCache;
pub use revisions::RevisionStore;
pub use sqlite::StateDb;
